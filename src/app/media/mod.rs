mod clock;
mod process;

use anyhow::Result;

pub(crate) use process::ProcessMedia;

/// Notifications a media primitive reports back to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MediaEvent {
    Started,
    Paused,
    Ended,
    TimeUpdated(u64),
}

/// Something that can play one URL at a time.
pub(crate) trait MediaPrimitive {
    /// Replaces the current item and starts playing it from `start_at` seconds.
    fn load(&mut self, url: &str, looping: bool, start_at: u64) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn seek(&mut self, seconds: u64) -> Result<()>;
    fn set_looping(&mut self, looping: bool) -> Result<()>;
    fn poll_events(&mut self) -> Vec<MediaEvent>;
    fn position(&self) -> u64;
}
