//! Playback state: what is selected, and how next/previous/end-of-media behave.
//!
//! The controller never touches audio. The media primitive reports back through
//! [`PlayerController::handle_media_event`] and presentation reads [`PlayerView`].

use rand::Rng;
use rand::rngs::StdRng;
use thiserror::Error;

use super::episode::Episode;
use super::media::MediaEvent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PlayerError {
    #[error("episode index {index} is out of range for a playlist of {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Source of shuffle picks. `len` is always non-zero and the result must be `< len`.
pub(crate) trait IndexSource {
    fn next_index(&mut self, len: usize) -> usize;
}

impl IndexSource for StdRng {
    fn next_index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

#[derive(Debug)]
pub(crate) struct PlayerController<R> {
    playlist: Vec<Episode>,
    current_index: Option<usize>,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
    progress_seconds: u64,
    revision: u64,
    random: R,
}

/// Read-only snapshot handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayerView {
    pub(crate) episode: Option<Episode>,
    pub(crate) current_index: Option<usize>,
    pub(crate) playlist_len: usize,
    pub(crate) is_playing: bool,
    pub(crate) is_looping: bool,
    pub(crate) is_shuffling: bool,
    pub(crate) has_next: bool,
    pub(crate) has_previous: bool,
    pub(crate) progress_seconds: u64,
    pub(crate) duration_seconds: u64,
}

impl<R: IndexSource> PlayerController<R> {
    pub(crate) fn new(random: R) -> Self {
        Self {
            playlist: Vec::new(),
            current_index: None,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
            progress_seconds: 0,
            revision: 0,
            random,
        }
    }

    pub(crate) fn play(&mut self, playlist: Vec<Episode>, index: usize) -> Result<(), PlayerError> {
        if index >= playlist.len() {
            return Err(PlayerError::OutOfRange {
                index,
                len: playlist.len(),
            });
        }
        self.playlist = playlist;
        self.select(Some(index));
        self.is_playing = true;
        Ok(())
    }

    pub(crate) fn toggle_play(&mut self) {
        if self.current_index.is_none() {
            return;
        }
        self.is_playing = !self.is_playing;
    }

    pub(crate) fn set_playing_state(&mut self, playing: bool) {
        self.is_playing = playing && self.current_index.is_some();
    }

    pub(crate) fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
    }

    pub(crate) fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
    }

    pub(crate) fn play_next(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };
        if self.is_shuffling {
            let len = self.playlist.len();
            let next = self.random.next_index(len).min(len - 1);
            self.select(Some(next));
        } else if current + 1 < self.playlist.len() {
            self.select(Some(current + 1));
        }
    }

    pub(crate) fn play_previous(&mut self) {
        if let Some(current) = self.current_index
            && current > 0
        {
            self.select(Some(current - 1));
        }
    }

    pub(crate) fn clear_player_state(&mut self) {
        self.playlist.clear();
        self.select(None);
        self.is_playing = false;
    }

    /// Natural end of media: advance when possible, otherwise go idle.
    pub(crate) fn on_episode_ended(&mut self) {
        if self.has_next() {
            self.play_next();
        } else {
            self.clear_player_state();
        }
    }

    pub(crate) fn report_progress(&mut self, seconds: u64) {
        if self.current_index.is_some() {
            self.progress_seconds = seconds;
        }
    }

    pub(crate) fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Started => self.set_playing_state(true),
            MediaEvent::Paused => self.set_playing_state(false),
            MediaEvent::TimeUpdated(seconds) => self.report_progress(seconds),
            // Looping repeats the item in the media layer; selection stays put.
            MediaEvent::Ended if self.is_looping => self.report_progress(0),
            MediaEvent::Ended => self.on_episode_ended(),
        }
    }

    pub(crate) fn has_next(&self) -> bool {
        match self.current_index {
            Some(current) => self.is_shuffling || current + 1 < self.playlist.len(),
            None => false,
        }
    }

    pub(crate) fn has_previous(&self) -> bool {
        matches!(self.current_index, Some(current) if current > 0)
    }

    pub(crate) fn current_episode(&self) -> Option<&Episode> {
        self.current_index.and_then(|idx| self.playlist.get(idx))
    }

    pub(crate) fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub(crate) fn playlist(&self) -> &[Episode] {
        &self.playlist
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub(crate) fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub(crate) fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    pub(crate) fn progress_seconds(&self) -> u64 {
        self.progress_seconds
    }

    /// Bumped on every selection change, including re-selecting the same index.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn view(&self) -> PlayerView {
        let episode = self.current_episode().cloned();
        PlayerView {
            duration_seconds: episode.as_ref().map_or(0, |episode| episode.duration),
            episode,
            current_index: self.current_index,
            playlist_len: self.playlist().len(),
            is_playing: self.is_playing(),
            is_looping: self.is_looping(),
            is_shuffling: self.is_shuffling(),
            has_next: self.has_next(),
            has_previous: self.has_previous(),
            progress_seconds: self.progress_seconds,
        }
    }

    fn select(&mut self, index: Option<usize>) {
        self.current_index = index;
        self.progress_seconds = 0;
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::IndexSource;
    use crate::app::episode::{Episode, format_duration};

    /// Replays scripted picks; falls back to 0 once exhausted.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedIndices {
        picks: VecDeque<usize>,
        pub(crate) requested_lens: Vec<usize>,
    }

    impl ScriptedIndices {
        pub(crate) fn new(picks: &[usize]) -> Self {
            Self {
                picks: picks.iter().copied().collect(),
                requested_lens: Vec::new(),
            }
        }
    }

    impl IndexSource for ScriptedIndices {
        fn next_index(&mut self, len: usize) -> usize {
            self.requested_lens.push(len);
            self.picks.pop_front().unwrap_or(0)
        }
    }

    pub(crate) fn episode(id: &str, duration: u64) -> Episode {
        Episode {
            id: id.to_string(),
            title: format!("Episode {id}"),
            members: "Diego e Richard".to_string(),
            thumbnail: format!("https://cdn.example.test/{id}.jpg"),
            published_at: "8 jan 21".to_string(),
            duration,
            duration_label: format_duration(duration),
            media_url: format!("https://cdn.example.test/{id}.m4a"),
            description: "<p>notes</p>".to_string(),
        }
    }

    pub(crate) fn playlist(ids: &[&str]) -> Vec<Episode> {
        ids.iter().map(|id| episode(id, 60)).collect()
    }
}
