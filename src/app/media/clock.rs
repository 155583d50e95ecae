use std::time::{Duration, Instant};

/// Tracks playback position of a process we cannot query.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct PlaybackClock {
    base: Duration,
    resumed_at: Option<Instant>,
}

impl PlaybackClock {
    pub(super) fn reset(&mut self, seconds: u64) {
        self.base = Duration::from_secs(seconds);
        self.resumed_at = None;
    }

    pub(super) fn resume_at(&mut self, now: Instant) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    pub(super) fn pause_at(&mut self, now: Instant) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.base += now.saturating_duration_since(resumed_at);
        }
    }

    pub(super) fn position_at(&self, now: Instant) -> u64 {
        let running = self
            .resumed_at
            .map(|resumed_at| now.saturating_duration_since(resumed_at))
            .unwrap_or_default();
        (self.base + running).as_secs()
    }

    pub(super) fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub(super) fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub(super) fn position(&self) -> u64 {
        self.position_at(Instant::now())
    }
}
