use anyhow::Result;
use tracing::{debug, info, warn};

use super::episode::Episode;
use super::media::{MediaEvent, MediaPrimitive};
use super::player::{IndexSource, PlayerController, PlayerView};

/// Keeps a media primitive in step with the playback controller.
#[derive(Debug)]
pub(crate) struct PlayerDriver<M, R> {
    controller: PlayerController<R>,
    media: M,
    loaded_revision: u64,
    media_playing: bool,
    media_looping: bool,
}

impl<M: MediaPrimitive, R: IndexSource> PlayerDriver<M, R> {
    pub(crate) fn new(controller: PlayerController<R>, media: M) -> Self {
        let loaded_revision = controller.revision();
        Self {
            controller,
            media,
            loaded_revision,
            media_playing: false,
            media_looping: false,
        }
    }

    pub(crate) fn view(&self) -> PlayerView {
        self.controller.view()
    }

    pub(crate) fn controller(&self) -> &PlayerController<R> {
        &self.controller
    }

    pub(crate) fn play(&mut self, playlist: Vec<Episode>, index: usize) -> Result<()> {
        self.controller.play(playlist, index)?;
        self.sync()
    }

    pub(crate) fn toggle_play(&mut self) -> Result<()> {
        self.controller.toggle_play();
        self.sync()
    }

    pub(crate) fn toggle_loop(&mut self) -> Result<()> {
        self.controller.toggle_loop();
        self.sync()
    }

    pub(crate) fn toggle_shuffle(&mut self) -> Result<()> {
        self.controller.toggle_shuffle();
        self.sync()
    }

    pub(crate) fn play_next(&mut self) -> Result<()> {
        self.controller.play_next();
        self.sync()
    }

    pub(crate) fn play_previous(&mut self) -> Result<()> {
        self.controller.play_previous();
        self.sync()
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        self.controller.clear_player_state();
        self.sync()
    }

    /// Seeks within the current episode, clamped to its duration.
    pub(crate) fn seek(&mut self, seconds: u64) -> Result<()> {
        let Some(episode) = self.controller.current_episode() else {
            return Ok(());
        };
        let target = if episode.duration > 0 {
            seconds.min(episode.duration)
        } else {
            seconds
        };
        self.controller.report_progress(target);
        let result = self.media.seek(target);
        self.on_media_result(result)
    }

    /// Relative seek from where the media actually is, not the last reported tick.
    pub(crate) fn seek_by(&mut self, delta: i64) -> Result<()> {
        if self.controller.current_episode().is_none() {
            return Ok(());
        }
        let target = self.media.position().saturating_add_signed(delta);
        self.seek(target)
    }

    /// Applies pending media notifications, then reconciles the media with the new state.
    pub(crate) fn pump(&mut self) -> Result<()> {
        for event in self.media.poll_events() {
            match event {
                MediaEvent::Started => self.media_playing = true,
                MediaEvent::Paused | MediaEvent::Ended => self.media_playing = false,
                MediaEvent::TimeUpdated(_) => {}
            }

            if event == MediaEvent::Ended && self.controller.is_looping() {
                debug!("restarting looped episode");
                self.controller.handle_media_event(event);
                if let Some(episode) = self.controller.current_episode() {
                    let result = self.media.load(&episode.media_url, true, 0);
                    self.media_looping = true;
                    self.media_playing = result.is_ok();
                    self.on_media_result(result)?;
                }
                continue;
            }
            self.controller.handle_media_event(event);
        }
        self.sync()
    }

    pub(crate) fn sync(&mut self) -> Result<()> {
        let looping = self.controller.is_looping();

        if self.controller.revision() != self.loaded_revision {
            // Recorded up front: a failed load is not retried until the selection
            // changes or the user presses play again.
            self.loaded_revision = self.controller.revision();
            match self.controller.current_episode() {
                Some(episode) => {
                    info!(id = %episode.id, title = %episode.title, "loading episode");
                    let result = self.media.load(&episode.media_url, looping, 0);
                    self.media_looping = looping;
                    self.media_playing = result.is_ok();
                    self.on_media_result(result)?;
                }
                None => {
                    info!("player cleared");
                    self.media.stop();
                    self.media_playing = false;
                }
            }
        }

        if self.controller.current_episode().is_none() {
            return Ok(());
        }

        if self.media_looping != looping {
            self.media_looping = looping;
            let result = self.media.set_looping(looping);
            self.on_media_result(result)?;
        }

        let playing = self.controller.is_playing();
        if playing != self.media_playing {
            if playing {
                let result = self.media.play();
                self.media_playing = result.is_ok();
                self.on_media_result(result)?;
            } else {
                self.media_playing = false;
                let result = self.media.pause();
                self.on_media_result(result)?;
            }
        }
        Ok(())
    }

    /// A media failure leaves nothing audible, so the controller must stop claiming playback.
    fn on_media_result(&mut self, result: Result<()>) -> Result<()> {
        if let Err(err) = result {
            warn!(error = %err, "media operation failed");
            self.controller.set_playing_state(false);
            self.media_playing = false;
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.controller.current_index().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::media::testing::{FakeMedia, MediaCall};
    use crate::app::player::testing::{ScriptedIndices, playlist};

    fn driver(picks: &[usize]) -> PlayerDriver<FakeMedia, ScriptedIndices> {
        PlayerDriver::new(
            PlayerController::new(ScriptedIndices::new(picks)),
            FakeMedia::default(),
        )
    }

    fn load(id: &str, looping: bool) -> MediaCall {
        MediaCall::Load {
            url: format!("https://cdn.example.test/{id}.m4a"),
            looping,
            start_at: 0,
        }
    }

    #[test]
    fn play_loads_selected_episode() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 1).expect("play");
        assert_eq!(driver.media.take_calls(), vec![load("b", false)]);
    }

    #[test]
    fn out_of_range_play_does_not_touch_media() {
        let mut driver = driver(&[]);
        let err = driver.play(playlist(&["a"]), 4).expect_err("out of range");
        assert!(err.to_string().contains("out of range"));
        assert!(driver.media.take_calls().is_empty());
    }

    #[test]
    fn toggle_play_pauses_and_resumes_media() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.media.take_calls();

        driver.toggle_play().expect("pause");
        driver.toggle_play().expect("resume");

        assert_eq!(
            driver.media.take_calls(),
            vec![MediaCall::Pause, MediaCall::Play]
        );
    }

    #[test]
    fn media_pause_notification_does_not_echo_back() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.media.take_calls();

        driver.media.pending = vec![MediaEvent::Paused];
        driver.pump().expect("pump");

        assert!(!driver.view().is_playing);
        assert!(driver.media.take_calls().is_empty());
    }

    #[test]
    fn ended_advances_to_next_episode() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 0).expect("play");
        driver.media.take_calls();

        driver.media.pending = vec![MediaEvent::TimeUpdated(59), MediaEvent::Ended];
        driver.pump().expect("pump");

        assert_eq!(driver.view().current_index, Some(1));
        assert_eq!(driver.view().progress_seconds, 0);
        assert_eq!(driver.media.take_calls(), vec![load("b", false)]);
    }

    #[test]
    fn ended_on_last_episode_stops_media() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 1).expect("play");
        driver.media.take_calls();

        driver.media.pending = vec![MediaEvent::Ended];
        driver.pump().expect("pump");

        assert!(driver.is_idle());
        assert!(!driver.view().is_playing);
        assert_eq!(driver.media.take_calls(), vec![MediaCall::Stop]);
    }

    #[test]
    fn ended_while_looping_restarts_same_episode() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 0).expect("play");
        driver.toggle_loop().expect("loop");
        driver.media.take_calls();

        driver.media.pending = vec![MediaEvent::Ended];
        driver.pump().expect("pump");

        assert_eq!(driver.view().current_index, Some(0));
        assert!(driver.view().is_playing);
        assert_eq!(driver.media.take_calls(), vec![load("a", true)]);
    }

    #[test]
    fn loop_toggle_is_forwarded_once() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.media.take_calls();

        driver.toggle_loop().expect("loop on");
        driver.sync().expect("sync");
        driver.toggle_loop().expect("loop off");

        assert_eq!(
            driver.media.take_calls(),
            vec![MediaCall::SetLooping(true), MediaCall::SetLooping(false)]
        );
    }

    #[test]
    fn shuffle_repeat_of_current_index_reloads() {
        let mut driver = driver(&[0]);
        driver.play(playlist(&["a", "b"]), 0).expect("play");
        driver.toggle_shuffle().expect("shuffle");
        driver.media.take_calls();

        driver.play_next().expect("next");

        assert_eq!(driver.view().current_index, Some(0));
        assert_eq!(driver.media.take_calls(), vec![load("a", false)]);
    }

    #[test]
    fn next_on_paused_player_loads_then_pauses() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 0).expect("play");
        driver.toggle_play().expect("pause");
        driver.media.take_calls();

        driver.play_next().expect("next");

        assert_eq!(
            driver.media.take_calls(),
            vec![load("b", false), MediaCall::Pause]
        );
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.media.take_calls();

        driver.seek(500).expect("seek");
        assert_eq!(driver.view().progress_seconds, 60);

        driver.seek_by(-15).expect("seek back");
        assert_eq!(driver.view().progress_seconds, 45);

        assert_eq!(
            driver.media.take_calls(),
            vec![MediaCall::Seek(60), MediaCall::Seek(45)]
        );
    }

    #[test]
    fn seek_without_selection_is_ignored() {
        let mut driver = driver(&[]);
        driver.seek(10).expect("seek");
        assert!(driver.media.take_calls().is_empty());
    }

    #[test]
    fn failed_load_stops_claiming_playback() {
        let mut driver = driver(&[]);
        driver.media.fail_next = true;

        let err = driver.play(playlist(&["a", "b"]), 0).expect_err("load fails");

        assert!(err.to_string().contains("refused"));
        assert_eq!(driver.view().current_index, Some(0));
        assert!(!driver.view().is_playing);
        assert_eq!(driver.media.take_calls(), vec![load("a", false)]);

        for _ in 0..3 {
            driver.pump().expect("pump stays quiet after a failed load");
        }
        assert!(!driver.view().is_playing);
        assert!(driver.media.take_calls().is_empty());
    }

    #[test]
    fn play_after_failed_load_retries_media() {
        let mut driver = driver(&[]);
        driver.media.fail_next = true;
        let _ = driver.play(playlist(&["a"]), 0);
        driver.media.take_calls();

        driver.toggle_play().expect("user retries");

        assert!(driver.view().is_playing);
        assert_eq!(driver.media.take_calls(), vec![MediaCall::Play]);
    }

    #[test]
    fn failed_resume_reverts_to_paused() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.toggle_play().expect("pause");
        driver.media.take_calls();
        driver.media.fail_next = true;

        driver.toggle_play().expect_err("resume fails");
        driver.pump().expect("pump");

        assert!(!driver.view().is_playing);
        assert_eq!(driver.media.take_calls(), vec![MediaCall::Play]);
    }

    #[test]
    fn seek_by_starts_from_media_position() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");
        driver.media.take_calls();
        driver.media.position = 30;

        driver.seek_by(10).expect("seek forward");

        assert_eq!(driver.view().progress_seconds, 40);
        assert_eq!(driver.media.take_calls(), vec![MediaCall::Seek(40)]);
    }
}
