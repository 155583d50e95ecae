use std::sync::mpsc;

use anyhow::Result;
use ratatui::widgets::TableState;
use tracing::warn;

use crate::config::Config;

use super::super::api::fetch_latest_episodes;
use super::super::driver::PlayerDriver;
use super::super::episode::format_duration;
use super::super::media::MediaPrimitive;
use super::super::player::IndexSource;
use super::{CatalogFetchResult, CatalogState, PlayerCommand};

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn spawn_catalog_fetch(
    config: &Config,
    generation: u64,
    tx: &mpsc::Sender<CatalogFetchResult>,
) {
    let config = config.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = fetch_latest_episodes(&config).map_err(|err| format!("{err:#}"));
        let _ = tx.send(CatalogFetchResult { generation, result });
    });
}

/// Applies a finished fetch unless a newer refresh superseded it. Returns a status line.
pub(super) fn apply_catalog_result(
    fetched: CatalogFetchResult,
    current_generation: u64,
    catalog: &mut CatalogState,
    table_state: &mut TableState,
) -> Option<String> {
    if fetched.generation != current_generation {
        return None;
    }

    match fetched.result {
        Ok(episodes) => {
            let count = episodes.len();
            if count == 0 {
                table_state.select(None);
            } else {
                let selected = table_state.selected().unwrap_or(0).min(count - 1);
                table_state.select(Some(selected));
            }
            *catalog = CatalogState::Ready(episodes);
            Some(if count == 0 {
                status_info("No episodes published yet.")
            } else {
                status_info(&format!("Loaded {count} episode(s). Enter plays the selection."))
            })
        }
        Err(err) => {
            warn!(error = %err, "episode fetch failed");
            table_state.select(None);
            *catalog = CatalogState::Failed(err.clone());
            Some(status_error(&format!("Could not load episodes: {err}")))
        }
    }
}

/// Runs a player control, honoring the same enabled/disabled rules the controls bar shows.
pub(super) fn run_player_command<M: MediaPrimitive, R: IndexSource>(
    driver: &mut PlayerDriver<M, R>,
    command: PlayerCommand,
    seek_step: i64,
) -> Result<String> {
    let view = driver.view();
    if view.episode.is_none() {
        return Ok("Select an episode first.".to_string());
    }

    let message = match command {
        PlayerCommand::TogglePlay => {
            driver.toggle_play()?;
            if driver.view().is_playing {
                "Playing.".to_string()
            } else {
                "Paused.".to_string()
            }
        }
        PlayerCommand::Next => {
            if !view.has_next {
                return Ok("No next episode.".to_string());
            }
            driver.play_next()?;
            now_playing_message(driver)
        }
        PlayerCommand::Previous => {
            if !view.has_previous {
                return Ok("No previous episode.".to_string());
            }
            driver.play_previous()?;
            now_playing_message(driver)
        }
        PlayerCommand::ToggleShuffle => {
            if view.playlist_len <= 1 {
                return Ok("Shuffle needs more than one episode.".to_string());
            }
            driver.toggle_shuffle()?;
            if driver.view().is_shuffling {
                "Shuffle on.".to_string()
            } else {
                "Shuffle off.".to_string()
            }
        }
        PlayerCommand::ToggleLoop => {
            driver.toggle_loop()?;
            if driver.view().is_looping {
                "Loop on.".to_string()
            } else {
                "Loop off.".to_string()
            }
        }
        PlayerCommand::SeekBack | PlayerCommand::SeekForward => {
            let delta = if command == PlayerCommand::SeekBack {
                -seek_step
            } else {
                seek_step
            };
            driver.seek_by(delta)?;
            format!("Position {}", format_duration(driver.view().progress_seconds))
        }
    };
    Ok(message)
}

fn now_playing_message<M: MediaPrimitive, R: IndexSource>(driver: &PlayerDriver<M, R>) -> String {
    match driver.view().episode {
        Some(episode) => format!("Playing {}", episode.title),
        None => "Player idle.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::app::media::testing::FakeMedia;
    use crate::app::player::PlayerController;
    use crate::app::player::testing::{ScriptedIndices, playlist};

    fn driver(picks: &[usize]) -> PlayerDriver<FakeMedia, ScriptedIndices> {
        PlayerDriver::new(
            PlayerController::new(ScriptedIndices::new(picks)),
            FakeMedia::default(),
        )
    }

    #[test]
    fn keys_map_to_player_commands() {
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Char(' ')),
            Some(PlayerCommand::TogglePlay)
        );
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Char('n')),
            Some(PlayerCommand::Next)
        );
        assert_eq!(
            PlayerCommand::from_key(KeyCode::Left),
            Some(PlayerCommand::SeekBack)
        );
        assert_eq!(PlayerCommand::from_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn commands_without_selection_are_ignored() {
        let mut driver = driver(&[]);
        let message =
            run_player_command(&mut driver, PlayerCommand::ToggleLoop, 10).expect("no error");
        assert_eq!(message, "Select an episode first.");
        assert!(!driver.view().is_looping);
    }

    #[test]
    fn shuffle_is_disabled_for_single_episode_playlist() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");

        let message =
            run_player_command(&mut driver, PlayerCommand::ToggleShuffle, 10).expect("no error");

        assert_eq!(message, "Shuffle needs more than one episode.");
        assert!(!driver.view().is_shuffling);
    }

    #[test]
    fn next_reports_when_at_end() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 1).expect("play");

        let message = run_player_command(&mut driver, PlayerCommand::Next, 10).expect("no error");

        assert_eq!(message, "No next episode.");
        assert_eq!(driver.view().current_index, Some(1));
    }

    #[test]
    fn previous_moves_back_and_names_episode() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a", "b"]), 1).expect("play");

        let message =
            run_player_command(&mut driver, PlayerCommand::Previous, 10).expect("no error");

        assert_eq!(message, "Playing Episode a");
        assert_eq!(driver.view().current_index, Some(0));
    }

    #[test]
    fn seek_forward_reports_position() {
        let mut driver = driver(&[]);
        driver.play(playlist(&["a"]), 0).expect("play");

        let message =
            run_player_command(&mut driver, PlayerCommand::SeekForward, 15).expect("no error");

        assert_eq!(message, "Position 00:00:15");
    }

    #[test]
    fn stale_catalog_results_are_dropped() {
        let mut catalog = CatalogState::Loading;
        let mut table_state = TableState::default();

        let status = apply_catalog_result(
            CatalogFetchResult {
                generation: 1,
                result: Ok(playlist(&["a"])),
            },
            2,
            &mut catalog,
            &mut table_state,
        );

        assert_eq!(status, None);
        assert_eq!(catalog, CatalogState::Loading);
    }

    #[test]
    fn catalog_result_clamps_selection() {
        let mut catalog = CatalogState::Loading;
        let mut table_state = TableState::default();
        table_state.select(Some(7));

        let status = apply_catalog_result(
            CatalogFetchResult {
                generation: 0,
                result: Ok(playlist(&["a", "b", "c"])),
            },
            0,
            &mut catalog,
            &mut table_state,
        );

        assert_eq!(table_state.selected(), Some(2));
        assert_eq!(catalog.episodes().len(), 3);
        assert!(status.is_some_and(|line| line.starts_with("INFO:")));
    }

    #[test]
    fn failed_catalog_fetch_is_reported() {
        let mut catalog = CatalogState::Loading;
        let mut table_state = TableState::default();

        let status = apply_catalog_result(
            CatalogFetchResult {
                generation: 0,
                result: Err("connection refused".to_string()),
            },
            0,
            &mut catalog,
            &mut table_state,
        );

        assert_eq!(catalog, CatalogState::Failed("connection refused".to_string()));
        assert_eq!(
            status.as_deref(),
            Some("ERROR: Could not load episodes: connection refused")
        );
    }
}
