mod actions;
mod render;
mod session;

use std::io;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use tracing::{error, info};

use crate::config::Config;

use super::driver::PlayerDriver;
use super::episode::{Episode, truncate};
use super::media::ProcessMedia;
use super::player::PlayerController;

use self::actions::{
    apply_catalog_result, run_player_command, spawn_catalog_fetch, status_error, status_info,
};
use self::render::draw_tui;
use self::session::TerminalSession;

const SEEK_STEP_SECONDS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerCommand {
    TogglePlay,
    Next,
    Previous,
    ToggleShuffle,
    ToggleLoop,
    SeekBack,
    SeekForward,
}

impl PlayerCommand {
    pub(crate) fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char(' ') => Some(Self::TogglePlay),
            KeyCode::Char('n') => Some(Self::Next),
            KeyCode::Char('p') => Some(Self::Previous),
            KeyCode::Char('s') => Some(Self::ToggleShuffle),
            KeyCode::Char('l') => Some(Self::ToggleLoop),
            KeyCode::Left => Some(Self::SeekBack),
            KeyCode::Right => Some(Self::SeekForward),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CatalogState {
    Loading,
    Ready(Vec<Episode>),
    Failed(String),
}

impl CatalogState {
    pub(super) fn episodes(&self) -> &[Episode] {
        match self {
            Self::Ready(episodes) => episodes.as_slice(),
            Self::Loading | Self::Failed(_) => &[],
        }
    }
}

#[derive(Debug)]
pub(super) struct CatalogFetchResult {
    pub(super) generation: u64,
    pub(super) result: Result<Vec<Episode>, String>,
}

pub(crate) fn run_tui(config: &Config) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let controller = PlayerController::new(StdRng::from_os_rng());
    let mut driver = PlayerDriver::new(controller, ProcessMedia::new(&config.player_bin));

    let mut catalog = CatalogState::Loading;
    let mut table_state = TableState::default();
    let (fetch_tx, fetch_rx) = mpsc::channel::<CatalogFetchResult>();
    let mut generation = 0_u64;
    spawn_catalog_fetch(config, generation, &fetch_tx);
    let mut status = status_info("Loading episodes...");

    loop {
        while let Ok(fetched) = fetch_rx.try_recv() {
            if let Some(message) =
                apply_catalog_result(fetched, generation, &mut catalog, &mut table_state)
            {
                status = message;
            }
        }

        if let Err(err) = driver.pump() {
            error!(error = %err, "player failed");
            status = status_error(&format!("Player failed: {err:#}"));
        }

        let view = driver.view();
        let today = Local::now().date_naive();
        terminal.draw(|frame| draw_tui(frame, &catalog, &mut table_state, &view, &status, today))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('r') => {
                generation += 1;
                catalog = CatalogState::Loading;
                spawn_catalog_fetch(config, generation, &fetch_tx);
                status = status_info("Refreshing episodes...");
            }
            KeyCode::Up => {
                if let Some(selected) = table_state.selected() {
                    table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down => {
                let len = catalog.episodes().len();
                if let Some(selected) = table_state.selected()
                    && len > 0
                {
                    table_state.select(Some((selected + 1).min(len - 1)));
                }
            }
            KeyCode::Enter => {
                let episodes = catalog.episodes();
                let Some(selected) = table_state.selected() else {
                    status = status_error("Nothing to play yet.");
                    continue;
                };
                let Some(episode) = episodes.get(selected) else {
                    status = status_error("Invalid selection.");
                    continue;
                };
                let title = episode.title.clone();
                match driver.play(episodes.to_vec(), selected) {
                    Ok(()) => {
                        info!(index = selected, "playing from library");
                        status = status_info(&format!("Playing {}", truncate(&title, 60)));
                    }
                    Err(err) => status = status_error(&format!("Play failed: {err:#}")),
                }
            }
            code => {
                let Some(command) = PlayerCommand::from_key(code) else {
                    continue;
                };
                status = match run_player_command(&mut driver, command, SEEK_STEP_SECONDS) {
                    Ok(message) => status_info(&message),
                    Err(err) => status_error(&format!("{err:#}")),
                };
            }
        }
    }

    driver.clear()?;
    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
