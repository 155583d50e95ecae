mod api;
mod driver;
mod episode;
mod media;
mod player;
mod site;
mod tui;


use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Local;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::Config;

use self::api::{fetch_episode, fetch_latest_episodes};
use self::driver::PlayerDriver;
use self::episode::{Episode, truncate};
use self::media::ProcessMedia;
use self::player::PlayerController;

pub fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Some(Command::List) => run_list(&config)?,
        Some(Command::Show { id }) => run_show(&config, &id)?,
        Some(Command::Build { out }) => run_build(&config, &out)?,
        Some(Command::Play {
            from,
            shuffle,
            looping,
        }) => run_play(&config, from.as_deref(), shuffle, looping)?,
        Some(Command::Tui) | None => tui::run_tui(&config)?,
    }

    Ok(())
}

fn run_list(config: &Config) -> Result<()> {
    let episodes = fetch_latest_episodes(config)?;
    if episodes.is_empty() {
        println!("No episodes published yet.");
        return Ok(());
    }

    println!(
        "{:<24} {:<44} {:<10} {:<10}",
        "ID", "TITLE", "DATE", "DURATION"
    );
    for episode in &episodes {
        println!(
            "{:<24} {:<44} {:<10} {:<10}",
            truncate(&episode.id, 24),
            truncate(&episode.title, 44),
            episode.published_at,
            episode.duration_label
        );
    }
    Ok(())
}

fn run_show(config: &Config, id: &str) -> Result<()> {
    let episode = fetch_episode(config, id)?;
    println!("{}", episode.title);
    println!("  Members:   {}", episode.members);
    println!("  Published: {}", episode.published_at);
    println!("  Duration:  {}", episode.duration_label);
    println!("  Audio:     {}", episode.media_url);
    println!("  Thumbnail: {}", episode.thumbnail);
    Ok(())
}

fn run_build(config: &Config, out: &Path) -> Result<()> {
    let episodes = fetch_latest_episodes(config)?;
    let written = site::write_site(out, &episodes, Local::now().date_naive())?;
    println!(
        "Rendered {} page(s) for {} episode(s) into {}",
        written.iter().filter(|path| path.extension().is_some_and(|ext| ext == "html")).count(),
        episodes.len(),
        out.display()
    );
    Ok(())
}

fn start_index(episodes: &[Episode], from: Option<&str>) -> Result<usize> {
    match from {
        None => Ok(0),
        Some(id) => match episodes.iter().position(|episode| episode.id == id) {
            Some(idx) => Ok(idx),
            None => bail!("episode {id} is not among the latest {} episodes", episodes.len()),
        },
    }
}

fn run_play(config: &Config, from: Option<&str>, shuffle: bool, looping: bool) -> Result<()> {
    let episodes = fetch_latest_episodes(config)?;
    if episodes.is_empty() {
        println!("No episodes to play.");
        return Ok(());
    }
    let index = start_index(&episodes, from)?;

    let controller = PlayerController::new(StdRng::from_os_rng());
    let mut driver = PlayerDriver::new(controller, ProcessMedia::new(&config.player_bin));
    if shuffle {
        driver.toggle_shuffle()?;
    }
    if looping {
        driver.toggle_loop()?;
    }
    driver.play(episodes, index)?;
    info!(index, shuffle, looping, "headless playback started");

    let mut announced = None;
    while !driver.is_idle() {
        let revision = driver.controller().revision();
        if announced != Some(revision) {
            announced = Some(revision);
            if let Some(episode) = driver.controller().current_episode() {
                println!(
                    "Now playing: {} ({}) - {}",
                    episode.title, episode.duration_label, episode.members
                );
            }
        }
        thread::sleep(Duration::from_millis(250));
        driver.pump()?;
        // Nothing pauses headless playback except the player process failing.
        if !driver.is_idle() && !driver.view().is_playing {
            bail!(
                "{} stopped before the episode ended",
                config.player_bin.display()
            );
        }
    }

    println!("Playlist finished.");
    Ok(())
}
