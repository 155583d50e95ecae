use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "podcastr",
    version,
    about = "Browse, render and play podcast episodes from a REST API"
)]
pub struct Cli {
    /// Base URL of the episode API (overrides PODCASTR_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive terminal player (default).
    Tui,
    /// Print the latest episodes.
    List,
    /// Print a single episode.
    Show { id: String },
    /// Render the home page and one page per episode.
    Build {
        #[arg(long, default_value = "public")]
        out: PathBuf,
    },
    /// Play the latest episodes without the terminal UI.
    Play {
        /// Episode id to start from (defaults to the newest).
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        shuffle: bool,
        #[arg(long = "loop")]
        looping: bool,
    },
}
