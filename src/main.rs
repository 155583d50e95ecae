mod app;
mod cli;
mod config;
mod http;
mod logging;
mod paths;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::from_env().with_cli_overrides(&cli);
    logging::init(&config);
    app::run(cli, config)
}
