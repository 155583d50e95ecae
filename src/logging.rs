use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{Config, DEFAULT_LOG_FILTER};
use crate::paths::log_file_path;

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// File writer when the log file is usable, otherwise a sink so commands still run.
fn log_writer(path: Result<PathBuf>) -> (BoxMakeWriter, Option<PathBuf>) {
    match path.and_then(|path| open_log_file(&path).map(|file| (path, file))) {
        Ok((path, file)) => (BoxMakeWriter::new(Mutex::new(file)), Some(path)),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            (BoxMakeWriter::new(io::sink), None)
        }
    }
}

/// Routes `tracing` output to the log file; the terminal belongs to the player.
pub fn init(config: &Config) {
    let (writer, log_path) = log_writer(log_file_path());
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init();

    if let Some(path) = log_path {
        tracing::info!(log = %path.display(), api = %config.api_url, "podcastr starting");
    }
}
