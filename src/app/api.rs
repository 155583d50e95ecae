use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::http::get_text_with_retries;

use super::episode::{Episode, format_duration, format_published_at, parse_duration_seconds};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodeRecord {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) members: String,
    #[serde(default)]
    pub(crate) thumbnail: String,
    #[serde(default)]
    pub(crate) published_at: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) file: FileRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileRecord {
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) duration: serde_json::Value,
}

impl EpisodeRecord {
    pub(crate) fn into_episode(self) -> Episode {
        let duration = parse_duration_seconds(&self.file.duration);
        Episode {
            published_at: format_published_at(&self.published_at),
            duration,
            duration_label: format_duration(duration),
            media_url: self.file.url,
            id: self.id,
            title: self.title,
            members: self.members,
            thumbnail: self.thumbnail,
            description: self.description,
        }
    }
}

pub(crate) fn parse_episode_list(raw: &str) -> Result<Vec<Episode>> {
    let records: Vec<EpisodeRecord> =
        serde_json::from_str(raw).context("failed to decode episode list")?;
    Ok(records
        .into_iter()
        .map(EpisodeRecord::into_episode)
        .collect())
}

pub(crate) fn parse_episode(raw: &str) -> Result<Episode> {
    let record: EpisodeRecord = serde_json::from_str(raw).context("failed to decode episode")?;
    Ok(record.into_episode())
}

/// Newest first, limited to `config.episode_limit`.
pub(crate) fn fetch_latest_episodes(config: &Config) -> Result<Vec<Episode>> {
    let url = format!("{}/episodes", config.api_url);
    let query = vec![
        ("_limit".to_string(), config.episode_limit.to_string()),
        ("_sort".to_string(), "published_at".to_string()),
        ("_order".to_string(), "desc".to_string()),
    ];
    let body = get_text_with_retries(&url, &query, &config.retry)
        .map_err(|err| anyhow!("failed to fetch episodes from {url}: {err}"))?;
    let episodes = parse_episode_list(&body)?;
    info!(count = episodes.len(), "fetched episode list");
    Ok(episodes)
}

pub(crate) fn fetch_episode(config: &Config, id: &str) -> Result<Episode> {
    let id = id.trim();
    if !is_valid_episode_id(id) {
        bail!("invalid episode id: {id:?}");
    }
    let url = format!("{}/episodes/{id}", config.api_url);
    let body = get_text_with_retries(&url, &[], &config.retry)
        .map_err(|err| anyhow!("failed to fetch episode {id}: {err}"))?;
    debug!(id, "fetched episode");
    parse_episode(&body)
}

pub(crate) fn is_valid_episode_id(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '/' | '?' | '#'))
}
