use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::http::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";
pub const DEFAULT_PLAYER_BIN: &str = "mpv";
pub const DEFAULT_EPISODE_LIMIT: usize = 12;
pub const DEFAULT_HTTP_ATTEMPTS: usize = 3;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub player_bin: PathBuf,
    pub episode_limit: usize,
    pub retry: RetryPolicy,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let text = |key: &str| {
            lookup(key)
                .and_then(|value| value.into_string().ok())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let positive = |key: &str, default: usize| {
            text(key)
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        let api_url = text("PODCASTR_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let player_bin = match lookup("PODCASTR_PLAYER_BIN") {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => PathBuf::from(DEFAULT_PLAYER_BIN),
        };

        Self {
            api_url: normalize_api_url(&api_url),
            player_bin,
            episode_limit: positive("PODCASTR_EPISODE_LIMIT", DEFAULT_EPISODE_LIMIT),
            retry: RetryPolicy {
                attempts: positive("PODCASTR_HTTP_ATTEMPTS", DEFAULT_HTTP_ATTEMPTS),
                ..RetryPolicy::default()
            },
            log_filter: text("PODCASTR_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(api_url) = cli.api_url.as_deref()
            && !api_url.trim().is_empty()
        {
            self.api_url = normalize_api_url(api_url);
        }
        self
    }
}

fn normalize_api_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.player_bin, PathBuf::from(DEFAULT_PLAYER_BIN));
        assert_eq!(config.episode_limit, DEFAULT_EPISODE_LIMIT);
        assert_eq!(config.retry.attempts, DEFAULT_HTTP_ATTEMPTS);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("PODCASTR_API_URL", "https://api.example.test/"),
            ("PODCASTR_PLAYER_BIN", "/usr/local/bin/ffplay"),
            ("PODCASTR_EPISODE_LIMIT", "20"),
            ("PODCASTR_HTTP_ATTEMPTS", "5"),
            ("PODCASTR_LOG", "podcastr=debug"),
        ]));
        assert_eq!(config.api_url, "https://api.example.test");
        assert_eq!(config.player_bin, PathBuf::from("/usr/local/bin/ffplay"));
        assert_eq!(config.episode_limit, 20);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.log_filter, "podcastr=debug");
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("PODCASTR_EPISODE_LIMIT", "lots"),
            ("PODCASTR_HTTP_ATTEMPTS", "0"),
        ]));
        assert_eq!(config.episode_limit, DEFAULT_EPISODE_LIMIT);
        assert_eq!(config.retry.attempts, DEFAULT_HTTP_ATTEMPTS);
    }

    #[test]
    fn empty_player_bin_uses_default() {
        let config = Config::from_lookup(lookup_from(&[("PODCASTR_PLAYER_BIN", "")]));
        assert_eq!(config.player_bin, PathBuf::from(DEFAULT_PLAYER_BIN));
    }
}
