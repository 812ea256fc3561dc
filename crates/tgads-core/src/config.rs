use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::warn;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request deadline. 0 leaves requests unbounded.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per channel in the table.
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    /// Extra rows materialised above and below the viewport.
    #[serde(default = "default_overscan")]
    pub overscan: usize,
}

/// What a failed bulk fetch does to the collection already on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Clear on every new fetch; a failure leaves the table empty.
    #[default]
    Discard,
    /// Keep the last successful collection and show the error beside it.
    KeepStale,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
            overscan: default_overscan(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_file: default_log_file(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_row_height() -> u32 {
    1
}

fn default_overscan() -> usize {
    3
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("state.json")
}

fn default_log_file() -> PathBuf {
    platform::data_dir().join("tgads.log")
}

impl Config {
    /// Load `config.toml`, writing defaults on first run.
    ///
    /// A file that fails to parse is reported and replaced by defaults in
    /// memory; it is not overwritten.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match toml::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("[config] {} is invalid, using defaults: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api/v1");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.view.row_height, 1);
        assert_eq!(config.view.overscan, 3);
        assert_eq!(config.fetch.failure_policy, FailurePolicy::Discard);
        assert!(config.paths.state_file.ends_with("tgads/state.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://ads.example/api"

            [fetch]
            failure_policy = "keep_stale"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://ads.example/api");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.fetch.failure_policy, FailurePolicy::KeepStale);
        assert_eq!(config.view.overscan, 3);
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.view.row_height, 1);

        let again = Config::load_from(&path).unwrap();
        assert_eq!(again.api.base_url, config.api.base_url);
    }

    #[test]
    fn invalid_file_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[api\nbase_url = ");
    }
}
