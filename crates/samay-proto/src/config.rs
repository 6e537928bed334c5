use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the forecasting service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Ceiling for a single HTTP exchange. Task polling is not bounded by this.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Give up on a task that is still PENDING/STARTED after this long.
    /// Unset means poll until the task settles or the action is cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Server-side path used by "Use Example".
    #[serde(default = "default_example_path")]
    pub example_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_finetune")]
    pub default_finetune: bool,
    #[serde(default = "default_epochs")]
    pub default_epochs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for downloaded forecast plots.
    #[serde(default = "platform::downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_secs: None,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            example_path: default_example_path(),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            default_finetune: default_finetune(),
            default_epochs: default_epochs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            downloads_dir: platform::downloads_dir(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Floor for the gap between two status queries.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_base_url() -> String {
    "https://flaskapi4samay-production.up.railway.app".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_example_path() -> String {
    "data/data/ETTh1.csv".to_string()
}

fn default_finetune() -> bool {
    true
}

fn default_epochs() -> u32 {
    1
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, writing defaults there on first run.
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
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
        assert!(config.api.base_url.starts_with("https://"));
        assert_eq!(config.polling.interval(), Duration::from_millis(2000));
        assert_eq!(config.polling.timeout(), None);
        assert_eq!(config.dataset.example_path, "data/data/ETTh1.csv");
        assert_eq!(config.plot.default_epochs, 1);
        assert!(config.paths.downloads_dir.ends_with("samay-forecasts"));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://127.0.0.1:5000"

            [polling]
            timeout_secs = 600
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.api.request_timeout_secs, 300);
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.polling.timeout(), Some(Duration::from_secs(600)));
        assert!(config.plot.default_finetune);
    }

    #[test]
    fn test_zero_poll_interval_is_floored() {
        let config: Config = toml::from_str("[polling]\ninterval_ms = 0").unwrap();
        assert_eq!(config.polling.interval_ms, 0);
        assert_eq!(
            config.polling.interval(),
            Duration::from_millis(MIN_POLL_INTERVAL_MS)
        );

        let slow = PollingConfig {
            interval_ms: 5000,
            timeout_secs: None,
        };
        assert_eq!(slow.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.api.base_url, config.api.base_url);
        assert_eq!(reloaded.polling.interval_ms, config.polling.interval_ms);
    }
}
