//! Client configuration
//!
//! Provides centralized configuration for the controller, the API worker and the UI.
//! Values come from a TOML file, with an environment override for the server URL.

use crate::processor::ScoreAnimation;
use crate::{Result, TasteError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "TASTECHECK_CONFIG";

/// Environment variable overriding `server_url`
pub const SERVER_URL_ENV: &str = "TASTECHECK_SERVER_URL";

/// Configuration for the TasteCheck client
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analysis service
    pub server_url: String,
    /// TCP connect timeout for API calls (requests themselves have no deadline)
    pub connect_timeout_ms: u64,
    /// Delay between choosing a feedback style and starting the analysis
    pub style_select_delay_ms: u64,
    /// Interval of the loading status rotation
    pub loading_rotation_ms: u64,
    /// Total duration of the score counter animation
    pub score_animation_ms: u64,
    /// Tick interval of the score counter animation
    pub score_tick_ms: u64,
    /// Directory where share images are written
    pub share_output_dir: PathBuf,
    /// Channel buffer size
    pub channel_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "https://tastecheckapp.onrender.com".to_string(),
            connect_timeout_ms: 10_000,
            style_select_delay_ms: 300,
            loading_rotation_ms: 8_000,
            score_animation_ms: 2_000,
            score_tick_ms: 16,
            share_output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("output")),
            channel_buffer_size: 100,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TasteError::ConfigError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| TasteError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for this process
    ///
    /// Order: `$TASTECHECK_CONFIG`, then `<config_dir>/tastecheck/config.toml`, then defaults.
    /// `$TASTECHECK_SERVER_URL` overrides whatever was loaded.
    pub fn discover() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let default_path = dirs::config_dir().map(|d| d.join("tastecheck").join("config.toml"));

        let mut config = match (explicit, default_path) {
            (Some(path), _) => {
                info!("Loading config from {}", path.display());
                Self::load(path)?
            }
            (None, Some(path)) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::load(path)?
            }
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            config = config.with_server_url(url);
            config.validate()?;
        }

        Ok(config)
    }

    /// Set the server URL
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the style selection delay
    pub fn with_style_select_delay_ms(mut self, delay: u64) -> Self {
        self.style_select_delay_ms = delay;
        self
    }

    /// Set the loading rotation interval
    pub fn with_loading_rotation_ms(mut self, interval: u64) -> Self {
        self.loading_rotation_ms = interval;
        self
    }

    /// Set the share image output directory
    pub fn with_share_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.share_output_dir = dir.into();
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Server URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    pub fn style_select_delay(&self) -> Duration {
        Duration::from_millis(self.style_select_delay_ms)
    }

    pub fn loading_rotation_interval(&self) -> Duration {
        Duration::from_millis(self.loading_rotation_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Counter animation for a score target
    pub fn score_animation(&self, target: i64) -> ScoreAnimation {
        ScoreAnimation::new(
            target,
            Duration::from_millis(self.score_animation_ms),
            Duration::from_millis(self.score_tick_ms),
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(TasteError::ConfigError(format!(
                "server_url must be an http(s) URL, got '{}'",
                self.server_url
            )));
        }
        if self.score_tick_ms == 0 {
            return Err(TasteError::ConfigError(
                "score_tick_ms must be greater than zero".to_string(),
            ));
        }
        if self.loading_rotation_ms == 0 {
            return Err(TasteError::ConfigError(
                "loading_rotation_ms must be greater than zero".to_string(),
            ));
        }
        if self.channel_buffer_size == 0 {
            return Err(TasteError::ConfigError(
                "channel_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.style_select_delay_ms, 300);
        assert_eq!(config.loading_rotation_ms, 8_000);
        assert_eq!(config.score_animation_ms, 2_000);
        assert_eq!(config.score_tick_ms, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            server_url = "http://localhost:8000/"
            loading_rotation_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.loading_rotation_ms, 500);
        assert_eq!(config.score_tick_ms, 16);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = ClientConfig::from_toml(r#"server_url = "ftp://example.com""#);
        assert!(matches!(result, Err(TasteError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = ClientConfig {
            score_tick_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_server_url("http://127.0.0.1:5000")
            .with_style_select_delay_ms(0)
            .with_channel_buffer_size(8);

        assert_eq!(config.base_url(), "http://127.0.0.1:5000");
        assert_eq!(config.style_select_delay(), Duration::ZERO);
        assert_eq!(config.channel_buffer_size, 8);
    }
}
