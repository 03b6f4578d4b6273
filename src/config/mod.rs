//! Configuration layer: typed settings with layered precedence (file → env).

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::infra::error::InfraError;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const ENV_PREFIX: &str = "VETRINA";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_MEDIA_BASE_URL: &str = "https://media.vetrina.dev";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Delay between completion polls for pending async renders.
    pub poll_interval_secs: u64,
    /// When set, non-approved items render at the fast tier.
    pub prefer_fast_tier: bool,
    /// Base URL composed into file-renderer artifact paths.
    pub media_base_url: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            prefer_fast_tier: true,
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub pipeline: PipelineSettings,
}

impl Settings {
    /// Load settings from the optional config file, overridden by
    /// `VETRINA_`-prefixed environment variables.
    pub fn load() -> Result<Self, InfraError> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|err| InfraError::configuration(err.to_string()))?;
        config
            .try_deserialize()
            .map_err(|err| InfraError::configuration(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_expectations() {
        let settings = Settings::default();
        assert_eq!(settings.pipeline.poll_interval_secs, 30);
        assert!(settings.pipeline.prefer_fast_tier);
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn load_without_sources_yields_defaults() {
        let settings = Settings::load().expect("defaults load");
        assert_eq!(settings.pipeline.poll_interval_secs, 30);
        assert!(settings.pipeline.prefer_fast_tier);
    }

    #[test]
    fn poll_interval_converts_to_duration() {
        let settings = PipelineSettings {
            poll_interval_secs: 5,
            ..PipelineSettings::default()
        };
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
    }
}
