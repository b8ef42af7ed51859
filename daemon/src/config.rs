//! Daemon configuration, loadable from TOML.

use biogate_profile::FetchConfig;
use biogate_types::EngineParams;
use biogate_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level daemon configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub log_format: LogFormat,
    pub log_level: String,
    pub engine: EngineParams,
    pub fetch: FetchConfig,
}

impl DaemonConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("DaemonConfig is always serializable to TOML")
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Human,
            log_level: "info".to_string(),
            engine: EngineParams::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let parsed = DaemonConfig::from_toml_str(&config.to_toml_string()).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.engine.session_timeout_secs, 600);
        assert_eq!(config.engine.punishment_secs, 7200);
        assert_eq!(config.fetch.retries, 3);
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_sections_override() {
        let toml = r#"
            log_format = "json"

            [engine]
            session_timeout_secs = 120
            min_external_account_age_days = 30

            [fetch]
            timeout_secs = 3
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.engine.session_timeout_secs, 120);
        assert_eq!(config.engine.min_external_account_age_days, 30);
        assert_eq!(config.engine.max_attempts, 3); // default
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.fetch.retry_delay_ms, 1000); // default
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "log_level = \"debug\"").expect("write");
        let config = DaemonConfig::from_toml_file(file.path()).expect("should load");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DaemonConfig::from_toml_file("/nonexistent/biogate.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DaemonConfig::from_toml_str("engine = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
