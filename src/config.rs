use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read clock config {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse clock config")]
    ParseToml(#[from] toml::de::Error),
}

/// Settings shared by every queue of a [`Clock`](crate::Clock).
///
/// ```toml
/// start_time = 0.0
/// max_timer_key = 4294967295
/// max_subscriber_key = 4294967295
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Queue time reported before the first tick. The first tick itself
    /// always has a delta of 0.
    pub start_time: f64,
    /// Largest raw timer key per queue. Keys run `0..=max_timer_key`.
    pub max_timer_key: u32,
    /// Largest raw subscriber key per queue.
    pub max_subscriber_key: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            max_timer_key: u32::MAX,
            max_subscriber_key: u32::MAX,
        }
    }
}

impl ClockConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;

        tracing::debug!(path = %path.display(), ?config, "clock config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = ClockConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClockConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ClockConfig::from_toml_str("start_time = 1.5\nmax_timer_key = 15\n").unwrap();

        assert_eq!(config.start_time, 1.5);
        assert_eq!(config.max_timer_key, 15);
        assert_eq!(config.max_subscriber_key, u32::MAX);
    }

    #[test]
    fn test_bad_toml() {
        let err = ClockConfig::from_toml_str("start_time = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ClockConfig::load("/definitely/not/here/clock.toml").unwrap_err();
        match err {
            ConfigError::ReadFile { path, .. } => {
                assert!(path.ends_with("clock.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("clockqueue-{}.toml", std::process::id()));
        std::fs::write(&path, "max_subscriber_key = 7\n").unwrap();

        let config = ClockConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.max_subscriber_key, 7);
    }
}
