//! Server configuration file.

use std::path::Path;
use std::time::Duration;

use beatstream_core::{BackendPreference, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, EngineConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::filter_cutoff_range;

/// Bind addresses the server accepts.
pub const ALLOWED_HOSTS: [&str; 2] = ["0.0.0.0", "127.0.0.1"];
/// Default listening port.
pub const DEFAULT_PORT: u16 = 8765;
/// Lowest port the server will bind.
pub const MIN_PORT: u16 = 1024;

/// Server settings shared by every session.
///
/// # TOML Format
///
/// ```toml
/// host = "127.0.0.1"
/// port = 8765
/// sample_rate = 48000
/// block_size = 2048
/// backend = "accelerated"
/// filter_cutoff = 8000.0
/// max_message_size = 65536
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, `0.0.0.0` or `127.0.0.1`.
    pub host: String,
    /// Listening port, 1024 - 65535.
    pub port: u16,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per block.
    pub block_size: usize,
    /// Preferred compute backend.
    pub backend: BackendPreference,
    /// Initial lowpass cutoff of every session; clients may change or clear it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_cutoff: Option<f64>,
    /// Largest accepted control message in bytes; unlimited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: ALLOWED_HOSTS[0].to_string(),
            port: DEFAULT_PORT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            backend: BackendPreference::default(),
            filter_cutoff: None,
            max_message_size: None,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ALLOWED_HOSTS.contains(&self.host.as_str()) {
            return Err(ConfigError::InvalidHost(self.host.clone()));
        }
        if self.port < MIN_PORT {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid_value("sample_rate", "must be positive"));
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid_value("block_size", "must be at least 1"));
        }
        if let Some(cutoff) = self.filter_cutoff {
            let range = filter_cutoff_range(f64::from(self.sample_rate));
            if !range.contains(cutoff) {
                return Err(ConfigError::invalid_value(
                    "filter_cutoff",
                    format!("{cutoff} Hz outside [{}, {}]", range.min, range.max),
                ));
            }
        }
        if self.max_message_size == Some(0) {
            return Err(ConfigError::invalid_value("max_message_size", "must be positive"));
        }
        Ok(())
    }

    /// `host:port` string for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: f64::from(self.sample_rate),
            block_size: self.block_size,
            filter_cutoff: self.filter_cutoff,
        }
    }

    /// Wall-clock length of one block.
    pub fn block_duration(&self) -> Duration {
        self.engine_config().block_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8765);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.block_size, 2048);
        assert_eq!(config.backend, BackendPreference::Accelerated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn block_duration_is_frames_over_rate() {
        let config = ServerConfig::default();
        let expected = 2048.0 / 48000.0;
        assert!((config.block_duration().as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn rejects_foreign_host() {
        let config = ServerConfig {
            host: "192.168.1.4".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHost(_))));
    }

    #[test]
    fn rejects_privileged_port() {
        let config = ServerConfig {
            port: 80,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(80))));
    }

    #[test]
    fn rejects_cutoff_above_nyquist() {
        let config = ServerConfig {
            filter_cutoff: Some(30000.0),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "filter_cutoff", .. })
        ));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = ServerConfig::from_toml("port = 9000\nbackend = \"gpu\"\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, BackendPreference::Accelerated);
        assert_eq!(config.block_size, 2048);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ServerConfig::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            backend: BackendPreference::Cpu,
            filter_cutoff: Some(4000.0),
            ..ServerConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(ServerConfig::from_toml(&text).unwrap(), config);
    }
}
