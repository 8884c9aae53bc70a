//! Configuration loading and typed config structures for the device.
//!
//! The canonical configuration lives in `primejar-config.yaml` at the
//! project root. This module defines strongly-typed structs mirroring the
//! YAML structure and a loader that reads and validates the file. Every
//! field has a default matching the original device firmware, so an empty
//! or missing file yields a fully working configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level device configuration.
///
/// Mirrors the structure of `primejar-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Counter identity and bounds.
    #[serde(default)]
    pub jar: JarConfig,

    /// Network listener settings.
    #[serde(default)]
    pub listen: ListenConfig,

    /// Notification hub liveness settings.
    #[serde(default)]
    pub hub: HubConfig,

    /// Client-side reconciliation cadence settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Primality rule exceptions.
    #[serde(default)]
    pub primality: PrimalityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeviceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Counter identity and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JarConfig {
    /// Human-readable device name.
    #[serde(default = "default_jar_name")]
    pub name: String,

    /// Exclusive upper bound for the counter.
    #[serde(default = "default_counter_modulus")]
    pub counter_modulus: u64,

    /// Counter value at startup.
    #[serde(default = "default_initial_value")]
    pub initial_value: u64,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            name: default_jar_name(),
            counter_modulus: default_counter_modulus(),
            initial_value: default_initial_value(),
        }
    }
}

/// Network listener settings.
///
/// The request gateway and the persistent push channel listen on two
/// separate ports, matching the original device's HTTP/WebSocket split.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port for the HTTP request gateway.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// TCP port for the persistent push channel.
    #[serde(default = "default_push_port")]
    pub push_port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            push_port: default_push_port(),
        }
    }
}

/// Notification hub liveness settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Seconds between liveness sweeps over the connection set.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

/// Client-side reconciliation cadence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Milliseconds between polls while no push channel is available.
    /// 0 disables polling entirely.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Seconds between client keep-warm pings on the push channel.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Seconds to wait before retrying a failed push connection.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Milliseconds per animated counter increment.
    #[serde(default = "default_animation_step_ms")]
    pub animation_step_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            ping_interval_secs: default_ping_interval_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            animation_step_ms: default_animation_step_ms(),
        }
    }
}

/// Primality rule exceptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrimalityConfig {
    /// Values reported as prime regardless of trial division.
    ///
    /// Empty by default. The historical firmware hardwired `8_648_640`
    /// here; list it explicitly to reproduce that behavior.
    #[serde(default)]
    pub extra_primes: Vec<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_jar_name() -> String {
    String::from("jar-of-primes")
}

const fn default_counter_modulus() -> u64 {
    crate::counter::DEFAULT_MODULUS
}

const fn default_initial_value() -> u64 {
    11
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_http_port() -> u16 {
    8080
}

const fn default_push_port() -> u16 {
    8081
}

const fn default_probe_interval_secs() -> u64 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_ping_interval_secs() -> u64 {
    10
}

const fn default_reconnect_delay_secs() -> u64 {
    10
}

const fn default_animation_step_ms() -> u64 {
    150
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = DeviceConfig::parse("{}").unwrap();
        assert_eq!(config.jar.name, "jar-of-primes");
        assert_eq!(config.jar.counter_modulus, 1_000_000);
        assert_eq!(config.jar.initial_value, 11);
        assert_eq!(config.listen.http_port, 8080);
        assert_eq!(config.listen.push_port, 8081);
        assert_eq!(config.hub.probe_interval_secs, 30);
        assert_eq!(config.client.poll_interval_ms, 1000);
        assert_eq!(config.client.ping_interval_secs, 10);
        assert_eq!(config.client.reconnect_delay_secs, 10);
        assert_eq!(config.client.animation_step_ms, 150);
        assert!(config.primality.extra_primes.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = r"
jar:
  initial_value: 97
listen:
  http_port: 80
  push_port: 81
";
        let config = DeviceConfig::parse(yaml).unwrap();
        assert_eq!(config.jar.initial_value, 97);
        assert_eq!(config.jar.counter_modulus, 1_000_000);
        assert_eq!(config.listen.http_port, 80);
        assert_eq!(config.listen.push_port, 81);
        assert_eq!(config.hub.probe_interval_secs, 30);
    }

    #[test]
    fn extra_primes_parse() {
        let yaml = r"
primality:
  extra_primes: [8648640]
";
        let config = DeviceConfig::parse(yaml).unwrap();
        assert_eq!(config.primality.extra_primes, vec![8_648_640]);
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        let result = DeviceConfig::parse("jar: [not, a, mapping]");
        assert!(result.is_err());
    }
}
