// src/config.rs

//! Manages server configuration: loading from TOML and validation.

use crate::core::pairing::code::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use tracing::warn;

/// Settings for pairing-code issuance and expiry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PairingConfig {
    /// Number of characters in a pairing code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Lifetime of an unredeemed code in seconds. `0` keeps codes until they are
    /// redeemed or their host disconnects.
    #[serde(default)]
    pub code_ttl_seconds: u64,
    /// How often the sweeper looks for expired codes. Only used when a TTL is set.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How many times to draw a code before giving up on finding a free one.
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: usize,
}

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}
fn default_sweep_interval() -> u64 {
    30
}
fn default_max_generation_attempts() -> usize {
    16
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            code_ttl_seconds: 0,
            sweep_interval_seconds: default_sweep_interval(),
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

/// Overrides for what `GET /serverinfo` reports.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DiscoveryConfig {
    /// The address clients should dial. Autodetected when unset.
    #[serde(default)]
    pub announce_ip: Option<String>,
    /// The name shown to clients. The OS host name when unset.
    #[serde(default)]
    pub machine_name: Option<String>,
}

/// HTTP-level settings shared by `/serverinfo` and `/ws`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Answer every origin with permissive CORS headers.
    #[serde(default = "default_true")]
    pub cors_allow_all: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_allow_all: true,
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    5001
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upgrades beyond this many live connections are refused.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// How many relayed payloads a connection's outbound queue holds before
    /// further payloads are dropped. Control messages are never dropped.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// How long shutdown waits for connection tasks to wind down.
    #[serde(default = "default_shutdown_grace_period_ms")]
    pub shutdown_grace_period_ms: u64,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_clients() -> usize {
    10000
}
fn default_max_message_size() -> usize {
    1024 * 1024 // 1 MB
}
fn default_outbound_queue_capacity() -> usize {
    64
}
fn default_shutdown_grace_period_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_clients: default_max_clients(),
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            shutdown_grace_period_ms: default_shutdown_grace_period_ms(),
            pairing: PairingConfig::default(),
            discovery: DiscoveryConfig::default(),
            http: HttpConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid configuration in '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_clients == 0 {
            return Err(anyhow!("max_clients cannot be 0"));
        }
        if self.max_message_size == 0 {
            return Err(anyhow!("max_message_size cannot be 0"));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(anyhow!("outbound_queue_capacity cannot be 0"));
        }

        let pairing = &self.pairing;
        if pairing.code_length == 0 || pairing.code_length > MAX_CODE_LENGTH {
            return Err(anyhow!(
                "pairing.code_length must be between 1 and {MAX_CODE_LENGTH}"
            ));
        }
        if pairing.max_generation_attempts == 0 {
            return Err(anyhow!("pairing.max_generation_attempts cannot be 0"));
        }
        if pairing.code_ttl_seconds > 0 && pairing.sweep_interval_seconds == 0 {
            return Err(anyhow!(
                "pairing.sweep_interval_seconds cannot be 0 when code_ttl_seconds is set"
            ));
        }
        if pairing.code_length < 4 {
            warn!(
                "pairing.code_length is {}. Short codes are easy to guess.",
                pairing.code_length
            );
        }

        if let Some(ip) = &self.discovery.announce_ip
            && ip.parse::<IpAddr>().is_err()
        {
            return Err(anyhow!("discovery.announce_ip '{ip}' is not a valid IP address"));
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
