// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Relay configuration.
//!
//! Supports both programmatic and file-based configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uavtalk::HashConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Relay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay name (for identification in logs).
    #[serde(default = "default_relay_name")]
    pub name: String,

    /// Local address the GCS sends to.
    #[serde(default = "default_gcs_listen")]
    pub gcs_listen: SocketAddr,

    /// Local address the flight controller sends to.
    #[serde(default = "default_fc_listen")]
    pub fc_listen: SocketAddr,

    /// Fixed GCS address. Learned from incoming frames when unset.
    #[serde(default)]
    pub gcs_address: Option<SocketAddr>,

    /// Fixed flight controller address. Learned from incoming frames when unset.
    #[serde(default)]
    pub fc_address: Option<SocketAddr>,

    /// Directory of XML object definitions.
    #[serde(default = "default_definitions")]
    pub definitions: PathBuf,

    /// Forward frames whose object id is not registered.
    #[serde(default = "default_true")]
    pub forward_unknown: bool,

    /// Statistics reporting interval (seconds, 0 disables).
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identifier hashing switches; must match both peers.
    #[serde(default)]
    pub hashing: HashConfig,
}

fn is_broadcast(ip: IpAddr) -> bool {
    matches!(ip, IpAddr::V4(v4) if v4.is_broadcast())
}

fn default_relay_name() -> String {
    "uavtalk-relay".to_string()
}

fn default_gcs_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9000))
}

fn default_fc_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9001))
}

fn default_definitions() -> PathBuf {
    PathBuf::from("uavobjectdefinition")
}

fn default_true() -> bool {
    true
}

fn default_stats_interval() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            gcs_listen: default_gcs_listen(),
            fc_listen: default_fc_listen(),
            gcs_address: None,
            fc_address: None,
            definitions: default_definitions(),
            forward_unknown: true,
            stats_interval_secs: default_stats_interval(),
            log_level: default_log_level(),
            hashing: HashConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Relay between two local ports, learning both peer addresses.
    pub fn local(gcs_listen: SocketAddr, fc_listen: SocketAddr) -> Self {
        Self {
            gcs_listen,
            fc_listen,
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gcs_listen == self.fc_listen && self.gcs_listen.port() != 0 {
            return Err(ConfigError::Invalid(format!(
                "GCS and FC sockets both listen on {}",
                self.gcs_listen
            )));
        }

        if self.definitions.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("Empty definitions path".into()));
        }

        for (what, addr) in [("gcs_address", self.gcs_address), ("fc_address", self.fc_address)] {
            if let Some(addr) = addr {
                if addr.port() == 0 || addr.ip().is_unspecified() {
                    return Err(ConfigError::Invalid(format!(
                        "{} {} is not a reachable address",
                        what, addr
                    )));
                }
                if addr.ip().is_multicast() || is_broadcast(addr.ip()) {
                    return Err(ConfigError::Invalid(format!(
                        "{} {} is not a unicast address",
                        what, addr
                    )));
                }
            }
        }

        Ok(())
    }

    /// Set the fixed flight controller address.
    pub fn fc_address(mut self, addr: SocketAddr) -> Self {
        self.fc_address = Some(addr);
        self
    }

    /// Set the fixed GCS address.
    pub fn gcs_address(mut self, addr: SocketAddr) -> Self {
        self.gcs_address = Some(addr);
        self
    }

    /// Set the definitions directory.
    pub fn definitions(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definitions = dir.into();
        self
    }

    /// Set the unknown-object forwarding policy.
    pub fn forward_unknown(mut self, enabled: bool) -> Self {
        self.forward_unknown = enabled;
        self
    }
}
