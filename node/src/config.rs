//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use sv_verification::{VerificationConfig, OTP_TTL_SECS};

use crate::{LogFormat, NodeError};

/// Smallest LMDB map the node accepts: 1 MiB.
const MIN_MAP_SIZE: usize = 1 << 20;

/// Configuration for a verification node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Serve Prometheus metrics at `/metrics`.
    #[serde(default = "default_enable_metrics")]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds an issued OTP stays valid.
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: u64,

    /// LMDB memory map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./sv_data")
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    7080
}

fn default_enable_metrics() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otp_ttl_secs() -> u64 {
    OTP_TTL_SECS
}

fn default_lmdb_map_size() -> usize {
    1 << 30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.log_format()?;
        self.rpc_addr()?;
        if self.otp_ttl_secs == 0 {
            return Err(NodeError::Config("otp_ttl_secs must be positive".into()));
        }
        if self.lmdb_map_size < MIN_MAP_SIZE {
            return Err(NodeError::Config(format!(
                "lmdb_map_size must be at least {MIN_MAP_SIZE} bytes"
            )));
        }
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn rpc_addr(&self) -> Result<SocketAddr, NodeError> {
        let ip: IpAddr = self
            .rpc_host
            .parse()
            .map_err(|_| NodeError::Config(format!("invalid rpc_host '{}'", self.rpc_host)))?;
        Ok(SocketAddr::new(ip, self.rpc_port))
    }

    pub fn verification_config(&self) -> VerificationConfig {
        VerificationConfig {
            otp_ttl_secs: self.otp_ttl_secs,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            enable_metrics: default_enable_metrics(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            otp_ttl_secs: default_otp_ttl_secs(),
            lmdb_map_size: default_lmdb_map_size(),
        }
    }
}
