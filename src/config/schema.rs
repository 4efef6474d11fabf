//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Durations are whole seconds, matching the option they feed.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Supervised server settings.
    pub server: ServerConfig,

    /// Outbound client settings.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., ":8080" or "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum time to read request headers.
    pub read_timeout_secs: u64,

    /// Maximum time for the handler to respond.
    pub write_timeout_secs: u64,

    /// Time in-flight requests get after a shutdown signal.
    pub shutdown_grace_secs: u64,

    /// Maximum request line plus header size in bytes.
    pub max_header_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: ":8080".to_string(),
            read_timeout_secs: 5,
            write_timeout_secs: 10,
            shutdown_grace_secs: 5,
            max_header_bytes: 1 << 20,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Total request timeout. Zero disables it.
    pub timeout_secs: u64,

    /// Connection establishment timeout.
    pub connect_timeout_secs: Option<u64>,

    /// How long idle pooled connections are kept.
    pub pool_idle_timeout_secs: Option<u64>,

    /// Only speak HTTP/1.
    pub http1_only: bool,

    /// Ignore system proxy settings.
    pub no_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            connect_timeout_secs: None,
            pool_idle_timeout_secs: None,
            http1_only: false,
            no_proxy: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (e.g., "info" or "steady_http=debug,tower_http=info").
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
