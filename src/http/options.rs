//! Server timeouts and limits.

use std::time::Duration;

use crate::config::ServerConfig;

/// Maximum duration for reading the request header.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum duration for the handler to produce a response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum time in-flight requests get to finish before the server is killed.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum bytes read while parsing the request line and headers.
/// Does not limit the request body.
pub const MAX_HEADER_BYTES: usize = 1 << 20;

/// Tunables applied to the serving engine and the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub max_header_bytes: usize,
    pub shutdown_grace: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
            max_header_bytes: MAX_HEADER_BYTES,
            shutdown_grace: SHUTDOWN_TIMEOUT,
        }
    }
}

impl From<&ServerConfig> for ServerOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            write_timeout: Duration::from_secs(config.write_timeout_secs),
            max_header_bytes: config.max_header_bytes,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
        }
    }
}
