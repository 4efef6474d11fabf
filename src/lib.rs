//! Sane-default wrappers around HTTP servers and clients.
//!
//! - [`http::Server`] runs a serving engine with fixed timeouts, waits for
//!   SIGINT/SIGTERM, drains in-flight requests for a bounded grace period and
//!   force-closes the engine when the drain overruns.
//! - [`client::Client`] is a reqwest client with a 5 second default timeout.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;

pub use client::Client;
pub use config::AppConfig;
pub use http::{Server, ServerBuilder, ServerError};
pub use lifecycle::Shutdown;
