//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Server::run begins shutdown
//!
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger → ShutdownSignal::wait → Server::run_until begins shutdown
//!     ShutdownSignal::wait as the cancel future of Server::run_with cuts the drain short
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced close after the grace period

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
