//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! Server::run
//!     → spawn serve task (engine.rs: bind, accept, hyper connections)
//!     → wait for SIGINT/SIGTERM (lifecycle::signals)
//!     → engine.shutdown() bounded by the shutdown grace
//!     → on timeout: engine.close() aborts connections
//!     → join serve task
//! ```
//!
//! Messages for operators go to the output/error sinks (sink.rs);
//! diagnostics go through `tracing`.

pub mod engine;
pub mod options;
pub mod routes;
pub mod server;
pub mod sink;

pub use engine::{EngineError, HyperEngine, ServingEngine};
pub use options::{ServerOptions, MAX_HEADER_BYTES, READ_TIMEOUT, SHUTDOWN_TIMEOUT, WRITE_TIMEOUT};
pub use server::{Server, ServerBuilder, ServerError};
pub use sink::Sink;
