//! Supervised HTTP server.
//!
//! # Responsibilities
//! - Apply sane default timeouts to the serving engine
//! - Run the engine on its own task and report its terminal error
//! - Wait for a termination signal, drain gracefully, kill on timeout
//! - Join the serving task before returning
//!
//! # Design Decisions
//! - Startup failures are reported on the error sink, never returned;
//!   `run` only fails when the server cannot be killed
//! - The drain is bounded by the shutdown grace and by the caller's
//!   cancellation, whichever comes first
//! - Dropping the run future aborts the serving task
//! - The process is never exited from here

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;
use tokio::time::error::Elapsed;

use crate::config::ServerConfig;
use crate::http::engine::{EngineError, HyperEngine, ServingEngine};
use crate::http::options::ServerOptions;
use crate::http::sink::Sink;
use crate::lifecycle::signals;

/// Error returned by [`Server::run`].
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Graceful drain failed and the forced close failed too.
    #[error("error killing server: {0}")]
    Kill(#[source] EngineError),
}

/// Why a graceful drain did not complete.
#[derive(Debug, thiserror::Error)]
enum DrainError {
    #[error(transparent)]
    Elapsed(#[from] Elapsed),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("drain cancelled")]
    Cancelled,
}

/// Serving task handle that aborts the task when dropped unjoined.
struct ServeTask(Option<JoinHandle<()>>);

impl ServeTask {
    fn abort(&self) {
        if let Some(handle) = &self.0 {
            handle.abort();
        }
    }

    async fn join(mut self) {
        let Some(handle) = self.0.take() else {
            return;
        };
        match handle.await {
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "Serve task panicked");
            }
            _ => {}
        }
    }
}

impl Drop for ServeTask {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            tracing::warn!("Run dropped before shutdown, aborting serve task");
            handle.abort();
        }
    }
}

/// A serving engine with timeouts, message sinks and signal-driven shutdown.
pub struct Server<E = HyperEngine> {
    engine: Arc<E>,
    options: ServerOptions,
    out: Sink,
    err: Sink,
}

impl Server<HyperEngine> {
    /// Server for `addr` dispatching to `handler`, with default options.
    pub fn new(addr: impl Into<String>, handler: Router) -> Self {
        ServerBuilder::new().build(addr, handler)
    }

    /// Start configuring a server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<E: ServingEngine> Server<E> {
    pub fn addr(&self) -> &str {
        self.engine.addr()
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn read_timeout(&self) -> Duration {
        self.options.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.options.write_timeout
    }

    pub fn max_header_bytes(&self) -> usize {
        self.options.max_header_bytes
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.options.shutdown_grace
    }

    /// Shared handle to the wrapped engine.
    pub fn engine(&self) -> Arc<E> {
        Arc::clone(&self.engine)
    }

    /// Serve until SIGINT or SIGTERM (Ctrl+C off unix), then shut down.
    ///
    /// See [`run_until`](Self::run_until) for the shutdown sequence.
    pub async fn run(self) -> Result<(), ServerError> {
        let err = self.err.clone();
        self.run_until(async move {
            match signals::wait_for_signal().await {
                Ok(signal) => {
                    tracing::info!(signal, "Received termination signal");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers, shutting down");
                    err.write_line(format!("error installing signal handlers: {}", e));
                }
            }
        })
        .await
    }

    /// Serve until `trigger` completes, then shut down.
    ///
    /// The engine is drained for at most the shutdown grace. If the drain
    /// times out or fails, the engine is closed; only a failed close is
    /// returned as an error. The serving task has always exited when this
    /// returns, and is aborted if this future is dropped early.
    pub async fn run_until<F>(self, trigger: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        self.run_with(trigger, std::future::pending()).await
    }

    /// Like [`run_until`](Self::run_until), with the drain also bounded by
    /// `cancel`.
    ///
    /// `cancel` plays the part of the caller's deadline: once it completes
    /// the drain is abandoned and the engine is closed. A future that is
    /// already complete skips the drain entirely.
    pub async fn run_with<F, C>(self, trigger: F, cancel: C) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
        C: Future<Output = ()> + Send,
    {
        let serving = self.spawn_serve();

        trigger.await;
        tracing::info!(
            address = %self.engine.addr(),
            grace = ?self.options.shutdown_grace,
            "Shutting down"
        );

        let result = self.shutdown(cancel).await;
        if result.is_err() {
            // The engine could not be killed, so its serve loop may never return.
            serving.abort();
        }
        serving.join().await;

        tracing::info!("Server stopped");
        result
    }

    fn spawn_serve(&self) -> ServeTask {
        let engine = Arc::clone(&self.engine);
        let out = self.out.clone();
        let err = self.err.clone();

        let handle = tokio::spawn(async move {
            out.write_line(format!("listening on {}...", engine.addr()));

            let error = match engine.serve().await {
                Ok(()) => EngineError::Closed,
                Err(e) => e,
            };

            match &error {
                EngineError::Closed => tracing::debug!("Serve loop stopped"),
                e => tracing::error!(error = %e, "Serve loop failed"),
            }
            err.write_line(&error);
        });
        ServeTask(Some(handle))
    }

    async fn shutdown<C>(&self, cancel: C) -> Result<(), ServerError>
    where
        C: Future<Output = ()> + Send,
    {
        let grace = self.options.shutdown_grace;

        let drained = tokio::select! {
            biased;
            _ = cancel => Err(DrainError::Cancelled),
            drained = tokio::time::timeout(grace, self.engine.shutdown()) => match drained {
                Ok(result) => result.map_err(DrainError::from),
                Err(elapsed) => Err(DrainError::from(elapsed)),
            },
        };

        let Err(e) = drained else {
            tracing::info!("Graceful shutdown complete");
            return Ok(());
        };

        tracing::warn!(grace = ?grace, error = %e, "Graceful shutdown failed, closing server");
        self.err
            .write_line(format!("shutdown timed out after {:?}: {}", grace, e));

        if let Err(e) = self.engine.close().await {
            tracing::error!(error = %e, "Failed to kill server");
            self.err.write_line(format!("error killing server: {}", e));
            return Err(ServerError::Kill(e));
        }

        Ok(())
    }
}

/// Options and sinks for a [`Server`]. Later calls override earlier ones.
#[derive(Debug, Clone)]
pub struct ServerBuilder {
    options: ServerOptions,
    out: Sink,
    err: Sink,
}

impl ServerBuilder {
    /// Default options, stdout for messages and stderr for errors.
    pub fn new() -> Self {
        Self {
            options: ServerOptions::default(),
            out: Sink::stdout(),
            err: Sink::stderr(),
        }
    }

    /// Builder seeded with the timeouts and limits from a config file.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            options: ServerOptions::from(config),
            ..Self::new()
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.options.write_timeout = timeout;
        self
    }

    /// How long in-flight requests may run after a shutdown signal.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.options.shutdown_grace = grace;
        self
    }

    pub fn with_max_header_bytes(mut self, bytes: usize) -> Self {
        self.options.max_header_bytes = bytes;
        self
    }

    /// Destination for non-error messages.
    pub fn with_output_sink<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.out = Sink::new(writer);
        self
    }

    /// Destination for every error the server produces.
    pub fn with_error_sink<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.err = Sink::new(writer);
        self
    }

    /// Build a server backed by [`HyperEngine`].
    pub fn build(self, addr: impl Into<String>, handler: Router) -> Server<HyperEngine> {
        let engine = HyperEngine::new(addr, handler, self.options);
        self.build_with_engine(engine)
    }

    /// Build a server around any engine.
    pub fn build_with_engine<E: ServingEngine>(self, engine: E) -> Server<E> {
        Server {
            engine: Arc::new(engine),
            options: self.options,
            out: self.out,
            err: self.err,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let server = Server::new(":8080", Router::new());

        assert_eq!(server.addr(), ":8080");
        assert_eq!(server.read_timeout(), Duration::from_secs(5));
        assert_eq!(server.write_timeout(), Duration::from_secs(10));
        assert_eq!(server.max_header_bytes(), 1 << 20);
        assert_eq!(server.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn read_timeout_override() {
        let server = Server::builder()
            .with_read_timeout(Duration::from_secs(10))
            .build(":8080", Router::new());

        assert_eq!(server.read_timeout(), Duration::from_secs(10));
        assert_eq!(server.write_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn every_option_is_settable() {
        let server = Server::builder()
            .with_read_timeout(Duration::from_secs(1))
            .with_write_timeout(Duration::from_secs(2))
            .with_shutdown_grace(Duration::from_secs(3))
            .with_max_header_bytes(4096)
            .with_output_sink(std::io::sink())
            .with_error_sink(std::io::sink())
            .build("127.0.0.1:0", Router::new());

        assert_eq!(
            *server.options(),
            ServerOptions {
                read_timeout: Duration::from_secs(1),
                write_timeout: Duration::from_secs(2),
                max_header_bytes: 4096,
                shutdown_grace: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn later_option_wins() {
        let server = Server::builder()
            .with_shutdown_grace(Duration::from_secs(1))
            .with_read_timeout(Duration::from_secs(7))
            .with_shutdown_grace(Duration::from_millis(250))
            .build(":8080", Router::new());

        assert_eq!(server.shutdown_grace(), Duration::from_millis(250));
        assert_eq!(server.read_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn builder_from_config() {
        let config = ServerConfig {
            bind_address: "127.0.0.1:9000".into(),
            read_timeout_secs: 2,
            ..ServerConfig::default()
        };

        let server = ServerBuilder::from_config(&config)
            .with_write_timeout(Duration::ZERO)
            .build(config.bind_address.clone(), Router::new());

        assert_eq!(server.addr(), "127.0.0.1:9000");
        assert_eq!(server.read_timeout(), Duration::from_secs(2));
        assert_eq!(server.write_timeout(), Duration::ZERO);
        assert_eq!(server.shutdown_grace(), Duration::from_secs(5));
    }
}
