//! Serving engines supervised by [`Server`](crate::http::Server).
//!
//! # Responsibilities
//! - Define the lifecycle contract the supervisor drives (serve, shutdown, close)
//! - Provide the default hyper-backed engine
//!
//! # Design Decisions
//! - The engine owns the listening socket and every connection; the
//!   supervisor only calls lifecycle methods
//! - `shutdown` is unbounded; deadlines belong to the caller
//! - Connections live in a `JoinSet` so `close` can abort them

use std::io;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::http::options::ServerOptions;

/// Hyper refuses read buffers smaller than this.
const MIN_BUF_SIZE: usize = 8192;

/// Error type for engine lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The serve loop stopped because of shutdown or close.
    #[error("server closed")]
    Closed,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to close server: {0}")]
    Close(String),
}

/// A request-serving engine with an explicit lifecycle.
#[async_trait]
pub trait ServingEngine: Send + Sync + 'static {
    /// Address the engine was configured to listen on.
    fn addr(&self) -> &str;

    /// Run the accept loop until the engine is shut down or closed.
    ///
    /// Never returns `Ok` for a stop caused by `shutdown` or `close`; those
    /// end with [`EngineError::Closed`].
    async fn serve(&self) -> Result<(), EngineError>;

    /// Stop accepting connections and wait for in-flight ones to finish.
    async fn shutdown(&self) -> Result<(), EngineError>;

    /// Stop accepting connections and abort in-flight ones.
    async fn close(&self) -> Result<(), EngineError>;
}

/// Default engine: hyper HTTP/1 and HTTP/2 connections dispatched to an axum router.
pub struct HyperEngine {
    addr: String,
    service: Router,
    options: ServerOptions,
    stop: watch::Sender<bool>,
    state: Mutex<EngineState>,
}

struct EngineState {
    started: bool,
    local_addr: Option<SocketAddr>,
    graceful: Option<GracefulShutdown>,
    connections: JoinSet<()>,
}

impl HyperEngine {
    /// Create an engine for `addr`. Nothing is bound until [`serve`](ServingEngine::serve).
    #[allow(deprecated)]
    pub fn new(addr: impl Into<String>, handler: Router, options: ServerOptions) -> Self {
        let mut service = handler;
        if !options.write_timeout.is_zero() {
            service = service.layer(TimeoutLayer::new(options.write_timeout));
        }
        let service = service.layer(TraceLayer::new_for_http());

        let (stop, _) = watch::channel(false);

        Self {
            addr: addr.into(),
            service,
            options,
            stop,
            state: Mutex::new(EngineState {
                started: false,
                local_addr: None,
                graceful: Some(GracefulShutdown::new()),
                connections: JoinSet::new(),
            }),
        }
    }

    /// The socket address actually bound, once serving has started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_state().local_addr
    }

    /// Number of connection tasks not yet reaped.
    pub fn connection_count(&self) -> usize {
        self.lock_state().connections.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection_builder(&self) -> Builder<TokioExecutor> {
        let mut builder = Builder::new(TokioExecutor::new());
        {
            let mut http1 = builder.http1();
            http1
                .timer(TokioTimer::new())
                .max_buf_size(self.options.max_header_bytes.max(MIN_BUF_SIZE))
                .header_read_timeout(header_read_timeout(&self.options));
        }
        builder.http2().timer(TokioTimer::new());
        builder
    }

    fn spawn_connection(
        &self,
        builder: &Builder<TokioExecutor>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) {
        let mut state = self.lock_state();

        // Reap finished connections so the set only holds live ones.
        while state.connections.try_join_next().is_some() {}

        let Some(graceful) = state.graceful.as_ref() else {
            tracing::debug!(peer_addr = %peer_addr, "Dropping connection accepted during shutdown");
            return;
        };

        let watcher = graceful.watcher();
        let builder = builder.clone();
        let io = TokioIo::new(stream);
        let service = TowerToHyperService::new(self.service.clone());

        tracing::trace!(peer_addr = %peer_addr, "Connection accepted");

        state.connections.spawn(async move {
            let conn = builder.serve_connection_with_upgrades(io, service);
            if let Err(e) = watcher.watch(conn).await {
                tracing::debug!(peer_addr = %peer_addr, error = %e, "Error serving connection");
            }
        });
    }
}

#[async_trait]
impl ServingEngine for HyperEngine {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn serve(&self) -> Result<(), EngineError> {
        let mut stop = self.stop.subscribe();
        {
            let mut state = self.lock_state();
            if state.started || *stop.borrow() {
                return Err(EngineError::Closed);
            }
            state.started = true;
        }

        let bind_error = |source| EngineError::Bind {
            addr: self.addr.clone(),
            source,
        };
        let listener = TcpListener::bind(resolve_bind_address(&self.addr))
            .await
            .map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        self.lock_state().local_addr = Some(local_addr);

        tracing::info!(
            address = %local_addr,
            read_timeout = ?self.options.read_timeout,
            write_timeout = ?self.options.write_timeout,
            max_header_bytes = self.options.max_header_bytes,
            "Listener bound"
        );

        let builder = self.connection_builder();

        loop {
            let (stream, peer_addr) = tokio::select! {
                biased;
                _ = stopped(&mut stop) => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) if is_connection_error(&e) => {
                        tracing::debug!(error = %e, "Ignoring connection error during accept");
                        continue;
                    }
                    Err(e) => return Err(EngineError::Accept(e)),
                },
            };

            self.spawn_connection(&builder, stream, peer_addr);
        }

        drop(listener);
        tracing::debug!(address = %local_addr, "Listener closed");
        Err(EngineError::Closed)
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.stop.send_replace(true);

        let graceful = self.lock_state().graceful.take();
        if let Some(graceful) = graceful {
            tracing::debug!(connections = graceful.count(), "Draining connections");
            graceful.shutdown().await;
            tracing::debug!("All connections drained");
        }

        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.stop.send_replace(true);

        let mut connections = {
            let mut state = self.lock_state();
            state.graceful.take();
            std::mem::take(&mut state.connections)
        };

        let aborted = connections.len();
        connections.abort_all();
        while let Some(result) = connections.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::warn!(error = %e, "Connection task panicked");
                }
            }
        }

        tracing::info!(aborted, "Connections aborted");
        Ok(())
    }
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// `":8080"` listens on all interfaces, an empty address on port 80.
fn resolve_bind_address(addr: &str) -> String {
    if addr.is_empty() {
        "0.0.0.0:80".to_string()
    } else if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Zero disables the header read timeout instead of leaving hyper's default.
fn header_read_timeout(options: &ServerOptions) -> Option<Duration> {
    Some(options.read_timeout).filter(|timeout| !timeout.is_zero())
}

/// Per-connection failures that should not stop the accept loop.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
