//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use steady_http::client::{Client, Transport};
use steady_http::http::{EngineError, HyperEngine, ServingEngine};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// An in-memory sink whose contents tests can read back.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// How a [`MockEngine`] drains on shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub enum Drain {
    /// Stop serving and return at once.
    #[default]
    Immediate,
    /// Never finish, like a handler that outlives any deadline.
    Hang,
    /// Fail without stopping.
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub bind_error: bool,
    pub drain: Drain,
    pub close_error: bool,
}

/// Scriptable engine recording which lifecycle calls the supervisor made.
pub struct MockEngine {
    addr: String,
    behavior: Behavior,
    stop: watch::Sender<bool>,
    pub serve_started: AtomicBool,
    pub serve_exited: AtomicBool,
    pub shutdown_calls: AtomicUsize,
    pub closed: AtomicBool,
}

impl MockEngine {
    pub fn new(addr: &str, behavior: Behavior) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            addr: addr.to_string(),
            behavior,
            stop,
            serve_started: AtomicBool::new(false),
            serve_exited: AtomicBool::new(false),
            shutdown_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn serve_exited(&self) -> bool {
        self.serve_exited.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Marks the serve loop as exited however its future ends, abort included.
struct ExitGuard<'a>(&'a AtomicBool);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ServingEngine for MockEngine {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn serve(&self) -> Result<(), EngineError> {
        let _exit = ExitGuard(&self.serve_exited);
        self.serve_started.store(true, Ordering::SeqCst);

        if self.behavior.bind_error {
            return Err(EngineError::Bind {
                addr: self.addr.clone(),
                source: io::Error::new(io::ErrorKind::AddrInUse, "address already in use"),
            });
        }

        let mut stop = self.stop.subscribe();
        let _ = stop.wait_for(|stopped| *stopped).await;
        Err(EngineError::Closed)
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior.drain {
            Drain::Immediate => {
                self.stop.send_replace(true);
                Ok(())
            }
            Drain::Hang => std::future::pending().await,
            Drain::Fail => Err(EngineError::Close("drain interrupted".into())),
        }
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.behavior.close_error {
            return Err(EngineError::Close("connection stuck".into()));
        }
        self.stop.send_replace(true);
        Ok(())
    }
}

/// Wait until a hyper engine has bound its listener.
pub async fn wait_for_local_addr(engine: &HyperEngine) -> SocketAddr {
    for _ in 0..200 {
        if let Some(addr) = engine.local_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("engine never bound its listener");
}

/// Serve `app` on an ephemeral port for the rest of the test.
pub async fn start_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// A client that ignores proxy environment variables.
pub fn test_client(timeout: Duration) -> Client {
    Client::builder()
        .with_timeout(timeout)
        .with_transport(Transport::new().no_proxy().pool_max_idle_per_host(0))
        .build()
        .unwrap()
}
