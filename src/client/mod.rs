//! Outbound HTTP client with a default timeout.
//!
//! reqwest applies no total timeout unless asked to; [`Client`] always
//! starts from [`DEFAULT_TIMEOUT`].

mod transport;

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::CookieStore;
use reqwest::redirect;
use reqwest::Url;

use crate::config::ClientConfig;

pub use transport::Transport;

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Error a redirect check returns to refuse a redirect.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for client construction.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// A `reqwest::Client` that remembers its configured timeout.
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    timeout: Duration,
}

impl Client {
    /// Client with the default timeout.
    ///
    /// # Panics
    /// Panics if the TLS backend cannot be initialized, like `reqwest::Client::new`.
    /// Use [`Client::builder`] to handle the failure.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .unwrap_or_else(|e| panic!("failed to build default HTTP client: {}", e))
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Total request timeout; zero means none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn into_inner(self) -> reqwest::Client {
        self.inner
    }
}

/// Panics under the same conditions as [`Client::new`].
impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Client {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Options for a [`Client`]. Later calls override earlier ones; nothing is validated.
#[derive(Debug)]
pub struct ClientBuilder {
    inner: reqwest::ClientBuilder,
    timeout: Duration,
    transport: Option<Transport>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::builder(),
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    /// Builder seeded from a config file.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new().with_timeout(Duration::from_secs(config.timeout_secs));
        builder.transport = Transport::from_config(config);
        builder
    }

    /// Total request timeout. Zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the connection strategy.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Decide on each redirect. `check` gets the next URL and the URLs
    /// already visited; returning an error aborts the request with it.
    pub fn with_check_redirect<F>(mut self, check: F) -> Self
    where
        F: Fn(&Url, &[Url]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let policy = redirect::Policy::custom(move |attempt| {
            match check(attempt.url(), attempt.previous()) {
                Ok(()) => attempt.follow(),
                Err(e) => attempt.error(e),
            }
        });
        self.inner = self.inner.redirect(policy);
        self
    }

    /// Use one of reqwest's built-in redirect policies.
    pub fn with_redirect_policy(mut self, policy: redirect::Policy) -> Self {
        self.inner = self.inner.redirect(policy);
        self
    }

    /// Store and send cookies through `jar`.
    pub fn with_cookie_jar<C>(mut self, jar: Arc<C>) -> Self
    where
        C: CookieStore + 'static,
    {
        self.inner = self.inner.cookie_provider(jar);
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let mut inner = self.inner;
        if !self.timeout.is_zero() {
            inner = inner.timeout(self.timeout);
        }
        if let Some(transport) = self.transport {
            inner = transport.apply(inner);
        }

        let client = inner.build()?;
        tracing::debug!(timeout = ?self.timeout, "HTTP client built");

        Ok(Client {
            inner: client,
            timeout: self.timeout,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
