//! Connection strategy for outbound clients.

use std::time::Duration;

use crate::config::ClientConfig;

/// How a [`Client`](super::Client) opens and pools connections.
///
/// Unset fields keep reqwest's defaults.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    connect_timeout: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    tcp_nodelay: Option<bool>,
    proxy: Option<reqwest::Proxy>,
    no_proxy: bool,
    http1_only: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport described by a config file, if it sets anything.
    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        let transport = Self {
            connect_timeout: config.connect_timeout_secs.map(Duration::from_secs),
            pool_idle_timeout: config.pool_idle_timeout_secs.map(Duration::from_secs),
            no_proxy: config.no_proxy,
            http1_only: config.http1_only,
            ..Self::default()
        };

        let configured = transport.connect_timeout.is_some()
            || transport.pool_idle_timeout.is_some()
            || transport.no_proxy
            || transport.http1_only;
        configured.then_some(transport)
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Zero disables connection reuse.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = Some(enabled);
        self
    }

    /// Route requests through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Ignore proxies from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn http1_only(mut self) -> Self {
        self.http1_only = true;
        self
    }

    pub(crate) fn apply(self, mut builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(timeout);
        }
        if let Some(max) = self.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }
        if let Some(enabled) = self.tcp_nodelay {
            builder = builder.tcp_nodelay(enabled);
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }
        if let Some(proxy) = self.proxy {
            builder = builder.proxy(proxy);
        }
        if self.http1_only {
            builder = builder.http1_only();
        }
        builder
    }
}
