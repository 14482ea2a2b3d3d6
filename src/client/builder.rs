// ABOUTME: Session configuration and the builder that assembles it
// ABOUTME: Defaults match common SMSC expectations; every setting can be overridden fluently

use crate::client::flow_control::RateLimiter;
use crate::client::keepalive::KeepAliveConfig;
use crate::client::session::Session;
use crate::client::traits::Handler;
use crate::client::types::BindCredentials;
use crate::connection::TlsConfig;
use crate::macros::builder_setters;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default SMPP port
pub const DEFAULT_PORT: u16 = 2775;

/// Everything a [`Session`] needs to connect, bind and stay bound.
#[derive(Clone)]
pub struct SessionConfig {
    /// `host:port` of the SMSC
    pub address: String,
    pub tls: Option<TlsConfig>,
    pub credentials: BindCredentials,
    pub keepalive: KeepAliveConfig,
    /// How long a request waits for its response
    pub response_timeout: Duration,
    /// How long a bind waits for its response
    pub bind_timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum requests awaiting responses; zero means unlimited
    pub window: usize,
    /// Status events buffered before new ones are dropped
    pub status_capacity: usize,
    /// Unsolicited PDUs buffered for the handler before new ones are dropped
    pub handler_queue: usize,
    pub handler: Option<Arc<dyn Handler>>,
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("address", &self.address)
            .field("tls", &self.tls)
            .field("system_id", &self.credentials.system_id)
            .field("bind_type", &self.credentials.bind_type)
            .field("keepalive", &self.keepalive)
            .field("response_timeout", &self.response_timeout)
            .field("bind_timeout", &self.bind_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("window", &self.window)
            .field("handler", &self.handler.is_some())
            .field("rate_limiter", &self.rate_limiter.is_some())
            .finish()
    }
}

/// Builder for [`SessionConfig`].
///
/// ```no_run
/// # async fn demo() {
/// use smpp_session::client::{BindCredentials, SessionBuilder};
/// use std::time::Duration;
///
/// let session = SessionBuilder::new("127.0.0.1:2775", BindCredentials::transceiver("client", "secret"))
///     .response_timeout(Duration::from_secs(5))
///     .window(10)
///     .bind();
/// # }
/// ```
pub struct SessionBuilder {
    address: String,
    tls: Option<TlsConfig>,
    credentials: BindCredentials,
    keepalive: KeepAliveConfig,
    response_timeout: Duration,
    bind_timeout: Duration,
    connect_timeout: Duration,
    window: usize,
    status_capacity: usize,
    handler_queue: usize,
    handler: Option<Arc<dyn Handler>>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl SessionBuilder {
    pub fn new(address: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            address: address.into(),
            tls: None,
            credentials,
            keepalive: KeepAliveConfig::default(),
            response_timeout: Duration::from_secs(1),
            bind_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            window: 0,
            status_capacity: 16,
            handler_queue: 64,
            handler: None,
            rate_limiter: None,
        }
    }

    builder_setters! {
        keepalive: KeepAliveConfig,
        response_timeout: Duration,
        bind_timeout: Duration,
        connect_timeout: Duration,
        window: usize,
        status_capacity: usize,
        handler_queue: usize,
    }

    /// Dial over TLS.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Send enquire_link every `interval`, raised to at least ten seconds.
    pub fn enquire_link_interval(mut self, interval: Duration) -> Self {
        self.keepalive = KeepAliveConfig::new(interval);
        self
    }

    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Limit outbound requests to `rate` per second with bursts of `burst`.
    pub fn rate_limit(mut self, rate: f64, burst: u32) -> Self {
        self.rate_limiter = Some(Arc::new(RateLimiter::new(rate, burst)));
        self
    }

    pub fn build(self) -> SessionConfig {
        let mut keepalive = self.keepalive;
        keepalive.interval = keepalive.interval.max(crate::client::keepalive::MIN_INTERVAL);
        SessionConfig {
            address: self.address,
            tls: self.tls,
            credentials: self.credentials,
            keepalive,
            response_timeout: self.response_timeout,
            bind_timeout: self.bind_timeout,
            connect_timeout: self.connect_timeout,
            window: self.window,
            status_capacity: self.status_capacity.max(1),
            handler_queue: self.handler_queue.max(1),
            handler: self.handler,
            rate_limiter: self.rate_limiter,
        }
    }

    /// Build the configuration and start binding. Must run inside a Tokio
    /// runtime.
    pub fn bind(self) -> Session {
        Session::bind(self.build())
    }
}
