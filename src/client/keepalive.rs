// ABOUTME: Enquire-link keepalive for bound sessions: periodic pings and a response watchdog
// ABOUTME: Runs as one task per connection and reports the failure that should end the connection

use crate::client::error::SmppError;
use crate::client::session::SequenceCounter;
use crate::connection::ConnectionWriter;
use crate::datatypes::CommandId;
use crate::pdu::Pdu;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, interval_at, timeout};
use tracing::{debug, warn};

/// Shortest interval accepted between enquire_link PDUs.
pub const MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Keep-alive configuration
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs
    pub interval: Duration,
    /// How long to wait for enquire_link_resp before reconnecting
    pub timeout: Duration,
    /// Whether keep-alive is enabled
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self::new(MIN_INTERVAL)
    }
}

impl KeepAliveConfig {
    /// Create a new keep-alive config with custom interval.
    ///
    /// Intervals under ten seconds are raised to ten seconds. The response
    /// timeout defaults to half the interval.
    pub fn new(interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            timeout: interval / 2,
            enabled: true,
        }
    }

    /// Set the response timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable keep-alive
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Counters shared between the keepalive task and the session.
#[derive(Debug, Default)]
pub struct KeepAliveStats {
    pings: AtomicU64,
    pongs: AtomicU64,
    failures: AtomicU32,
}

impl KeepAliveStats {
    pub(crate) fn record_pong(&self) {
        self.pongs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> KeepAliveStatus {
        KeepAliveStatus {
            total_pings: self.pings.load(Ordering::Relaxed),
            total_pongs: self.pongs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Keep-alive statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeepAliveStatus {
    /// enquire_link PDUs sent
    pub total_pings: u64,
    /// enquire_link_resp PDUs received
    pub total_pongs: u64,
    /// Connections dropped because a response did not arrive
    pub failures: u32,
}

/// Ping the peer until the connection should be dropped.
///
/// `pongs` ticks whenever the reader sees an enquire_link_resp. The returned
/// error is why the connection is no longer usable.
pub(crate) async fn run(
    config: KeepAliveConfig,
    writer: Arc<ConnectionWriter>,
    sequence: Arc<SequenceCounter>,
    stats: Arc<KeepAliveStats>,
    mut pongs: watch::Receiver<u64>,
) -> SmppError {
    if !config.enabled {
        return std::future::pending().await;
    }

    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    loop {
        ticker.tick().await;

        // Anything seen before this ping does not answer it.
        pongs.borrow_and_update();

        let mut ping = Pdu::new(CommandId::EnquireLink);
        ping.set_sequence(sequence.next());
        if let Err(e) = writer.write_pdu(&ping).await {
            return e;
        }
        let total = stats.pings.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Enquire_link sent (total: {})", total);

        match timeout(config.timeout, pongs.changed()).await {
            Ok(Ok(())) => debug!(seq = ping.sequence(), "Enquire_link_resp received"),
            Ok(Err(_)) => return SmppError::ConnectionClosed,
            Err(_) => {
                stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    timeout_ms = config.timeout.as_millis() as u64,
                    "no enquire_link_resp, dropping connection"
                );
                return SmppError::EnquireLinkTimeout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_floored() {
        let config = KeepAliveConfig::new(Duration::from_secs(2));
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(5));

        let config = KeepAliveConfig::new(Duration::from_secs(60));
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.enabled);
    }

    #[test]
    fn test_disabled_config() {
        let config = KeepAliveConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.interval, MIN_INTERVAL);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = KeepAliveStats::default();
        stats.record_pong();
        stats.record_pong();
        let status = stats.snapshot();
        assert_eq!(status.total_pongs, 2);
        assert_eq!(status.total_pings, 0);
        assert_eq!(status.failures, 0);
    }
}
