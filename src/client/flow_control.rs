// ABOUTME: Token bucket rate limiting for outbound requests
// ABOUTME: Backs off the sending rate when the SMSC answers with throttling errors

use crate::datatypes::CommandStatus;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Slowest configurable rate (messages per second).
pub const MIN_RATE: f64 = 0.01;
/// Longest single sleep before the bucket is checked again.
const MAX_WAIT: Duration = Duration::from_secs(100);

/// Token bucket limiter shared by every caller of a session.
///
/// Each request takes one token before it is given a sequence number. Tokens
/// refill continuously at the current rate up to `burst`.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<Bucket>,
    min_rate: f64,
}

#[derive(Debug)]
struct Bucket {
    /// Current rate (messages per second)
    rate: f64,
    /// Bucket size
    burst: f64,
    tokens: f64,
    last_refill: Instant,
    /// Rate cuts caused by throttling responses
    throttled: u64,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Allow `rate` messages per second with bursts of up to `burst`.
    ///
    /// Rates below [`MIN_RATE`], and NaN, run at [`MIN_RATE`].
    pub fn new(rate: f64, burst: u32) -> Self {
        let rate = if rate.is_nan() || rate < MIN_RATE {
            warn!(rate, min = MIN_RATE, "rate limit too low, using minimum");
            MIN_RATE
        } else {
            rate.min(f64::MAX)
        };
        let burst = f64::from(burst.max(1));
        Self {
            state: Mutex::new(Bucket {
                rate,
                burst,
                tokens: burst,
                last_refill: Instant::now(),
                throttled: 0,
            }),
            min_rate: rate / 10.0,
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.state.lock().await;
                bucket.refill(Instant::now());
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / bucket.rate)
                    .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Adjust the rate after a response with `status`.
    ///
    /// Throttling responses cut the rate, never below a tenth of the
    /// configured rate.
    pub async fn on_response(&self, status: CommandStatus) {
        let factor = match status {
            CommandStatus::ThrottlingError => 0.9,
            CommandStatus::MessageQueueFull => 0.8,
            _ => return,
        };
        let mut bucket = self.state.lock().await;
        bucket.rate = (bucket.rate * factor).max(self.min_rate);
        bucket.throttled += 1;
        debug!(rate = bucket.rate, %status, "rate reduced");
    }

    /// Current rate (messages per second)
    pub async fn current_rate(&self) -> f64 {
        self.state.lock().await.rate
    }

    pub async fn throttled(&self) -> u64 {
        self.state.lock().await.throttled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_is_immediate() {
        let limiter = RateLimiter::new(1.0, 3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_waits_for_refill() {
        let limiter = RateLimiter::new(10.0, 1);
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(90), "waited {waited:?}");
    }

    #[tokio::test]
    async fn test_throttling_reduces_rate() {
        let limiter = RateLimiter::new(100.0, 10);
        limiter.on_response(CommandStatus::Ok).await;
        assert_eq!(limiter.current_rate().await, 100.0);

        limiter.on_response(CommandStatus::ThrottlingError).await;
        assert!((limiter.current_rate().await - 90.0).abs() < 1e-9);
        assert_eq!(limiter.throttled().await, 1);

        for _ in 0..100 {
            limiter.on_response(CommandStatus::ThrottlingError).await;
        }
        assert!((limiter.current_rate().await - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unusable_rates_fall_back_to_minimum() {
        for rate in [0.0, -5.0, f64::NAN, f64::NEG_INFINITY] {
            let limiter = RateLimiter::new(rate, 1);
            assert_eq!(limiter.current_rate().await, MIN_RATE, "rate {rate}");

            limiter.acquire().await;
            // The second token is far away; waiting for it must not panic.
            let second = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
            assert!(second.is_err());
        }
    }
}
