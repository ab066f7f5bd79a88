//! Request Throttle
//!
//! Serializes outbound requests and spaces their start times by a minimum
//! interval. Public geocoders such as Nominatim allow at most one request
//! per second from a single client.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Throttle configuration.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum time between the start of two requests
    pub min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(1000),
        }
    }
}

/// One-at-a-time request throttle.
///
/// At most one scheduled future runs at any moment, and consecutive
/// futures start at least `min_interval` apart.
pub struct RequestThrottle {
    config: ThrottleConfig,
    /// Start time of the most recently scheduled request
    last_start: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Create a new throttle.
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            last_start: Mutex::new(None),
        }
    }

    /// Run `task` once the throttle allows it.
    ///
    /// The slot is held until `task` completes, so a slow request delays
    /// the next one rather than overlapping with it.
    pub async fn schedule<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last_start = self.last_start.lock().await;

        if let Some(prev) = *last_start {
            let ready_at = prev + self.config.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::trace!("throttle: waiting {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_start = Some(Instant::now());
        task.await
    }

    /// Minimum interval between request starts.
    pub fn min_interval(&self) -> Duration {
        self.config.min_interval
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn throttle(ms: u64) -> RequestThrottle {
        RequestThrottle::new(ThrottleConfig {
            min_interval: Duration::from_millis(ms),
        })
    }

    #[test]
    fn test_throttle_config_default() {
        let config = ThrottleConfig::default();
        assert_eq!(config.min_interval, Duration::from_secs(1));
        assert_eq!(RequestThrottle::default().min_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_first_request_runs_immediately() {
        let throttle = throttle(500);
        let start = Instant::now();

        let value = throttle.schedule(async { 42 }).await;

        assert_eq!(value, 42);
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced() {
        let throttle = throttle(50);
        let start = Instant::now();

        for _ in 0..3 {
            throttle.schedule(async {}).await;
        }

        // Three starts, two gaps
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_wait() {
        let throttle = throttle(0);
        let start = Instant::now();

        for _ in 0..10 {
            throttle.schedule(async {}).await;
        }

        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_requests_never_overlap() {
        let throttle = Arc::new(throttle(0));
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let throttle = throttle.clone();
            let active = active.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                throttle
                    .schedule(async {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
        }

        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
