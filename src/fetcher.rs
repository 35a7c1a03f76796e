//! Per-station price lookup with bounded exponential backoff
//!
//! Only [`PumpwatchError::RateLimited`] is retried. The wait after attempt
//! `n` (zero based) is `base_delay * 2^n`, and a backoff wait follows every
//! rate-limited attempt, so five throttled attempts wait 1, 2, 4, 8 and 16
//! seconds before the station is reported as `RetriesExhausted`.

use crate::clock::Clock;
use crate::config::FetchConfig;
use crate::error::{PumpwatchError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::provider::RemoteProvider;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Retry bounds for one station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed while the provider keeps rate limiting
    pub max_retries: u32,
    /// Wait after the first rate-limited attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base())
    }

    /// Backoff wait after the given zero-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// All backoff waits of a fully rate-limited station, in order
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|a| self.delay_for(a)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Wraps [`RemoteProvider::price_lookup`] with rate-limit aware retries
pub struct RetryingFetcher {
    provider: Arc<dyn RemoteProvider>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    logger: StructuredLogger,
}

impl RetryingFetcher {
    pub fn new(
        provider: Arc<dyn RemoteProvider>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            clock,
            policy,
            logger: get_logger("fetcher"),
        }
    }

    /// Fetch the raw quote payload for one station
    ///
    /// Non rate-limit errors are returned immediately without retrying.
    pub async fn fetch(&self, station_id: &str) -> Result<Value> {
        let logger = self.logger.for_station(station_id);
        let max = self.policy.max_retries;

        for attempt in 0..max {
            logger.debug(&format!("Price lookup attempt {}/{}", attempt + 1, max));
            match self.provider.price_lookup(station_id).await {
                Ok(payload) => {
                    logger.debug(&format!("Response: {}", payload));
                    return Ok(payload);
                }
                Err(e) if e.is_rate_limited() => {
                    let wait = self.policy.delay_for(attempt);
                    logger.warn(&format!(
                        "Rate limit hit ({}). Retrying in {:.1} seconds",
                        e,
                        wait.as_secs_f64()
                    ));
                    self.clock.sleep(wait).await;
                }
                Err(e) => {
                    logger.error(&format!("Failed to fetch prices: {}", e));
                    return Err(e);
                }
            }
        }

        logger.error(&format!("Max retries ({}) exceeded", max));
        Err(PumpwatchError::retries_exhausted(station_id, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::model::Coordinate;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with queued errors, then succeeds
    struct Scripted {
        errors: Mutex<Vec<PumpwatchError>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut errors: Vec<PumpwatchError>) -> Self {
            errors.reverse();
            Self {
                errors: Mutex::new(errors),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl RemoteProvider for Scripted {
        async fn location_search(&self, _coordinate: Coordinate) -> Result<Value> {
            Ok(json!({}))
        }

        async fn price_lookup(&self, station_id: &str) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.errors.lock().unwrap().pop() {
                Some(e) => Err(e),
                None => Ok(json!({ "station_id": station_id })),
            }
        }
    }

    fn clock() -> Arc<VirtualClock> {
        Arc::new(VirtualClock::new(
            chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn delay_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            [1, 2, 4, 8, 16].map(Duration::from_secs).to_vec()
        );
        for attempt in 0..10 {
            assert_eq!(
                policy.delay_for(attempt + 1),
                policy.delay_for(attempt) * 2
            );
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_rate_limit() {
        let provider = Arc::new(Scripted::new(vec![
            PumpwatchError::rate_limited("429"),
            PumpwatchError::rate_limited("429"),
        ]));
        let clock = clock();
        let fetcher =
            RetryingFetcher::new(provider.clone(), clock.clone(), RetryPolicy::default());

        let payload = fetcher.fetch("A").await.unwrap();
        assert_eq!(payload["station_id"], "A");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let provider = Arc::new(Scripted::new(vec![PumpwatchError::network("reset")]));
        let clock = clock();
        let fetcher =
            RetryingFetcher::new(provider.clone(), clock.clone(), RetryPolicy::default());

        let err = fetcher.fetch("A").await.unwrap_err();
        assert!(matches!(err, PumpwatchError::Network { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(clock.sleeps().is_empty());
    }
}
