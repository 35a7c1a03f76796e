//! Time source and delay primitive used for all pacing
//!
//! Every wait in the pipeline (backoff, station spacing, discovery settling,
//! coordinate cooldown) goes through [`Clock::sleep`], so pacing policies can
//! be exercised against a [`VirtualClock`] without wall-clock waits.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[derive(Debug)]
struct VirtualState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

/// Clock that never blocks: sleeping advances `now` and is recorded
#[derive(Debug)]
pub struct VirtualClock {
    state: Mutex<VirtualState>,
}

impl VirtualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(VirtualState {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Every sleep requested so far, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .map(|s| s.sleeps.clone())
            .unwrap_or_default()
    }

    /// Sum of all requested sleeps
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait::async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.state.lock() {
            Ok(s) => s.now,
            Err(poisoned) => poisoned.into_inner().now,
        }
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.sleeps.push(duration);
            if let Ok(delta) = chrono::Duration::from_std(duration) {
                s.now += delta;
            }
        }
        // Let other tasks run as they would during a real wait
        tokio::task::yield_now().await;
    }
}
