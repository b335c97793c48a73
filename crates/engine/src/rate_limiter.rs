// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requeue delay policies for the reconcile queue

use crate::config::ControllerConfig;
use infra_core::{Clock, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Anything usable as a reconcile queue key
pub trait QueueKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> QueueKey for T {}

/// Decides how long a key waits before it is retried
pub trait RateLimiter<K>: Send + Sync + 'static {
    /// Delay before the next retry of `key`. Counts as one failure.
    fn when(&self, key: &K) -> Duration;

    /// Stop tracking `key`; its failure count resets.
    fn forget(&self, key: &K);

    /// Failures recorded for `key` since it was last forgotten
    fn num_requeues(&self, key: &K) -> u32;
}

/// Per-key exponential backoff: `base * 2^failures`, capped at `max`
pub struct ExponentialFailureRateLimiter<K> {
    base: Duration,
    max: Duration,
    failures: Mutex<HashMap<K, u32>>,
}

impl<K: QueueKey> ExponentialFailureRateLimiter<K> {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: QueueKey> RateLimiter<K> for ExponentialFailureRateLimiter<K> {
    fn when(&self, key: &K) -> Duration {
        let mut failures = self.failures.lock();
        let count = failures.entry(key.clone()).or_insert(0);
        let exp = *count;
        *count = count.saturating_add(1);

        match 2u32.checked_pow(exp).and_then(|f| self.base.checked_mul(f)) {
            Some(backoff) if backoff < self.max => backoff,
            _ => self.max,
        }
    }

    fn forget(&self, key: &K) {
        self.failures.lock().remove(key);
    }

    fn num_requeues(&self, key: &K) -> u32 {
        self.failures.lock().get(key).copied().unwrap_or(0)
    }
}

struct Bucket {
    tokens: f64,
    last: Instant,
}

/// Overall token bucket shared by every key.
///
/// Each call reserves one token; when the bucket is empty the delay is how
/// long the reservation takes to refill.
pub struct BucketRateLimiter<C: Clock = SystemClock> {
    qps: f64,
    burst: f64,
    clock: C,
    bucket: Mutex<Bucket>,
}

impl<C: Clock> BucketRateLimiter<C> {
    pub fn new(qps: f64, burst: u32, clock: C) -> Self {
        let now = clock.now();
        Self {
            qps,
            burst: f64::from(burst),
            clock,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(burst),
                last: now,
            }),
        }
    }
}

impl<K: QueueKey, C: Clock> RateLimiter<K> for BucketRateLimiter<C> {
    fn when(&self, _key: &K) -> Duration {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock();
        let elapsed = now.saturating_duration_since(bucket.last).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.qps).min(self.burst);
        bucket.last = now;
        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 || self.qps <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((-bucket.tokens / self.qps * 1e9).round() as u64)
    }

    fn forget(&self, _key: &K) {}

    fn num_requeues(&self, _key: &K) -> u32 {
        0
    }
}

/// Combines limiters: the longest delay wins
pub struct MaxOfRateLimiter<K> {
    limiters: Vec<Box<dyn RateLimiter<K>>>,
}

impl<K: QueueKey> MaxOfRateLimiter<K> {
    pub fn new(limiters: Vec<Box<dyn RateLimiter<K>>>) -> Self {
        Self { limiters }
    }
}

impl<K: QueueKey> RateLimiter<K> for MaxOfRateLimiter<K> {
    fn when(&self, key: &K) -> Duration {
        // Every limiter is consulted so each records the failure
        self.limiters
            .iter()
            .map(|l| l.when(key))
            .fold(Duration::ZERO, Duration::max)
    }

    fn forget(&self, key: &K) {
        for limiter in &self.limiters {
            limiter.forget(key);
        }
    }

    fn num_requeues(&self, key: &K) -> u32 {
        self.limiters
            .iter()
            .map(|l| l.num_requeues(key))
            .max()
            .unwrap_or(0)
    }
}

/// Per-key exponential backoff combined with an overall token bucket
pub fn default_controller_rate_limiter<K: QueueKey, C: Clock>(
    config: &ControllerConfig,
    clock: C,
) -> MaxOfRateLimiter<K> {
    MaxOfRateLimiter::new(vec![
        Box::new(ExponentialFailureRateLimiter::new(
            config.base_delay(),
            config.max_delay(),
        )),
        Box::new(BucketRateLimiter::new(config.qps, config.burst, clock)),
    ])
}

#[cfg(test)]
#[path = "rate_limiter_tests.rs"]
mod tests;
