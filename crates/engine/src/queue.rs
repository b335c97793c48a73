// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deduplicating, rate-limited reconcile queue.
//!
//! Pending keys form a set, so adding a key that is already waiting is a
//! no-op. A key is never handed to two workers at once: a key added while it
//! is being processed is marked dirty and re-queued by `done`.

use crate::rate_limiter::{QueueKey, RateLimiter};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

struct QueueState<K> {
    queue: VecDeque<K>,
    /// Keys needing processing (queued or to be re-queued on `done`)
    dirty: HashSet<K>,
    processing: HashSet<K>,
    /// Earliest pending delayed add per key
    waiting: HashMap<K, Instant>,
    shutting_down: bool,
}

struct QueueInner<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
    limiter: Box<dyn RateLimiter<K>>,
}

/// Work queue of owner keys shared by the watch dispatcher and the workers.
///
/// Clones share the same queue. Delayed adds spawn a timer task, so they
/// must be called from within a tokio runtime.
pub struct ReconcileQueue<K> {
    inner: Arc<QueueInner<K>>,
}

impl<K> Clone for ReconcileQueue<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: QueueKey> ReconcileQueue<K> {
    pub fn new(limiter: impl RateLimiter<K>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    waiting: HashMap::new(),
                    shutting_down: false,
                }),
                notify: Notify::new(),
                limiter: Box::new(limiter),
            }),
        }
    }

    /// Mark `key` as needing processing. Ignored after shutdown.
    pub fn add(&self, key: K) {
        let mut state = self.inner.state.lock();
        if state.shutting_down || state.dirty.contains(&key) {
            return;
        }
        state.dirty.insert(key.clone());
        if state.processing.contains(&key) {
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Wait for the next key. Returns `None` once the queue is shut down and
    /// drained.
    pub async fn get(&self) -> Option<K> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so an add between the check and the
            // await still wakes us
            notified.as_mut().enable();
            {
                let mut state = self.inner.state.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Finish processing `key`. Re-queues it if it was added meanwhile.
    pub fn done(&self, key: &K) {
        let mut state = self.inner.state.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.clone());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Add `key` once `delay` has elapsed. A pending earlier add wins.
    pub fn add_after(&self, key: K, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let ready_at = Instant::now() + delay;
        {
            let mut state = self.inner.state.lock();
            if state.shutting_down {
                return;
            }
            if let Some(existing) = state.waiting.get(&key) {
                if *existing <= ready_at {
                    return;
                }
            }
            state.waiting.insert(key.clone(), ready_at);
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(ready_at).await;
            let still_current = {
                let mut state = queue.inner.state.lock();
                match state.waiting.get(&key) {
                    Some(at) if *at == ready_at => {
                        state.waiting.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if still_current {
                queue.add(key);
            }
        });
    }

    /// Re-add `key` after the rate limiter's delay for it
    pub fn add_rate_limited(&self, key: K) {
        let delay = self.inner.limiter.when(&key);
        self.add_after(key, delay);
    }

    /// Reset the retry history of `key`
    pub fn forget(&self, key: &K) {
        self.inner.limiter.forget(key);
    }

    pub fn num_requeues(&self, key: &K) -> u32 {
        self.inner.limiter.num_requeues(key)
    }

    /// Keys waiting to be handed out
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting keys and wake every waiting worker. Keys already
    /// queued are still handed out.
    pub fn shut_down(&self) {
        {
            let mut state = self.inner.state.lock();
            state.shutting_down = true;
            state.waiting.clear();
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.state.lock().shutting_down
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
