// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! FIFO of work keys with set semantics and per-key exclusivity.
//!
//! A key is held at most once across the queued and in-flight states. Adding
//! a key that is currently being processed marks it dirty; it is queued again
//! when the worker calls [`WorkQueue::done`].

use crate::queue::rate_limiter::{MaxOfRateLimiter, RateLimiter};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::{debug, trace};

#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    state: Mutex<State>,
    notify: Notify,
    limiter: Box<dyn RateLimiter>,
}

#[derive(Default)]
struct State {
    queue: VecDeque<String>,
    /// Keys waiting to be processed, queued or deferred behind an in-flight run
    dirty: HashSet<String>,
    processing: HashSet<String>,
    shutting_down: bool,
}

impl WorkQueue {
    /// Queue using the default controller rate limiter
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rate_limiter(name, Box::new(MaxOfRateLimiter::default()))
    }

    pub fn with_rate_limiter(name: impl Into<String>, limiter: Box<dyn RateLimiter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(State::default()),
                notify: Notify::new(),
                limiter,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `key` unless it is already waiting. Ignored after shutdown.
    pub fn add(&self, key: impl Into<String>) {
        let key = key.into();
        let mut state = self.state();
        if state.shutting_down || state.dirty.contains(&key) {
            return;
        }
        state.dirty.insert(key.clone());
        if state.processing.contains(&key) {
            trace!(queue = %self.inner.name, key = %key, "Key in flight, deferring");
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Wait for the next key. Returns `None` once the queue is shut down and empty.
    pub async fn get(&self) -> Option<String> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    let more = !state.queue.is_empty();
                    drop(state);
                    // Pass along a wakeup we may have consumed on behalf of another waiter
                    if more {
                        self.inner.notify.notify_one();
                    }
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Mark `key` as finished; a re-add that arrived meanwhile is queued now.
    pub fn done(&self, key: &str) {
        let mut state = self.state();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.to_string());
            drop(state);
            self.inner.notify.notify_one();
        } else if state.shutting_down && state.queue.is_empty() {
            drop(state);
            self.inner.notify.notify_waiters();
        }
    }

    /// Re-add `key` after the rate limiter's delay, counting one more requeue.
    pub fn add_rate_limited(&self, key: &str) {
        let delay = self.inner.limiter.when(key);
        if delay.is_zero() {
            self.add(key);
            return;
        }

        debug!(queue = %self.inner.name, key = %key, ?delay, "Requeueing after backoff");
        let queue = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Reset retry bookkeeping for `key`
    pub fn forget(&self, key: &str) {
        self.inner.limiter.forget(key);
    }

    pub fn num_requeues(&self, key: &str) -> u32 {
        self.inner.limiter.num_requeues(key)
    }

    /// Stop accepting keys and wake every waiter. Keys already queued still drain.
    pub fn shut_down(&self) {
        self.state().shutting_down = true;
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }

    /// Number of keys queued and not yet handed out
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::rate_limiter::ItemExponentialRateLimiter;
    use std::time::Duration;
    use tokio::time::timeout;

    fn fast_queue() -> WorkQueue {
        WorkQueue::with_rate_limiter(
            "test",
            Box::new(ItemExponentialRateLimiter::new(
                Duration::from_millis(1),
                Duration::from_millis(10),
            )),
        )
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = fast_queue();
        queue.add("ns/a");
        queue.add("ns/b");
        queue.add("ns/c");

        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
        assert_eq!(queue.get().await.as_deref(), Some("ns/b"));
        assert_eq!(queue.get().await.as_deref(), Some("ns/c"));
    }

    #[tokio::test]
    async fn test_duplicate_adds_collapse() {
        let queue = fast_queue();
        queue.add("ns/a");
        queue.add("ns/b");
        queue.add("ns/a");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
        assert_eq!(queue.get().await.as_deref(), Some("ns/b"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_add_while_processing_is_deferred_until_done() {
        let queue = fast_queue();
        queue.add("ns/a");
        let key = queue.get().await.unwrap();

        queue.add("ns/a");
        queue.add("ns/a");
        assert!(queue.is_empty(), "in-flight key must not be handed out twice");

        queue.done(&key);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
    }

    #[tokio::test]
    async fn test_done_without_readd_leaves_queue_empty() {
        let queue = fast_queue();
        queue.add("ns/a");
        let key = queue.get().await.unwrap();
        queue.done(&key);

        assert!(queue.is_empty());
        queue.add("ns/a");
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_get_blocks_until_add() {
        let queue = fast_queue();
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        queue.add("ns/late");
        let got = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some("ns/late"));
    }

    #[tokio::test]
    async fn test_shutdown_wakes_waiters() {
        let queue = fast_queue();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.get().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.shut_down();

        for waiter in waiters {
            let got = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
            assert!(got.is_none());
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_keys_then_stops() {
        let queue = fast_queue();
        queue.add("ns/a");
        queue.shut_down();
        queue.add("ns/b");

        assert!(queue.is_shutting_down());
        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
        assert!(queue.get().await.is_none());
    }

    #[tokio::test]
    async fn test_add_rate_limited_requeues_and_counts() {
        let queue = fast_queue();

        queue.add_rate_limited("ns/a");
        assert_eq!(queue.num_requeues("ns/a"), 1);

        let got = timeout(Duration::from_secs(1), queue.get()).await.unwrap();
        assert_eq!(got.as_deref(), Some("ns/a"));

        queue.done("ns/a");
        queue.add_rate_limited("ns/a");
        assert_eq!(queue.num_requeues("ns/a"), 2);

        queue.forget("ns/a");
        assert_eq!(queue.num_requeues("ns/a"), 0);
    }

    #[tokio::test]
    async fn test_concurrent_getters_each_receive_distinct_keys() {
        let queue = fast_queue();
        let getters: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.get().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        for key in ["ns/a", "ns/b", "ns/c", "ns/d"] {
            queue.add(key);
        }

        let mut got = Vec::new();
        for getter in getters {
            got.push(timeout(Duration::from_secs(1), getter).await.unwrap().unwrap().unwrap());
        }
        got.sort();
        assert_eq!(got, vec!["ns/a", "ns/b", "ns/c", "ns/d"]);
    }
}
