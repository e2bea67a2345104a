//! Request coalescing primitives.
//!
//! Several parts of a UI tend to ask for the same thing at the same time:
//! the header, the dashboard and the route guard all want a fresh
//! principal right after a page load. Sending three identical requests
//! wastes a round-trip at best and races at worst.
//!
//! [`InFlight`] keys each call by what it does. The first caller starts
//! the call; everyone arriving while it runs awaits the same future and
//! receives a clone of its output.
//!
//! ```text
//! caller A ──┐
//! caller B ──┼──► [key] ──► one call ──► result ──► A, B, C
//! caller C ──┘
//! ```
//!
//! [`ReentryLatch`] is the simpler cousin: it remembers the last key it
//! saw and rejects repeats, for triggers that fire more than once per
//! navigation.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;

/// A map of operation key → the call currently running for it.
pub struct InFlight<K, T> {
    calls: Mutex<HashMap<K, Shared<BoxFuture<'static, T>>>>,
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs the call for `key`, or joins the one already running.
    ///
    /// `start` is only invoked when no call for `key` is in flight. It is
    /// called under the map's lock, so it should only build the future,
    /// not do work.
    ///
    /// The entry is removed once the call completes; the next `run` with
    /// the same key starts a fresh call.
    pub async fn run<F, Fut>(&self, key: K, start: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let call = {
            let mut calls = self.calls.lock();
            match calls.get(&key) {
                Some(running) => {
                    tracing::debug!("joining in-flight call");
                    running.clone()
                }
                None => {
                    let call = start().boxed().shared();
                    calls.insert(key.clone(), call.clone());
                    call
                }
            }
        };

        let output = call.clone().await;

        // Only remove our own entry; a newer call may already own the key.
        let mut calls = self.calls.lock();
        if calls.get(&key).is_some_and(|running| running.ptr_eq(&call)) {
            calls.remove(&key);
        }
        output
    }

    /// Returns `true` if a call for `key` is running.
    pub fn contains(&self, key: &K) -> bool {
        self.calls.lock().contains_key(key)
    }

    /// How many distinct calls are running.
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl<K, T> Default for InFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers the most recent key and lets each distinct key through once.
///
/// ```rust
/// use tripgate_session::ReentryLatch;
///
/// let latch: ReentryLatch = ReentryLatch::new();
/// assert!(latch.enter("/agent/dashboard"));
/// assert!(!latch.enter("/agent/dashboard")); // same navigation, skipped
/// assert!(latch.enter("/agent/listings"));
/// assert!(latch.enter("/agent/dashboard")); // navigated back
/// ```
#[derive(Debug, Default)]
pub struct ReentryLatch<K = String> {
    last: Mutex<Option<K>>,
}

impl<K: PartialEq> ReentryLatch<K> {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Returns `true` (and remembers `key`) if `key` differs from the
    /// last one entered. Returns `false` for a repeat.
    pub fn enter(&self, key: impl Into<K>) -> bool {
        let key = key.into();
        let mut last = self.last.lock();
        if last.as_ref() == Some(&key) {
            return false;
        }
        *last = Some(key);
        true
    }

    /// Forgets the last key, so the next `enter` always passes.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }
}
