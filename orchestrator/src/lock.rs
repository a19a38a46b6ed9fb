//! Per-action in-flight locks.
//!
//! While an attempt for an action is anywhere between `Built` and a terminal
//! state, a second invocation of the same action is refused rather than
//! queued. The lock is released when the [`InFlightGuard`] drops, which
//! covers success, failure, abandonment and early returns alike.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Set of action keys that currently have an attempt in flight.
pub struct ActionLocks<K> {
    held: Arc<Mutex<HashSet<K>>>,
}

impl<K> ActionLocks<K>
where
    K: Clone + Debug + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            held: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Take the lock for `key`, or `None` if an attempt is already in flight.
    pub fn try_acquire(&self, key: K) -> Option<InFlightGuard<K>> {
        let mut held = self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(key.clone()) {
            tracing::debug!(?key, "action already in flight");
            return None;
        }
        Some(InFlightGuard {
            held: Arc::clone(&self.held),
            key,
        })
    }

    pub fn is_held(&self, key: &K) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(key))
            .unwrap_or(false)
    }
}

impl<K> Default for ActionLocks<K>
where
    K: Clone + Debug + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Releases its action key on drop.
pub struct InFlightGuard<K: Eq + Hash> {
    held: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> InFlightGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.key);
    }
}
