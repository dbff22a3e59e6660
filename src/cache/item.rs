//! Cache Item Module
//!
//! Defines a single cache item: key, payload, life span, access statistics
//! and the callbacks fired right before the item is removed.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Callback invoked with the item's key right before the item is removed.
pub type ExpiryCallback<K> = Arc<dyn Fn(&K) + Send + Sync>;

// == Access State ==
/// Metadata mutated after construction. Guarded by the item's lock.
struct AccessState<K> {
    accessed_on: Instant,
    access_count: u64,
    about_to_expire: Vec<ExpiryCallback<K>>,
}

// == Cache Item ==
/// A single cache item with TTL and access tracking.
///
/// `key`, `data`, `life_span` and `created_on` are fixed at construction and
/// read without locking. The access timestamp, access counter and callback
/// list live behind a read/write lock private to the item.
pub struct CacheItem<K, V> {
    key: K,
    data: V,
    /// Zero means the item never expires.
    life_span: Duration,
    created_on: Instant,
    state: RwLock<AccessState<K>>,
}

impl<K, V> CacheItem<K, V> {
    // == Constructor ==
    /// Creates a new cache item.
    ///
    /// # Arguments
    /// * `key` - Identifier of the item within its table
    /// * `life_span` - How long the item may stay unaccessed before it expires
    /// * `data` - The stored payload
    pub fn new(key: K, life_span: Duration, data: V) -> Self {
        let now = Instant::now();

        Self {
            key,
            data,
            life_span,
            created_on: now,
            state: RwLock::new(AccessState {
                accessed_on: now,
                access_count: 0,
                about_to_expire: Vec::new(),
            }),
        }
    }

    // == Keep Alive ==
    /// Marks the item as accessed: refreshes the access time and bumps the
    /// access counter in one critical section.
    pub fn keep_alive(&self) {
        let mut state = self.state.write();
        state.accessed_on = Instant::now();
        state.access_count += 1;
    }

    /// Returns the configured life span.
    pub fn life_span(&self) -> Duration {
        self.life_span
    }

    /// Returns when the item was last accessed.
    pub fn accessed_on(&self) -> Instant {
        self.state.read().accessed_on
    }

    /// Returns when the item was created.
    pub fn created_on(&self) -> Instant {
        self.created_on
    }

    /// Returns how many times the item has been kept alive.
    pub fn access_count(&self) -> u64 {
        self.state.read().access_count
    }

    /// Returns the item's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the item's payload.
    pub fn data(&self) -> &V {
        &self.data
    }

    // == Expiration ==
    /// Returns true if the item has a life span and has not been accessed
    /// for at least that long as of `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.remaining_at(now) == Some(Duration::ZERO)
    }

    /// Returns the time left before the item expires as of `now`, or `None`
    /// if the item never expires.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        if self.life_span.is_zero() {
            return None;
        }
        let idle = now.saturating_duration_since(self.accessed_on());
        Some(self.life_span.saturating_sub(idle))
    }

    // == Expiry Callbacks ==
    /// Replaces every registered expiry callback with `f`.
    ///
    /// The clear and the append happen under a single write lock, so a
    /// concurrent [`add_about_to_expire_callback`](Self::add_about_to_expire_callback)
    /// lands either entirely before or entirely after the replacement.
    pub fn set_about_to_expire_callback<F>(&self, f: F)
    where
        F: Fn(&K) + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        state.about_to_expire.clear();
        state.about_to_expire.push(Arc::new(f));
    }

    /// Appends `f` to the expiry callbacks, keeping existing ones in order.
    pub fn add_about_to_expire_callback<F>(&self, f: F)
    where
        F: Fn(&K) + Send + Sync + 'static,
    {
        self.state.write().about_to_expire.push(Arc::new(f));
    }

    /// Removes every registered expiry callback.
    pub fn remove_about_to_expire_callbacks(&self) {
        self.state.write().about_to_expire.clear();
    }

    /// Returns a snapshot of the expiry callbacks in registration order.
    pub fn about_to_expire_callbacks(&self) -> Vec<ExpiryCallback<K>> {
        self.state.read().about_to_expire.clone()
    }

    /// Invokes every expiry callback in registration order with the item's key.
    ///
    /// Callbacks run on a snapshot taken under the read lock and are called
    /// after the lock is released, so a callback may touch this item again.
    pub fn notify_about_to_expire(&self) {
        for callback in self.about_to_expire_callbacks() {
            callback(&self.key);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheItem<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("CacheItem")
            .field("key", &self.key)
            .field("data", &self.data)
            .field("life_span", &self.life_span)
            .field("created_on", &self.created_on)
            .field("accessed_on", &state.accessed_on)
            .field("access_count", &state.access_count)
            .field("about_to_expire", &state.about_to_expire.len())
            .finish()
    }
}
