//! Bounded caches.
//!
//! [`BoundedCache`] is a generic LRU map behind a mutex. [`SignatureCache`]
//! builds on it to remember verified signature shares per message, so a later
//! aggregation of the same message can skip validators that already signed.

use lru::LruCache;
use parking_lot::Mutex;
use quorumsig_crypto::{PublicKeyBytes, SignatureBytes};
use quorumsig_types::MessageId;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tracing::trace;

/// Thread-safe LRU map with a fixed entry capacity.
pub struct BoundedCache<K: Hash + Eq, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a copy of the value for `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Insert or replace the value for `key`, evicting the least recently
    /// used entry when full.
    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    /// Atomically modify the value for `key`, creating it with `init` first
    /// if absent.
    ///
    /// The lookup, mutation and write-back happen under one lock, so
    /// concurrent updates to the same key are never lost.
    pub fn update<I, F>(&self, key: K, init: I, f: F)
    where
        I: FnOnce() -> V,
        F: FnOnce(&mut V),
    {
        let mut cache = self.inner.lock();
        if let Some(value) = cache.get_mut(&key) {
            f(value);
            return;
        }
        let mut value = init();
        f(&mut value);
        cache.put(key, value);
    }

    /// Check for `key` without touching its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }
}

/// Verified signature shares, keyed by message then by validator public key.
///
/// Capacity bounds the number of messages, not shares; the shares per
/// message are bounded by the validator-set size. Only shares that verified
/// against the message may be added.
pub struct SignatureCache {
    shares: BoundedCache<MessageId, HashMap<PublicKeyBytes, SignatureBytes>>,
}

impl SignatureCache {
    /// Create a cache for `capacity` messages. A zero capacity holds one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            shares: BoundedCache::new(capacity),
        }
    }

    /// All cached shares for a message.
    pub fn get(&self, message_id: &MessageId) -> Option<HashMap<PublicKeyBytes, SignatureBytes>> {
        self.shares.get(message_id)
    }

    /// Record a verified share, replacing any earlier share from the same key.
    pub fn add(&self, message_id: MessageId, public_key: PublicKeyBytes, signature: SignatureBytes) {
        trace!(%message_id, "Caching signature share");
        self.shares.update(message_id, HashMap::new, |shares| {
            shares.insert(public_key, signature);
        });
    }

    /// Number of messages with cached shares.
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}
