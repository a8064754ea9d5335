use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct PendingEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed store for "awaiting confirmation" state with TTL-based eviction.
/// Expired entries are dropped on access, so the map never grows past the
/// live working set.
pub struct ExpiringMap<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, PendingEntry<V>>>,
}

impl<K: Eq + Hash, V> ExpiringMap<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces any previous value for the key and resets its deadline.
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            PendingEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Takes the live value for the key; expired or absent entries yield
    /// `None`.
    pub async fn take(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.remove(key).map(|entry| entry.value)
    }
}
