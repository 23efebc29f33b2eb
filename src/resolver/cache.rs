use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    ip: String,
    expires_at: Instant,
}

/// Hostname → IP cache with read-time expiry.
///
/// Expired entries stay in the map until the same key is resolved again and
/// overwritten; there is no background eviction.
#[derive(Debug)]
pub struct ResolverCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResolverCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached IP if the entry is still live at `now`.
    pub fn get(&self, host: &str, now: Instant) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(host)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.ip.clone())
    }

    pub fn insert(&self, host: &str, ip: String, now: Instant) {
        let entry = CacheEntry {
            ip,
            expires_at: now + self.ttl,
        };
        self.entries.write().insert(host.to_string(), entry);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
