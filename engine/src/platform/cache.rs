//! The [`Cache`] capability — an in-memory, TTL-evicting result cache.
//!
//! Conceptually paired with the teacher's on-disk `CheckCache`
//! invalidate-by-hash design, but reimplemented as a process-lifetime
//! in-memory store per spec §4.1: the engine caches `CheckResult`s keyed
//! by `(repository.path, checker.id, config-hash)`, not by file content.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Capability interface over a key/value cache with per-entry TTL.
pub trait Cache: Send + Sync {
    /// Returns `(value, true)` on a live hit, `(None, false)` on a miss or
    /// expired entry.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    fn delete(&self, key: &str);
    fn clear(&self);
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`Cache`] backed by a mutex-guarded hash map. Expired entries
/// are reaped lazily on `get`, not by a background thread.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_on_empty_cache() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn set_then_get_hits() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".to_owned(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_owned()));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".to_owned(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".to_owned(), Duration::from_secs(60));
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn clear_removes_all_entries() {
        let cache = InMemoryCache::new();
        cache.set("a", "1".to_owned(), Duration::from_secs(60));
        cache.set("b", "2".to_owned(), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn overwrite_replaces_value_and_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "1".to_owned(), Duration::from_secs(60));
        cache.set("k", "2".to_owned(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("2".to_owned()));
    }
}
