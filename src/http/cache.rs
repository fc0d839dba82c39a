//! In-memory response cache with per-entry TTL.
//!
//! Entries expire lazily: an expired entry is dropped the first time it is
//! read, or by an explicit `clear_expired` sweep. There is no background
//! eviction task.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
  value: Value,
  stored_at: Instant,
  ttl: Duration,
}

impl CacheEntry {
  fn is_fresh(&self, now: Instant) -> bool {
    now < self.stored_at + self.ttl
  }
}

/// Snapshot of cache contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
  pub total: usize,
  pub keys: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Get a live entry. Expired entries are removed and reported absent.
  pub fn get(&self, key: &str) -> Option<Value> {
    let mut entries = self.entries();
    let entry = entries.get(key)?;
    if entry.is_fresh(Instant::now()) {
      return Some(entry.value.clone());
    }
    entries.remove(key);
    debug!(key, "cache entry expired");
    None
  }

  /// Get a live entry and deserialize it.
  ///
  /// An entry that no longer matches `T` is treated as a miss.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    self
      .get(key)
      .and_then(|value| serde_json::from_value(value).ok())
  }

  pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
    let entry = CacheEntry {
      value,
      stored_at: Instant::now(),
      ttl,
    };
    self.entries().insert(key.into(), entry);
  }

  pub fn remove(&self, key: &str) -> bool {
    self.entries().remove(key).is_some()
  }

  /// Drop every expired entry. Returns how many were removed.
  pub fn clear_expired(&self) -> usize {
    let now = Instant::now();
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|_, entry| entry.is_fresh(now));
    before - entries.len()
  }

  pub fn clear_all(&self) {
    self.entries().clear();
  }

  /// Entry count and keys, including entries not yet swept.
  pub fn stats(&self) -> CacheStats {
    let entries = self.entries();
    let mut keys: Vec<String> = entries.keys().cloned().collect();
    keys.sort();
    CacheStats {
      total: entries.len(),
      keys,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test(start_paused = true)]
  async fn test_entry_visible_until_ttl() {
    let cache = ResponseCache::new();
    cache.set("books", json!([1, 2]), Duration::from_millis(1000));

    tokio::time::advance(Duration::from_millis(999)).await;
    assert_eq!(cache.get("books"), Some(json!([1, 2])));

    // now == stored_at + ttl is already expired
    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(cache.get("books"), None);
    assert_eq!(cache.stats().total, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_expired_is_idempotent() {
    let cache = ResponseCache::new();
    cache.set("short", json!(1), Duration::from_millis(100));
    cache.set("long", json!(2), Duration::from_secs(60));

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(cache.clear_expired(), 1);
    let once = cache.stats();
    assert_eq!(cache.clear_expired(), 0);
    assert_eq!(cache.stats(), once);
    assert_eq!(once.keys, vec!["long".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_overwrites_and_resets_expiry() {
    let cache = ResponseCache::new();
    cache.set("k", json!("old"), Duration::from_millis(100));
    tokio::time::advance(Duration::from_millis(80)).await;
    cache.set("k", json!("new"), Duration::from_millis(100));
    tokio::time::advance(Duration::from_millis(80)).await;
    assert_eq!(cache.get("k"), Some(json!("new")));
  }

  #[test]
  fn test_get_as_typed() {
    let cache = ResponseCache::new();
    cache.set("n", json!({"title": "Dune", "year": 1965}), Duration::from_secs(5));

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Book {
      title: String,
      year: u32,
    }

    assert_eq!(
      cache.get_as::<Book>("n"),
      Some(Book {
        title: "Dune".to_string(),
        year: 1965
      })
    );
    assert_eq!(cache.get_as::<Vec<u32>>("n"), None);
  }

  #[test]
  fn test_remove_and_clear_all() {
    let cache = ResponseCache::new();
    cache.set("a", json!(1), Duration::from_secs(5));
    cache.set("b", json!(2), Duration::from_secs(5));

    assert!(cache.remove("a"));
    assert!(!cache.remove("a"));
    assert_eq!(cache.stats().keys, vec!["b".to_string()]);

    cache.clear_all();
    assert_eq!(cache.stats().total, 0);
  }
}
