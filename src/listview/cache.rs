//! Response cache keyed by derived query keys.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::params::ListParams;
use super::storage::{CacheError, CacheStorage};

/// One page of rows as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<R> {
  pub rows: Vec<R>,
  pub total_count: u64,
}

/// A cached page and when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<R> {
  pub rows: Vec<R>,
  pub total_count: u64,
  pub cached_at: DateTime<Utc>,
}

impl<R> CacheEntry<R> {
  pub fn new(page: Page<R>) -> Self {
    Self {
      rows: page.rows,
      total_count: page.total_count,
      cached_at: Utc::now(),
    }
  }

  pub fn into_page(self) -> Page<R> {
    Page {
      rows: self.rows,
      total_count: self.total_count,
    }
  }
}

/// Derive the cache key for a list request: `<namespace>_<sha256 of params>`.
pub fn derive_key(namespace: &str, params: &ListParams) -> String {
  let mut hasher = Sha256::new();
  hasher.update(params.canonical().as_bytes());
  format!("{}_{}", namespace, hex::encode(hasher.finalize()))
}

/// Key for a namespace's list of codes (filter and form options).
pub fn codes_key(namespace: &str) -> String {
  format!("{}_codes", namespace)
}

/// Session-wide response cache.
///
/// Clones share the same storage, so every view created during a session
/// reads what earlier views stored. Lookups never touch the network.
#[derive(Clone)]
pub struct ResponseCache {
  storage: Arc<dyn CacheStorage>,
}

impl ResponseCache {
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  pub fn get<R: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<R>>, CacheError> {
    match self.storage.get(key)? {
      Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      None => Ok(None),
    }
  }

  pub fn put<R: Serialize>(&self, key: &str, entry: &CacheEntry<R>) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(entry)?;
    self.storage.put(key, &bytes)
  }

  /// Remove every entry whose key starts with `prefix` (e.g. "students_").
  pub fn invalidate_namespace(&self, prefix: &str) -> Result<usize, CacheError> {
    let removed = self.storage.remove_prefix(prefix)?;
    tracing::debug!(prefix, removed, "invalidated cache namespace");
    Ok(removed)
  }

  /// Drop everything, used when the session ends.
  pub fn clear(&self) -> Result<(), CacheError> {
    self.storage.clear()
  }
}

impl std::fmt::Debug for ResponseCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResponseCache").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listview::storage::MemoryStorage;

  fn params(page: u32) -> ListParams {
    ListParams {
      page,
      per_page: 10,
      ..Default::default()
    }
  }

  #[test]
  fn test_derive_key_is_deterministic_and_namespaced() {
    let a = derive_key("students", &params(1));
    assert_eq!(a, derive_key("students", &params(1)));
    assert_ne!(a, derive_key("students", &params(2)));
    assert!(a.starts_with("students_"));
    assert_ne!(a, derive_key("programs", &params(1)));
  }

  #[test]
  fn test_round_trip_through_storage() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let entry = CacheEntry::new(Page {
      rows: vec!["a".to_string(), "b".to_string()],
      total_count: 2,
    });
    cache.put("students_x", &entry).unwrap();

    let got: CacheEntry<String> = cache.get("students_x").unwrap().unwrap();
    assert_eq!(got.rows, entry.rows);
    assert_eq!(got.total_count, 2);
  }

  #[test]
  fn test_invalidate_namespace_hides_prior_entries() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let page = Page {
      rows: vec![1u32],
      total_count: 1,
    };
    let students = derive_key("students", &params(1));
    let programs = derive_key("programs", &params(1));
    cache.put(&students, &CacheEntry::new(page.clone())).unwrap();
    cache.put(&codes_key("students"), &CacheEntry::new(page.clone())).unwrap();
    cache.put(&programs, &CacheEntry::new(page)).unwrap();

    assert_eq!(cache.invalidate_namespace("students_").unwrap(), 2);
    assert!(cache.get::<u32>(&students).unwrap().is_none());
    assert!(cache.get::<u32>(&programs).unwrap().is_some());
  }

  #[test]
  fn test_clones_share_storage() {
    let cache = ResponseCache::new(MemoryStorage::new());
    let other = cache.clone();
    cache
      .put(
        "colleges_1",
        &CacheEntry::new(Page {
          rows: vec![true],
          total_count: 1,
        }),
      )
      .unwrap();
    assert!(other.get::<bool>("colleges_1").unwrap().is_some());
  }
}
