//! Cache storage trait and its session-scoped implementations.
//!
//! Storage is byte oriented: entries arrive already serialized, so backends
//! can be swapped at runtime behind `Arc<dyn CacheStorage>`. None of the
//! backends write to disk, which keeps cached responses scoped to one run.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("cache entry could not be (de)serialized: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("cache lock poisoned")]
  Poisoned,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get the stored bytes for a key.
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

  /// Store bytes under a key, replacing any previous value.
  fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

  /// Remove every key starting with `prefix`, returning how many were removed.
  fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

  /// Remove everything.
  fn clear(&self) -> Result<(), CacheError>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
    Ok(None) // Always miss
  }

  fn put(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn remove_prefix(&self, _prefix: &str) -> Result<usize, CacheError> {
    Ok(0)
  }

  fn clear(&self) -> Result<(), CacheError> {
    Ok(())
  }
}

/// In-process map storage.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, CacheError> {
    self.entries.lock().map_err(|_| CacheError::Poisoned)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
    self.lock()?.insert(key.to_string(), value.to_vec());
    Ok(())
  }

  fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
    let mut entries = self.lock()?;
    // Keys sharing a prefix are contiguous in a BTreeMap
    let doomed: Vec<String> = entries
      .range(prefix.to_string()..)
      .take_while(|(key, _)| key.starts_with(prefix))
      .map(|(key, _)| key.clone())
      .collect();
    for key in &doomed {
      entries.remove(key);
    }
    Ok(doomed.len())
  }

  fn clear(&self) -> Result<(), CacheError> {
    self.lock()?.clear();
    Ok(())
  }
}

/// SQLite-backed storage living in an in-memory database.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for the response cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    cache_key TEXT PRIMARY KEY,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStorage {
  /// Open a fresh in-memory database for this session.
  pub fn open_in_memory() -> Result<Self, CacheError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    self.conn.lock().map_err(|_| CacheError::Poisoned)
  }
}

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
    let conn = self.lock()?;
    let body = conn
      .query_row(
        "SELECT body FROM response_cache WHERE cache_key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(body)
  }

  fn put(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO response_cache (cache_key, body, stored_at)
       VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;
    Ok(())
  }

  fn remove_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
    let conn = self.lock()?;
    // substr comparison instead of LIKE: keys may contain '%' or '_'
    let removed = conn.execute(
      "DELETE FROM response_cache WHERE substr(cache_key, 1, length(?1)) = ?1",
      params![prefix],
    )?;
    Ok(removed)
  }

  fn clear(&self) -> Result<(), CacheError> {
    self.lock()?.execute("DELETE FROM response_cache", [])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise(storage: &dyn CacheStorage) {
    storage.put("students_a", b"1").unwrap();
    storage.put("students_b", b"2").unwrap();
    storage.put("programs_a", b"3").unwrap();
    storage.put("studentsx", b"4").unwrap();

    assert_eq!(storage.get("students_a").unwrap(), Some(b"1".to_vec()));

    storage.put("students_a", b"5").unwrap();
    assert_eq!(storage.get("students_a").unwrap(), Some(b"5".to_vec()));

    assert_eq!(storage.remove_prefix("students_").unwrap(), 2);
    assert_eq!(storage.get("students_a").unwrap(), None);
    assert_eq!(storage.get("students_b").unwrap(), None);
    assert_eq!(storage.get("programs_a").unwrap(), Some(b"3".to_vec()));
    assert_eq!(storage.get("studentsx").unwrap(), Some(b"4".to_vec()));

    storage.clear().unwrap();
    assert_eq!(storage.get("programs_a").unwrap(), None);
  }

  #[test]
  fn test_memory_storage() {
    exercise(&MemoryStorage::new());
  }

  #[test]
  fn test_sqlite_storage() {
    exercise(&SqliteStorage::open_in_memory().unwrap());
  }

  #[test]
  fn test_sqlite_prefix_with_wildcards() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.put("a%_1", b"x").unwrap();
    storage.put("ab_1", b"y").unwrap();
    assert_eq!(storage.remove_prefix("a%_").unwrap(), 1);
    assert!(storage.get("ab_1").unwrap().is_some());
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.put("k", b"v").unwrap();
    assert_eq!(storage.get("k").unwrap(), None);
    assert_eq!(storage.remove_prefix("k").unwrap(), 0);
  }
}
