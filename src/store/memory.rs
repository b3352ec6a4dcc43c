//! In-memory store backend, used by tests and as an injectable substitute
//! for the persistent backend.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{CacheStores, CachedResponse};
use crate::http::Response;

/// Cache stores held entirely in memory.
#[derive(Default)]
pub struct MemoryStores {
  stores: Mutex<BTreeMap<String, BTreeMap<String, CachedResponse>>>,
}

impl MemoryStores {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of entries in the named store, 0 if it does not exist.
  pub fn len(&self, name: &str) -> usize {
    self
      .stores
      .lock()
      .map(|stores| stores.get(name).map_or(0, |s| s.len()))
      .unwrap_or(0)
  }
}

impl CacheStores for MemoryStores {
  fn open(&self, name: &str) -> Result<()> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    stores.entry(name.to_string()).or_default();
    Ok(())
  }

  fn names(&self) -> Result<Vec<String>> {
    let stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(stores.keys().cloned().collect())
  }

  fn delete(&self, name: &str) -> Result<bool> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(stores.remove(name).is_some())
  }

  fn get(&self, name: &str, url: &str) -> Result<Option<CachedResponse>> {
    let stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(stores.get(name).and_then(|s| s.get(url)).cloned())
  }

  fn put(&self, name: &str, url: &str, response: &Response) -> Result<()> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    stores.entry(name.to_string()).or_default().insert(
      url.to_string(),
      CachedResponse {
        response: response.clone(),
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn urls(&self, name: &str) -> Result<Vec<String>> {
    let stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      stores
        .get(name)
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default(),
    )
  }
}
