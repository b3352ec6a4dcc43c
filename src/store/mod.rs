//! Named cache stores keyed by request URL.
//!
//! This models the host cache abstraction the controller runs against:
//! multiple named stores may exist at once (one per cache generation), each
//! mapping full request URLs to complete response snapshots. The controller
//! only ever reads and writes the store named after the current generation;
//! activation deletes the rest.

mod memory;
mod sqlite;

pub use memory::MemoryStores;
pub use sqlite::SqliteStores;

use chrono::{DateTime, Utc};
use color_eyre::Result;

use crate::http::Response;

/// A response snapshot read back from a store.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub response: Response,
  /// When the snapshot was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache store backends.
///
/// Key-level atomicity is the backend's responsibility; the controller
/// never takes locks across calls. Concurrent writes to the same URL are
/// last-write-wins.
pub trait CacheStores: Send + Sync {
  /// Create the named store if it does not exist yet.
  fn open(&self, name: &str) -> Result<()>;

  /// Names of all existing stores.
  fn names(&self) -> Result<Vec<String>>;

  /// Delete a store and all its entries. Returns whether it existed.
  fn delete(&self, name: &str) -> Result<bool>;

  /// Exact-URL lookup in the named store.
  fn get(&self, name: &str, url: &str) -> Result<Option<CachedResponse>>;

  /// Write a response snapshot under `url`, replacing any previous entry.
  /// Creates the store if needed, so a write racing a generation purge
  /// resurrects the store rather than failing.
  fn put(&self, name: &str, url: &str, response: &Response) -> Result<()>;

  /// All URLs cached in the named store.
  fn urls(&self, name: &str) -> Result<Vec<String>>;
}
