//! SQLite-backed persistent store backend.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{CacheStores, CachedResponse};
use crate::http::{Response, ResponseKind};

/// Cache stores persisted in a single SQLite database.
///
/// Each named store is a row in `stores`; entries are keyed by
/// (store name, url). Header pairs are serialized as JSON.
pub struct SqliteStores {
  conn: Mutex<Connection>,
}

impl SqliteStores {
  /// Open or create the database at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    Self::open_at(&path)
  }

  /// Open or create the database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  /// In-memory database, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let stores = Self {
      conn: Mutex::new(conn),
    };
    stores.run_migrations()?;
    Ok(stores)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("shellcache").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache store tables.
const STORE_SCHEMA: &str = r#"
-- One row per named store (cache generation)
CREATE TABLE IF NOT EXISTS stores (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Response snapshots keyed by full request URL
CREATE TABLE IF NOT EXISTS entries (
    store_name TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    kind TEXT NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (store_name, url)
);

CREATE INDEX IF NOT EXISTS idx_entries_store ON entries(store_name);
"#;

impl CacheStores for SqliteStores {
  fn open(&self, name: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("INSERT OR IGNORE INTO stores (name) VALUES (?)", params![name])
      .map_err(|e| eyre!("Failed to open store {}: {}", name, e))?;

    Ok(())
  }

  fn names(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM stores ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare store listing: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to list stores: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete(&self, name: &str) -> Result<bool> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM entries WHERE store_name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete entries of store {}: {}", name, e))?;

    let removed = conn
      .execute("DELETE FROM stores WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete store {}: {}", name, e))?;

    Ok(removed > 0)
  }

  fn get(&self, name: &str, url: &str) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(u16, String, String, Vec<u8>, String)> = conn
      .query_row(
        "SELECT status, kind, headers, body, cached_at FROM entries
         WHERE store_name = ? AND url = ?",
        params![name, url],
        |row| {
          Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
          ))
        },
      )
      .optional()
      .map_err(|e| eyre!("Failed to query entry {}: {}", url, e))?;

    let (status, kind_str, headers_json, body, cached_at_str) = match row {
      Some(row) => row,
      None => return Ok(None),
    };

    let kind = ResponseKind::parse(&kind_str)
      .ok_or_else(|| eyre!("Unknown response kind '{}' for {}", kind_str, url))?;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
      .map_err(|e| eyre!("Failed to deserialize headers for {}: {}", url, e))?;
    let cached_at = parse_datetime(&cached_at_str)?;

    Ok(Some(CachedResponse {
      response: Response {
        status,
        kind,
        headers,
        body,
      },
      cached_at,
    }))
  }

  fn put(&self, name: &str, url: &str, response: &Response) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let headers_json = serde_json::to_string(&response.headers)
      .map_err(|e| eyre!("Failed to serialize headers for {}: {}", url, e))?;

    conn
      .execute("INSERT OR IGNORE INTO stores (name) VALUES (?)", params![name])
      .map_err(|e| eyre!("Failed to open store {}: {}", name, e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO entries (store_name, url, status, kind, headers, body, cached_at)
         VALUES (?, ?, ?, ?, ?, ?, datetime('now'))",
        params![
          name,
          url,
          response.status,
          response.kind.as_str(),
          headers_json,
          response.body
        ],
      )
      .map_err(|e| eyre!("Failed to store entry {}: {}", url, e))?;

    Ok(())
  }

  fn urls(&self, name: &str) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT url FROM entries WHERE store_name = ? ORDER BY url")
      .map_err(|e| eyre!("Failed to prepare entry listing: {}", e))?;

    let urls = stmt
      .query_map(params![name], |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to list entries of store {}: {}", name, e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(urls)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn css_response() -> Response {
    Response::new(200, ResponseKind::Basic)
      .with_header("Content-Type", "text/css")
      .with_body("body { color: #222; }")
  }

  #[test]
  fn test_round_trip_preserves_snapshot() {
    let stores = SqliteStores::open_in_memory().unwrap();
    let response = css_response();

    stores
      .put("shop-cache-v1", "/static/css/estilo.css", &response)
      .unwrap();

    let cached = stores
      .get("shop-cache-v1", "/static/css/estilo.css")
      .unwrap()
      .unwrap();
    assert_eq!(cached.response, response);
  }

  #[test]
  fn test_put_creates_store_row() {
    let stores = SqliteStores::open_in_memory().unwrap();
    stores.put("shop-cache-v2", "/a", &css_response()).unwrap();

    assert_eq!(stores.names().unwrap(), vec!["shop-cache-v2"]);
  }

  #[test]
  fn test_delete_removes_store_and_entries() {
    let stores = SqliteStores::open_in_memory().unwrap();
    stores.put("shop-cache-v1", "/a", &css_response()).unwrap();
    stores.put("shop-cache-v2", "/b", &css_response()).unwrap();

    assert!(stores.delete("shop-cache-v1").unwrap());

    assert_eq!(stores.names().unwrap(), vec!["shop-cache-v2"]);
    assert!(stores.get("shop-cache-v1", "/a").unwrap().is_none());
    assert!(stores.urls("shop-cache-v1").unwrap().is_empty());
  }

  #[test]
  fn test_urls_lists_store_contents() {
    let stores = SqliteStores::open_in_memory().unwrap();
    stores.open("shop-cache-v1").unwrap();
    stores.put("shop-cache-v1", "/b", &css_response()).unwrap();
    stores.put("shop-cache-v1", "/a", &css_response()).unwrap();

    assert_eq!(stores.urls("shop-cache-v1").unwrap(), vec!["/a", "/b"]);
  }

  #[test]
  fn test_non_basic_kind_round_trips() {
    let stores = SqliteStores::open_in_memory().unwrap();
    let response = Response::new(200, ResponseKind::Cors).with_body("cdn asset");
    stores
      .put("shop-cache-v1", "https://cdn.example.com/lib.js", &response)
      .unwrap();

    let cached = stores
      .get("shop-cache-v1", "https://cdn.example.com/lib.js")
      .unwrap()
      .unwrap();
    assert_eq!(cached.response.kind, ResponseKind::Cors);
  }
}
