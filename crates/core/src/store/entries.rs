//! Cache generation and entry operations.
//!
//! A generation is a named bucket of cached responses. Installs seed a
//! static generation, runtime caching writes into a runtime generation,
//! and activation purges every generation that is no longer current.

use super::connection::StoreDb;
use super::hash::request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response entry.
///
/// Holds everything needed to replay a response without the network:
/// status, content type, serialized headers, and the raw body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub key: String,
    pub path: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedEntry {
    /// Build an entry for a path, deriving its cache key and timestamp.
    pub fn new(
        path: &str,
        status: u16,
        content_type: Option<String>,
        headers_json: Option<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            key: request_key(path),
            path: path.to_string(),
            status,
            content_type,
            headers_json,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        generation, key, path, status, content_type, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(generation, key) DO UPDATE SET
        path = excluded.path,
        status = excluded.status,
        content_type = excluded.content_type,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

fn entry_from_row(row: &rusqlite::Row<'_>) -> Result<CachedEntry, rusqlite::Error> {
    Ok(CachedEntry {
        key: row.get(0)?,
        path: row.get(1)?,
        status: row.get::<_, i64>(2)? as u16,
        content_type: row.get(3)?,
        headers_json: row.get(4)?,
        body: row.get(5)?,
        stored_at: row.get(6)?,
    })
}

impl StoreDb {
    /// Create a generation if it doesn't exist yet.
    ///
    /// Re-creating an existing generation keeps its original creation
    /// time, so lookup order stays stable across restarts.
    pub async fn create_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List generation names in creation order.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation whose name is not in `keep`.
    ///
    /// Entries go with their generation via the cascading foreign key.
    /// Returns the names that were removed.
    pub async fn purge_generations_except(&self, keep: &[&str]) -> Result<Vec<String>, Error> {
        let keep: Vec<String> = keep.iter().map(|s| s.to_string()).collect();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let names = {
                    let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, rowid ASC")?;
                    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                    rows.collect::<Result<Vec<String>, _>>()?
                };

                let mut removed = Vec::new();
                for name in names {
                    if keep.iter().any(|k| k == &name) {
                        continue;
                    }
                    conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                    removed.push(name);
                }
                Ok(removed)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a single entry in a generation.
    ///
    /// The generation row is created on demand so fire-and-forget cache
    /// writes never trip the foreign key.
    pub async fn put_entry(&self, generation: &str, entry: &CachedEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, now],
                )?;
                conn.execute(
                    UPSERT_ENTRY,
                    params![
                        generation,
                        entry.key,
                        entry.path,
                        i64::from(entry.status),
                        entry.content_type,
                        entry.headers_json,
                        entry.body,
                        entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of entries in one transaction.
    ///
    /// Either every entry lands in the generation or none do, which is
    /// what install seeding requires.
    pub async fn put_entries(&self, generation: &str, entries: Vec<CachedEntry>) -> Result<(), Error> {
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, now],
                )?;
                for entry in &entries {
                    tx.execute(
                        UPSERT_ENTRY,
                        params![
                            generation,
                            entry.key,
                            entry.path,
                            i64::from(entry.status),
                            entry.content_type,
                            entry.headers_json,
                            entry.body,
                            entry.stored_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry from one specific generation.
    ///
    /// Returns None if the generation has nothing for the path.
    pub async fn entry(&self, generation: &str, path: &str) -> Result<Option<CachedEntry>, Error> {
        let generation = generation.to_string();
        let key = request_key(path);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, path, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![generation, key], entry_from_row);

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Find an entry for a path across all generations.
    ///
    /// Generations are searched in creation order, so an entry seeded at
    /// install wins over a later runtime copy.
    pub async fn lookup(&self, path: &str) -> Result<Option<CachedEntry>, Error> {
        let key = request_key(path);
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.key, e.path, e.status, e.content_type, e.headers_json, e.body, e.stored_at
                     FROM entries e
                     JOIN generations g ON g.name = e.generation
                     WHERE e.key = ?1
                     ORDER BY g.created_at ASC, g.rowid ASC
                     LIMIT 1",
                )?;

                let result = stmt.query_row(params![key], entry_from_row);

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Total size in bytes of all cached bodies.
    pub async fn total_size(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let size: i64 = conn
                    .query_row("SELECT COALESCE(SUM(LENGTH(body)), 0) FROM entries", [], |row| row.get(0))
                    .map_err(Error::from)?;
                Ok(size as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries across all generations.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
                    .map_err(Error::from)?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_entry(path: &str, body: &[u8]) -> CachedEntry {
        CachedEntry::new(path, 200, Some("text/html".to_string()), None, body.to_vec())
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let entry = make_test_entry("/menu", b"menu page");

        db.put_entry("static-v1", &entry).await.unwrap();

        let retrieved = db.entry("static-v1", "/menu").await.unwrap().unwrap();
        assert_eq!(retrieved.path, "/menu");
        assert_eq!(retrieved.body, b"menu page");
        assert_eq!(retrieved.status, 200);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let result = db.lookup("/nowhere").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/menu", b"old")).await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/menu", b"new")).await.unwrap();

        let retrieved = db.entry("static-v1", "/menu").await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"new");
        assert_eq!(db.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_prefers_oldest_generation() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/menu", b"seeded")).await.unwrap();
        db.put_entry("runtime", &make_test_entry("/menu", b"runtime copy")).await.unwrap();

        let found = db.lookup("/menu").await.unwrap().unwrap();
        assert_eq!(found.body, b"seeded");
    }

    #[tokio::test]
    async fn test_lookup_normalizes_path() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/menu", b"menu page")).await.unwrap();

        let found = db.lookup("/menu#drinks").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_put_entries_batch() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let batch = vec![
            make_test_entry("/", b"index"),
            make_test_entry("/manifest.json", b"{}"),
            make_test_entry("/img/1.jpg", b"jpg"),
        ];

        db.put_entries("static-v1", batch).await.unwrap();

        assert_eq!(db.count_entries().await.unwrap(), 3);
        assert!(db.entry("static-v1", "/manifest.json").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_generations_except() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/a", b"a")).await.unwrap();
        db.put_entry("static-v2", &make_test_entry("/b", b"b")).await.unwrap();
        db.put_entry("runtime", &make_test_entry("/c", b"c")).await.unwrap();

        let removed = db.purge_generations_except(&["static-v2", "runtime"]).await.unwrap();
        assert_eq!(removed, vec!["static-v1".to_string()]);

        assert_eq!(db.generation_names().await.unwrap(), vec!["static-v2", "runtime"]);
        assert!(db.lookup("/a").await.unwrap().is_none());
        assert!(db.lookup("/b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_all_generations() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/a", b"a")).await.unwrap();
        db.put_entry("runtime", &make_test_entry("/b", b"b")).await.unwrap();

        let removed = db.purge_generations_except(&[]).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(db.count_entries().await.unwrap(), 0);
        assert_eq!(db.total_size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_size() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/a", b"four")).await.unwrap();
        db.put_entry("static-v1", &make_test_entry("/b", b"bytes")).await.unwrap();

        assert_eq!(db.total_size().await.unwrap(), 9);
    }
}
