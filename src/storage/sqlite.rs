//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageSink, StorageResult};
use crate::storage::{PageRecord, SearchHit};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed page store
///
/// One connection guarded by a mutex, shared between the sink workers and
/// the search CLI. Sink writes run on the blocking pool, so the lock is only
/// ever held for the duration of a single statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at the given path
    ///
    /// Applies performance pragmas and initializes the schema. Failure here
    /// is fatal to the process: the engine never starts without a store.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store (used by tests and throwaway sessions)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ranks stored pages by full-text relevance against a term
    ///
    /// Uses FTS5 bm25 ranking; the most relevant page comes first. The term
    /// is quoted so FTS query syntax in user input cannot break the query.
    pub fn search(&self, term: &str, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let quoted = format!("\"{}\"", term.replace('"', "\"\""));
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT pages.url, bm25(pages_fts) AS score, pages.content
             FROM pages_fts
             JOIN pages ON pages.rowid = pages_fts.rowid
             WHERE pages_fts MATCH ?1
             ORDER BY score
             LIMIT ?2",
        )?;

        let hits = stmt
            .query_map(params![quoted, limit as i64], |row| {
                Ok(SearchHit {
                    url: row.get(0)?,
                    score: row.get(1)?,
                    content: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hits)
    }

    /// Returns the stored content for a URL, if any
    pub fn page_content(&self, url: &str) -> StorageResult<Option<String>> {
        let conn = self.conn();
        let content = conn
            .query_row(
                "SELECT content FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    /// Total number of stored pages
    pub fn page_count(&self) -> StorageResult<u64> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl PageSink for SqliteStore {
    fn persist(&self, record: &PageRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO pages (url, content, crawled_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET
                 content = excluded.content,
                 crawled_at = excluded.crawled_at",
            params![record.url, record.content, now],
        )?;
        Ok(())
    }
}
