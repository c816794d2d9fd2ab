//! Database schema definitions

/// SQL schema for the page store
///
/// A single `pages` table keyed by URL, plus an external-content FTS5 index
/// over `content` kept in sync by triggers. The triggers cover the upsert
/// path: an `ON CONFLICT DO UPDATE` fires the UPDATE trigger.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS pages_fts USING fts5(
    content,
    content='pages',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS pages_fts_insert AFTER INSERT ON pages BEGIN
    INSERT INTO pages_fts (rowid, content) VALUES (new.rowid, new.content);
END;

CREATE TRIGGER IF NOT EXISTS pages_fts_delete AFTER DELETE ON pages BEGIN
    INSERT INTO pages_fts (pages_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
END;

CREATE TRIGGER IF NOT EXISTS pages_fts_update AFTER UPDATE ON pages BEGIN
    INSERT INTO pages_fts (pages_fts, rowid, content) VALUES ('delete', old.rowid, old.content);
    INSERT INTO pages_fts (rowid, content) VALUES (new.rowid, new.content);
END;
"#;

/// Initializes the database schema
///
/// Idempotent: safe to run against an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
