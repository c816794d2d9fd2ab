//! Storage traits and error types

use crate::storage::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Consumer of harvested page records
///
/// The engine does not know what is behind this seam; the sink workers call
/// `persist` for every record that reaches the entries queue. Implementations
/// upsert keyed by URL: on conflict the content is replaced and the crawl
/// timestamp refreshed. A failed persist must leave the sink usable for the
/// next record.
pub trait PageSink: Send + Sync {
    /// Upserts one page record
    fn persist(&self, record: &PageRecord) -> StorageResult<()>;
}
