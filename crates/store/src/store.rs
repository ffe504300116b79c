//! The relational-store capability interface.

use thiserror::Error;

use crate::row::{Filter, Row};

/// Store-level failure, surfaced from whatever backend the host wired in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The underlying backend failed (I/O, lock poisoning, connection loss).
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A row came back without a column the caller requires.
    #[error("malformed row: missing column '{0}'")]
    MissingColumn(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Parameterized CRUD over named tables.
///
/// Implementations decide how filters become queries; callers only ever pass
/// logical values, never query fragments. Multi-statement mutations
/// ([`Store::upsert`]) must be atomic: a crash between the existence check
/// and the write must not be observable.
pub trait Store: Send + Sync {
    /// Select rows matching `filter`, projected to `columns`.
    /// An empty `columns` slice selects every column.
    fn select(&self, table: &str, filter: &Filter, columns: &[&str]) -> Result<Vec<Row>, StoreError>;

    /// Count rows matching `filter`.
    fn count(&self, table: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert one row. Returns whether a row was written.
    fn insert(&self, table: &str, values: Row) -> Result<bool, StoreError>;

    /// Update all rows matching `filter` with `values`. Returns whether any
    /// row changed.
    fn update(&self, table: &str, values: Row, filter: &Filter) -> Result<bool, StoreError>;

    /// Delete all rows matching `filter`. Returns whether any row was removed.
    fn delete(&self, table: &str, filter: &Filter) -> Result<bool, StoreError>;

    /// Update rows matching `filter` if any exist, otherwise insert `values`.
    /// Must run as a single transaction.
    fn upsert(&self, table: &str, values: Row, filter: &Filter) -> Result<bool, StoreError>;
}
