//! `palisade-store` — the consumed relational-store boundary.
//!
//! The auth toolkit never assembles SQL. It talks to whatever relational
//! store the host application provides through the narrow [`Store`] trait
//! (named tables, named-parameter equality filters, rows as column→value
//! maps), and resolves logical entity/column names through a [`Schema`].
//! An in-memory implementation is included for tests and small embeddings.

pub mod memory;
pub mod row;
pub mod schema;
pub mod store;

pub use memory::InMemoryStore;
pub use row::{row_bool, row_i64, row_str, Filter, Row};
pub use schema::{entity, ApiCredentialColumns, ConfigError, CredentialColumns, EntityMap, Schema};
pub use store::{Store, StoreError};
