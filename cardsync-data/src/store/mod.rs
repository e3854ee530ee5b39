//! Persistence layer for validated set and card records.
//!
//! The module is split into focused submodules:
//! - `url` parses database connection strings.
//! - `connection` opens SQLite handles for one unit of work.
//! - `schema` materialises the `sets` and `cards` tables.
//! - `persistence` performs transactional, idempotent upserts.
//! - `inspect` answers status queries and detects drift between the
//!   validator and the live tables.
#![forbid(unsafe_code)]

mod connection;
mod inspect;
mod persistence;
mod schema;
mod url;

use camino::Utf8PathBuf;
use rusqlite::Error as SqliteError;
use thiserror::Error;

pub use connection::{ConnectionFactory, SqliteConnectionFactory};
pub use inspect::{ColumnDrift, ColumnInfo, count_rows, ping, table_columns, verify_alignment};
pub use persistence::{persist_records, upsert_records, upsert_sql};
pub use schema::{SCHEMA_VERSION, StoreSchemaError, initialise_schema};
pub use url::{DEFAULT_DATABASE_URL, DatabaseUrl, DatabaseUrlError};

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the directory holding the database file.
    #[error("failed to create database directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open database {url}")]
    Open {
        /// Connection string.
        url: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Schema initialisation failed.
    #[error(transparent)]
    Schema(#[from] StoreSchemaError),
    /// Writing one record failed; the transaction was rolled back.
    #[error("failed to upsert {table} record {key:?}")]
    Upsert {
        /// Destination table.
        table: &'static str,
        /// Primary key of the failing record.
        key: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Any other SQLite operation failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// Operation label.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}
