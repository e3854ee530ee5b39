#![forbid(unsafe_code)]

use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `cardsync_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the `sets` and `cards` tables if they are missing.
///
/// Runs in one transaction and records [`SCHEMA_VERSION`]. A database
/// stamped with another version is rejected so migrations can be applied
/// explicitly. Calling this repeatedly is harmless.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use cardsync_data::store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("second run is a no-op");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM cardsync_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), StoreSchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| StoreSchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreSchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "create sets",
        "CREATE TABLE IF NOT EXISTS sets (
            code TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            set_type TEXT NOT NULL,
            released_at TEXT,
            card_count INTEGER NOT NULL,
            digital INTEGER NOT NULL,
            foil_only INTEGER NOT NULL DEFAULT 0,
            nonfoil_only INTEGER NOT NULL DEFAULT 0,
            icon_svg_uri TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create cards",
        "CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            mana_cost TEXT,
            cmc REAL,
            type_line TEXT,
            oracle_text TEXT,
            power TEXT,
            toughness TEXT,
            colors TEXT,
            color_identity TEXT NOT NULL,
            rarity TEXT NOT NULL,
            \"set\" TEXT NOT NULL,
            set_name TEXT NOT NULL,
            collector_number TEXT NOT NULL,
            artist TEXT,
            layout TEXT NOT NULL,
            all_parts TEXT
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "index cards by printing",
        "CREATE INDEX IF NOT EXISTS idx_cards_printing
            ON cards(\"set\", collector_number)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS cardsync_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM cardsync_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreSchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreSchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO cardsync_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreSchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreSchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreSchemaError::Migration { step, source })
}

/// Errors raised when initialising the store schema.
#[derive(Debug, Error)]
pub enum StoreSchemaError {
    /// A DDL or bookkeeping statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Step label.
        step: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: SqliteError,
    },
    /// The database was created by another schema version.
    #[error(
        "expected store schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}
