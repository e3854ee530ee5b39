//! Read-only checks against the live database.

use std::fmt;

use cardsync_core::RecordSchema;
use rusqlite::Connection;

use super::StoreError;
use super::persistence::quote_identifier;

/// One column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared `NOT NULL`.
    pub not_null: bool,
    /// Part of the primary key.
    pub primary_key: bool,
}

/// A difference between a [`RecordSchema`] and the live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDrift {
    /// The table does not exist.
    MissingTable {
        /// Table name.
        table: &'static str,
    },
    /// A validated field has no column.
    MissingColumn {
        /// Table name.
        table: &'static str,
        /// Field without a column.
        column: &'static str,
    },
    /// A column has no validated field.
    UnexpectedColumn {
        /// Table name.
        table: &'static str,
        /// Column without a field.
        column: String,
    },
    /// Column nullability disagrees with the field requirement.
    Nullability {
        /// Table name.
        table: &'static str,
        /// Affected column.
        column: &'static str,
        /// Whether the schema expects `NOT NULL`.
        expected_not_null: bool,
    },
    /// The primary key column differs.
    PrimaryKey {
        /// Table name.
        table: &'static str,
        /// Key declared by the schema.
        expected: &'static str,
        /// Key columns found in the table.
        found: Vec<String>,
    },
}

impl fmt::Display for ColumnDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTable { table } => write!(f, "table {table} does not exist"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table}.{column} is validated but has no column")
            }
            Self::UnexpectedColumn { table, column } => {
                write!(f, "{table}.{column} is a column with no validated field")
            }
            Self::Nullability {
                table,
                column,
                expected_not_null,
            } => {
                let expected = if *expected_not_null { "NOT NULL" } else { "nullable" };
                write!(f, "{table}.{column} should be {expected}")
            }
            Self::PrimaryKey {
                table,
                expected,
                found,
            } => write!(
                f,
                "{table} primary key should be {expected}, found [{}]",
                found.join(", ")
            ),
        }
    }
}

/// Check that the database answers a trivial query.
///
/// # Errors
///
/// Returns [`StoreError::Sqlite`] when the query fails.
pub fn ping(connection: &Connection) -> Result<(), StoreError> {
    connection
        .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
        .map_err(|source| StoreError::Sqlite {
            operation: "ping database",
            source,
        })
}

/// Number of rows stored for `schema`.
///
/// # Errors
///
/// Returns [`StoreError::Sqlite`] when the table is missing or the query
/// fails.
pub fn count_rows(connection: &Connection, schema: &RecordSchema) -> Result<u64, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(schema.table));
    let count: i64 = connection
        .query_row(&sql, [], |row| row.get(0))
        .map_err(|source| StoreError::Sqlite {
            operation: "count rows",
            source,
        })?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Columns of `table` in declaration order; empty when the table is missing.
///
/// # Errors
///
/// Returns [`StoreError::Sqlite`] when the pragma query fails.
pub fn table_columns(connection: &Connection, table: &str) -> Result<Vec<ColumnInfo>, StoreError> {
    let describe = |source: rusqlite::Error| StoreError::Sqlite {
        operation: "read table definition",
        source,
    };
    let mut statement = connection
        .prepare("SELECT name, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(describe)?;
    let columns = statement
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                not_null: row.get(1)?,
                primary_key: row.get::<_, i64>(2)? > 0,
            })
        })
        .map_err(describe)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(describe)?;
    Ok(columns)
}

/// Compare the live table for `schema` with its validated fields.
///
/// Returns every difference found; an empty list means the validator and
/// the table agree on column set, nullability and primary key.
///
/// # Errors
///
/// Returns [`StoreError::Sqlite`] when the table definition cannot be read.
pub fn verify_alignment(
    connection: &Connection,
    schema: &'static RecordSchema,
) -> Result<Vec<ColumnDrift>, StoreError> {
    let columns = table_columns(connection, schema.table)?;
    if columns.is_empty() {
        return Ok(vec![ColumnDrift::MissingTable {
            table: schema.table,
        }]);
    }

    let mut drift = Vec::new();
    for field in schema.fields {
        match columns.iter().find(|column| column.name == field.name) {
            None => drift.push(ColumnDrift::MissingColumn {
                table: schema.table,
                column: field.name,
            }),
            Some(column) if column.not_null != field.requirement.is_not_null() => {
                drift.push(ColumnDrift::Nullability {
                    table: schema.table,
                    column: field.name,
                    expected_not_null: field.requirement.is_not_null(),
                });
            }
            Some(_) => {}
        }
    }
    drift.extend(
        columns
            .iter()
            .filter(|column| schema.field(&column.name).is_none())
            .map(|column| ColumnDrift::UnexpectedColumn {
                table: schema.table,
                column: column.name.clone(),
            }),
    );

    let keys: Vec<String> = columns
        .iter()
        .filter(|column| column.primary_key)
        .map(|column| column.name.clone())
        .collect();
    if keys != [schema.primary_key] {
        drift.push(ColumnDrift::PrimaryKey {
            table: schema.table,
            expected: schema.primary_key,
            found: keys,
        });
    }
    Ok(drift)
}
