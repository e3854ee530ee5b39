#![forbid(unsafe_code)]

use std::collections::HashMap;

use cardsync_core::{FieldValue, RecordSchema, ValidatedRecord};
use log::{debug, info};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use super::StoreError;
use super::connection::ConnectionFactory;
use super::schema::initialise_schema;

/// Insert or update `records` in a single transaction.
///
/// Rows are keyed on each schema's primary key; on conflict every other
/// column is overwritten with the incoming value (last write wins). If any
/// row fails the transaction is rolled back and nothing from this call is
/// kept. Records of different schemas may be mixed.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns [`StoreError::Upsert`] naming the table and key of the first
/// record that could not be written, and [`StoreError::Sqlite`] when the
/// transaction cannot be opened, a statement cannot be prepared or the
/// commit fails. Nothing from this call is kept in either case.
///
/// # Examples
/// ```
/// use cardsync_core::{SET_SCHEMA, validate};
/// use cardsync_data::store::{initialise_schema, upsert_records};
/// use rusqlite::Connection;
/// use serde_json::json;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// let raw = json!({
///     "code": "tdm", "name": "Tarkir: Dragonstorm", "set_type": "expansion",
///     "released_at": "2025-04-11", "card_count": 286, "digital": false,
///     "icon_svg_uri": "https://svgs.scryfall.io/sets/tdm.svg"
/// });
/// let record = validate(&SET_SCHEMA, raw.as_object().expect("object")).expect("valid set");
///
/// upsert_records(&mut conn, &[record.clone()]).expect("first write");
/// upsert_records(&mut conn, &[record]).expect("second write");
/// let rows: i64 = conn
///     .query_row("SELECT COUNT(*) FROM sets", [], |row| row.get(0))
///     .expect("count rows");
/// assert_eq!(rows, 1);
/// ```
pub fn upsert_records(
    connection: &mut Connection,
    records: &[ValidatedRecord],
) -> Result<usize, StoreError> {
    if records.is_empty() {
        return Ok(0);
    }

    // Dropping the transaction without committing rolls it back.
    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Sqlite {
            operation: "begin upsert transaction",
            source,
        })?;

    {
        let mut statements: HashMap<&'static str, String> = HashMap::new();
        for record in records {
            let schema = record.schema();
            let sql = statements
                .entry(schema.table)
                .or_insert_with(|| upsert_sql(schema));
            let mut statement =
                transaction
                    .prepare_cached(sql)
                    .map_err(|source| StoreError::Sqlite {
                        operation: "prepare upsert",
                        source,
                    })?;
            statement
                .execute(params_from_iter(record.values().iter().map(sql_value)))
                .map_err(|source| StoreError::Upsert {
                    table: schema.table,
                    key: record.key().unwrap_or_default().to_owned(),
                    source,
                })?;
        }
    }

    transaction.commit().map_err(|source| StoreError::Sqlite {
        operation: "commit upsert transaction",
        source,
    })?;
    debug!("upserted {} records", records.len());
    Ok(records.len())
}

/// Open a connection, ensure the schema and upsert `records`.
///
/// The connection lives only for this call and is closed on every exit
/// path.
///
/// # Errors
///
/// Returns [`StoreError`] when the connection, schema initialisation or any
/// write fails; writes from this call are rolled back in that case.
pub fn persist_records(
    factory: &impl ConnectionFactory,
    records: &[ValidatedRecord],
) -> Result<usize, StoreError> {
    let mut connection = factory.connect()?;
    initialise_schema(&mut connection)?;
    let written = upsert_records(&mut connection, records)?;
    info!("persisted {written} records");
    Ok(written)
}

/// Upsert statement for `schema`, binding fields as `?1..?n` in order.
///
/// # Examples
/// ```
/// use cardsync_core::{FieldKind, FieldSpec, RecordSchema};
/// use cardsync_data::store::upsert_sql;
///
/// static TAGS: RecordSchema = RecordSchema {
///     table: "tags",
///     primary_key: "id",
///     fields: &[
///         FieldSpec::required("id", FieldKind::Text),
///         FieldSpec::nullable("label", FieldKind::Text),
///     ],
/// };
/// assert_eq!(
///     upsert_sql(&TAGS),
///     "INSERT INTO \"tags\" (\"id\", \"label\") VALUES (?1, ?2) \
///      ON CONFLICT(\"id\") DO UPDATE SET \"label\" = excluded.\"label\""
/// );
/// ```
#[must_use]
pub fn upsert_sql(schema: &RecordSchema) -> String {
    let columns: Vec<String> = schema.field_names().map(quote_identifier).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|index| format!("?{index}")).collect();
    let updates: Vec<String> = schema
        .field_names()
        .filter(|name| *name != schema.primary_key)
        .map(|name| {
            let column = quote_identifier(name);
            format!("{column} = excluded.{column}")
        })
        .collect();
    let action = if updates.is_empty() {
        "DO NOTHING".to_owned()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };
    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {action}",
        quote_identifier(schema.table),
        columns.join(", "),
        placeholders.join(", "),
        quote_identifier(schema.primary_key),
    )
}

pub(super) fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn sql_value(value: &FieldValue) -> SqlValue {
    match value {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Text(text) | FieldValue::Json(text) => SqlValue::Text(text.clone()),
        FieldValue::Integer(number) => SqlValue::Integer(*number),
        FieldValue::Real(number) => SqlValue::Real(*number),
        FieldValue::Boolean(flag) => SqlValue::Integer(i64::from(*flag)),
    }
}
