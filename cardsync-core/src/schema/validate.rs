use serde_json::Value;
use thiserror::Error;

use super::field::{FieldKind, FieldSpec, FieldValue, RecordSchema, Requirement};
use crate::RawRecord;

const UNKEYED: &str = "<unkeyed>";

/// A record that passed validation against a [`RecordSchema`].
///
/// Values are ordered like `schema.fields`; fields outside the schema have
/// been discarded and defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    schema: &'static RecordSchema,
    values: Vec<FieldValue>,
}

impl ValidatedRecord {
    /// Schema the record was validated against.
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Values in column order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Value of the field `name`, if the schema declares it.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema
            .position(name)
            .and_then(|index| self.values.get(index))
    }

    /// Primary key value as text.
    pub fn key(&self) -> Option<&str> {
        self.get(self.schema.primary_key)
            .and_then(FieldValue::as_text)
    }
}

/// Reasons a record is refused before persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A required field was absent or null.
    #[error("{table} record {record}: required field '{field}' is missing")]
    Missing {
        /// Destination table.
        table: &'static str,
        /// Primary key of the offending record, when known.
        record: String,
        /// Missing field.
        field: &'static str,
    },
    /// A field held a JSON value of the wrong shape.
    #[error("{table} record {record}: field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        /// Destination table.
        table: &'static str,
        /// Primary key of the offending record, when known.
        record: String,
        /// Mismatched field.
        field: &'static str,
        /// Declared kind.
        expected: FieldKind,
        /// JSON type actually received.
        found: &'static str,
    },
}

impl SchemaViolation {
    /// Name of the field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field, .. } | Self::TypeMismatch { field, .. } => field,
        }
    }
}

/// Validate one provider record against `schema`.
///
/// Every declared field is checked: required fields must be present with an
/// acceptable JSON type, optional fields fall back to `NULL` or their
/// default, and undeclared fields are dropped. A JSON `null` counts as
/// absent.
///
/// # Examples
///
/// ```
/// use cardsync_core::{SET_SCHEMA, FieldValue, validate};
/// use serde_json::json;
///
/// let raw = json!({
///     "object": "set",
///     "code": "tdm",
///     "name": "Tarkir: Dragonstorm",
///     "set_type": "expansion",
///     "released_at": "2025-04-11",
///     "card_count": 286,
///     "digital": false,
///     "icon_svg_uri": "https://svgs.scryfall.io/sets/tdm.svg"
/// });
/// let record = validate(&SET_SCHEMA, raw.as_object().expect("object"))
///     .expect("set should validate");
/// assert_eq!(record.key(), Some("tdm"));
/// assert_eq!(record.get("foil_only"), Some(&FieldValue::Boolean(false)));
/// assert_eq!(record.get("object"), None);
/// ```
pub fn validate(
    schema: &'static RecordSchema,
    raw: &RawRecord,
) -> Result<ValidatedRecord, SchemaViolation> {
    let record = record_key(schema, raw);
    let values = schema
        .fields
        .iter()
        .map(|field| validate_field(schema, field, raw.get(field.name), &record))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ValidatedRecord { schema, values })
}

/// Validate a whole run, stopping at the first violation.
///
/// Nothing from a run is persisted unless every record validates, so the
/// caller receives either all validated records or the first failure.
pub fn validate_all<'r>(
    schema: &'static RecordSchema,
    raws: impl IntoIterator<Item = &'r RawRecord>,
) -> Result<Vec<ValidatedRecord>, SchemaViolation> {
    raws.into_iter().map(|raw| validate(schema, raw)).collect()
}

fn validate_field(
    schema: &RecordSchema,
    field: &FieldSpec,
    value: Option<&Value>,
    record: &str,
) -> Result<FieldValue, SchemaViolation> {
    let Some(present) = value.filter(|candidate| !candidate.is_null()) else {
        return match field.requirement {
            Requirement::Required => Err(SchemaViolation::Missing {
                table: schema.table,
                record: record.to_owned(),
                field: field.name,
            }),
            Requirement::Nullable => Ok(FieldValue::Null),
            Requirement::Default(default) => Ok(default.into()),
        };
    };

    field
        .kind
        .coerce(present)
        .ok_or_else(|| SchemaViolation::TypeMismatch {
            table: schema.table,
            record: record.to_owned(),
            field: field.name,
            expected: field.kind,
            found: json_type_name(present),
        })
}

fn record_key(schema: &RecordSchema, raw: &RawRecord) -> String {
    match raw.get(schema.primary_key) {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Number(key)) => key.to_string(),
        _ => UNKEYED.to_owned(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "real",
        Value::Number(_) => "integer",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
