//! Field and record shape declarations shared by validation and storage.

use std::fmt;

use serde_json::Value;

/// Accepted JSON shape of a field and how it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string.
    Text,
    /// JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Real,
    /// JSON boolean.
    Boolean,
    /// JSON array of strings, stored as JSON text.
    TextList,
    /// JSON array or object, stored as JSON text.
    Json,
}

impl FieldKind {
    /// Lowercase name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::TextList => "list of text",
            Self::Json => "JSON array or object",
        }
    }

    /// Convert `value` into its storage form, or `None` when the JSON shape
    /// does not fit this kind.
    pub(crate) fn coerce(self, value: &Value) -> Option<FieldValue> {
        match self {
            Self::Text => value.as_str().map(|text| FieldValue::Text(text.to_owned())),
            Self::Integer => value.as_i64().map(FieldValue::Integer),
            Self::Real => value.as_f64().map(FieldValue::Real),
            Self::Boolean => value.as_bool().map(FieldValue::Boolean),
            Self::TextList => value
                .as_array()
                .filter(|items| items.iter().all(Value::is_string))
                .map(|_| FieldValue::Json(value.to_string())),
            Self::Json => (value.is_array() || value.is_object())
                .then(|| FieldValue::Json(value.to_string())),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default applied when an optional field is absent or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Text default.
    Text(&'static str),
}

impl From<DefaultValue> for FieldValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Boolean(flag) => Self::Boolean(flag),
            DefaultValue::Integer(number) => Self::Integer(number),
            DefaultValue::Text(text) => Self::Text(text.to_owned()),
        }
    }
}

/// How a missing or null field is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The field must be present and non-null.
    Required,
    /// Absent or null becomes SQL `NULL`.
    Nullable,
    /// Absent or null becomes the given default.
    Default(DefaultValue),
}

impl Requirement {
    /// Whether the stored column can never hold `NULL`.
    pub const fn is_not_null(self) -> bool {
        !matches!(self, Self::Nullable)
    }
}

/// One allow-listed field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in the provider payload and column name in storage.
    pub name: &'static str,
    /// Expected JSON shape.
    pub kind: FieldKind,
    /// Treatment of absent or null values.
    pub requirement: Requirement,
}

impl FieldSpec {
    /// A field that must be present.
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Required,
        }
    }

    /// A field stored as `NULL` when absent.
    pub const fn nullable(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Nullable,
        }
    }

    /// A field replaced by `default` when absent.
    pub const fn with_default(name: &'static str, kind: FieldKind, default: DefaultValue) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Default(default),
        }
    }
}

/// Declarative shape of one record type and the table that stores it.
///
/// The field list doubles as the persistence column list, so validation and
/// storage cannot drift apart silently.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    /// Destination table.
    pub table: &'static str,
    /// Natural primary key; must name one of `fields`.
    pub primary_key: &'static str,
    /// Allow-listed fields in column order.
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    /// Field names in column order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Position of `name` within `fields`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// A validated value ready to be bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// SQL `NULL`.
    Null,
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Boolean value.
    Boolean(bool),
    /// Compact JSON text.
    Json(String),
}

impl FieldValue {
    /// Borrow the value as text when it is [`FieldValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
