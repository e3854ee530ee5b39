//! Allow-list validation of provider records.
//!
//! A [`RecordSchema`] names the destination table, its natural key and the
//! fields that may be persisted. [`validate`] turns a raw provider object
//! into a [`ValidatedRecord`] holding exactly those fields, in column order,
//! or reports the first [`SchemaViolation`].

mod catalog;
mod field;
mod validate;

pub use catalog::{CARD_SCHEMA, SET_SCHEMA};
pub use field::{DefaultValue, FieldKind, FieldSpec, FieldValue, RecordSchema, Requirement};
pub use validate::{SchemaViolation, ValidatedRecord, validate, validate_all};

#[cfg(test)]
mod tests;
