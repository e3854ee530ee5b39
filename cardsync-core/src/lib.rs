//! Core domain types for the cardsync pipeline.
//!
//! This crate holds the provider-independent pieces: card identifiers and
//! the allow-list schemas that every record must satisfy before it is
//! written. Nothing here performs I/O.

pub mod identifier;
pub mod schema;

pub use identifier::{Identifier, IdentifierError};
pub use schema::{
    CARD_SCHEMA, DefaultValue, FieldKind, FieldSpec, FieldValue, RecordSchema, Requirement,
    SET_SCHEMA, SchemaViolation, ValidatedRecord, validate, validate_all,
};

/// A provider record as decoded from JSON, before validation.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
