//! Facade crate for cardsync.
//!
//! Re-exports the record schemas and validator from `cardsync-core` and, with
//! the `data` feature, the provider client, store and ingestion pipeline
//! from `cardsync-data`.

#![forbid(unsafe_code)]

pub use cardsync_core::{
    CARD_SCHEMA, FieldKind, FieldSpec, FieldValue, Identifier, IdentifierError, RawRecord,
    RecordSchema, Requirement, SET_SCHEMA, SchemaViolation, ValidatedRecord, validate,
    validate_all,
};

#[cfg(feature = "data")]
pub use cardsync_data::{
    ErrorKind, IngestError, IngestReport, api, ingest_cards, ingest_set, ingest_sets, store,
};
