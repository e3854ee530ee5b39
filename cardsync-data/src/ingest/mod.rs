//! Fetch, validate and persist pipeline.
//!
//! Each entry point performs one full run: retrieve from the provider,
//! validate every record, then write them all in one transaction. A schema
//! violation anywhere aborts the run before the first write.

use cardsync_core::{
    CARD_SCHEMA, Identifier, RawRecord, RecordSchema, SET_SCHEMA, SchemaViolation, validate_all,
};
use log::{error, info};
use thiserror::Error;

use crate::api::{CardsService, CollectionError, SetsError, SetsService};
use crate::store::{ConnectionFactory, StoreError, persist_records};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Destination table.
    pub table: &'static str,
    /// Records received from the provider.
    pub fetched: usize,
    /// Records written.
    pub persisted: usize,
    /// Identifiers the provider could not match.
    pub not_found: Vec<Identifier>,
}

/// Broad class of an [`IngestError`], for callers that react per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied unusable input; nothing was requested.
    Contract,
    /// The provider could not be reached or answered with an error.
    Network,
    /// A record did not match its schema; nothing was written.
    Validation,
    /// The store rejected the write; the transaction was rolled back.
    Persistence,
}

/// Errors returned by the ingestion entry points.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Set retrieval failed.
    #[error("failed to fetch sets")]
    Sets(#[from] SetsError),
    /// Card retrieval failed.
    #[error("failed to fetch cards")]
    Cards(#[from] CollectionError),
    /// A fetched record failed validation.
    #[error("fetched record failed validation; nothing was written")]
    Validation(#[from] SchemaViolation),
    /// Writing the validated records failed.
    #[error("failed to persist records")]
    Persistence(#[from] StoreError),
}

impl IngestError {
    /// Class of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Sets(SetsError::BlankCode)
            | Self::Cards(
                CollectionError::InvalidBatchSize { .. }
                | CollectionError::InvalidIdentifier(_)
                | CollectionError::BatchTooLarge(_),
            ) => ErrorKind::Contract,
            Self::Sets(SetsError::Api(_)) | Self::Cards(CollectionError::Batch { .. }) => {
                ErrorKind::Network
            }
            Self::Validation(_) => ErrorKind::Validation,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Whether running the same ingestion again later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sets(SetsError::Api(source))
            | Self::Cards(CollectionError::Batch { source, .. }) => source.is_transient(),
            _ => false,
        }
    }
}

/// Fetch the whole set catalog and upsert it.
///
/// # Errors
///
/// Returns [`IngestError`] when retrieval, validation or persistence fails.
pub fn ingest_sets(
    sets: &SetsService<'_>,
    factory: &impl ConnectionFactory,
) -> Result<IngestReport, IngestError> {
    let raws = sets.get_sets()?;
    store(&SET_SCHEMA, &raws, factory, Vec::new())
}

/// Fetch one set by code and upsert it.
///
/// # Errors
///
/// Returns [`IngestError`] when retrieval, validation or persistence fails.
pub fn ingest_set(
    sets: &SetsService<'_>,
    factory: &impl ConnectionFactory,
    code: &str,
) -> Result<IngestReport, IngestError> {
    let raw = sets.get_set(code)?;
    store(&SET_SCHEMA, std::slice::from_ref(&raw), factory, Vec::new())
}

/// Fetch cards by identifier and upsert those found.
///
/// Identifiers the provider does not know are returned in the report.
///
/// # Errors
///
/// Returns [`IngestError`] when retrieval, validation or persistence fails.
pub fn ingest_cards(
    cards: &CardsService<'_>,
    factory: &impl ConnectionFactory,
    identifiers: &[Identifier],
) -> Result<IngestReport, IngestError> {
    let result = cards.get_cards_collection(identifiers)?;
    store(&CARD_SCHEMA, &result.found, factory, result.not_found)
}

fn store(
    schema: &'static RecordSchema,
    raws: &[RawRecord],
    factory: &impl ConnectionFactory,
    not_found: Vec<Identifier>,
) -> Result<IngestReport, IngestError> {
    let records = validate_all(schema, raws).inspect_err(|violation| {
        error!("aborting {} ingestion: {violation}", schema.table);
    })?;
    let persisted = persist_records(factory, &records)?;
    info!(
        "{}: fetched {}, persisted {persisted}, not found {}",
        schema.table,
        raws.len(),
        not_found.len()
    );
    Ok(IngestReport {
        table: schema.table,
        fetched: raws.len(),
        persisted,
        not_found,
    })
}
