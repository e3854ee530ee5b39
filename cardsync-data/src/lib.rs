//! Provider access, persistence and ingestion for cardsync.
//!
//! Responsibilities:
//! - Talk to the card provider's HTTP API with retries and pacing.
//! - Persist validated set and card records into SQLite.
//! - Orchestrate fetch, validate and persist runs.
//!
//! Boundaries:
//! - Record shapes and validation live in `cardsync-core`.
//! - Network calls are blocking at the public surface; the async HTTP
//!   client is driven by an owned runtime.
//!
//! Invariants:
//! - No record reaches the store without passing validation.
//! - A run writes all of its records or none of them.
//! - No global mutable state.

pub mod api;
pub mod ingest;
pub mod store;

pub use ingest::{ErrorKind, IngestError, IngestReport, ingest_cards, ingest_set, ingest_sets};
