//! Batched, paced card retrieval through the collection endpoint.

use std::collections::HashSet;
use std::time::Duration;

use cardsync_core::{Identifier, IdentifierError, RawRecord};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use super::config::{ApiConfig, MAX_BATCH};
use super::endpoints::{ApiEndpoints, BatchTooLargeError};
use super::error::ApiError;
use super::exchange::{Sleeper, ThreadSleeper};
use super::session::Session;

/// Cards found and identifiers the provider reported as unknown.
///
/// The two sides are disjoint and together hold at most the number of
/// distinct identifiers requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionResult {
    /// Card records in provider order.
    pub found: Vec<RawRecord>,
    /// Requested identifiers the provider could not match.
    pub not_found: Vec<Identifier>,
}

impl CollectionResult {
    /// Whether nothing was found or reported missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.not_found.is_empty()
    }
}

/// Errors returned by [`CardsService::get_cards_collection`].
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The configured batch size is outside `1..=MAX_BATCH`.
    #[error("batch size {size} is outside 1..={limit}")]
    InvalidBatchSize {
        /// Configured size.
        size: usize,
        /// Provider ceiling.
        limit: usize,
    },
    /// A supplied identifier can never match.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),
    /// A batch exceeded the provider ceiling.
    #[error(transparent)]
    BatchTooLarge(#[from] BatchTooLargeError),
    /// A batch failed; results of earlier batches are discarded.
    #[error("collection batch {batch} of {batches} failed")]
    Batch {
        /// 1-based number of the failed batch.
        batch: usize,
        /// Total batches in the retrieval.
        batches: usize,
        /// Underlying request failure.
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    data: Vec<RawRecord>,
    #[serde(default)]
    not_found: Vec<Identifier>,
}

/// Fetches cards by identifier, chunked into provider-sized batches.
///
/// Batches are sent strictly in order with a blocking pause before every
/// batch after the first. Retrieval is all-or-nothing: if any batch fails
/// the whole call fails.
pub struct CardsService<'s> {
    session: &'s Session,
    endpoints: &'s ApiEndpoints,
    batch_size: usize,
    batch_delay: Duration,
    pacer: Box<dyn Sleeper + 's>,
}

impl std::fmt::Debug for CardsService<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardsService")
            .field("session", &self.session)
            .field("endpoints", &self.endpoints)
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .finish_non_exhaustive()
    }
}

impl<'s> CardsService<'s> {
    /// Create a service using the batch settings from `config`.
    #[must_use]
    pub fn new(session: &'s Session, endpoints: &'s ApiEndpoints, config: &ApiConfig) -> Self {
        Self::with_pacer(session, endpoints, config, ThreadSleeper)
    }

    /// Create a service with a custom pacing sleeper.
    #[must_use]
    pub fn with_pacer(
        session: &'s Session,
        endpoints: &'s ApiEndpoints,
        config: &ApiConfig,
        pacer: impl Sleeper + 's,
    ) -> Self {
        Self {
            session,
            endpoints,
            batch_size: config.batch_size,
            batch_delay: config.batch_delay,
            pacer: Box::new(pacer),
        }
    }

    /// Fetch cards for `identifiers`.
    ///
    /// An empty input returns an empty result without any request. Repeated
    /// identifiers are requested once. Not-found identifiers are logged as a
    /// warning and returned, never treated as an error.
    ///
    /// # Errors
    ///
    /// Contract violations ([`CollectionError::InvalidBatchSize`],
    /// [`CollectionError::InvalidIdentifier`]) are raised before any request.
    /// A failing batch yields [`CollectionError::Batch`].
    pub fn get_cards_collection(
        &self,
        identifiers: &[Identifier],
    ) -> Result<CollectionResult, CollectionError> {
        if identifiers.is_empty() {
            return Ok(CollectionResult::default());
        }
        if !(1..=MAX_BATCH).contains(&self.batch_size) {
            return Err(CollectionError::InvalidBatchSize {
                size: self.batch_size,
                limit: MAX_BATCH,
            });
        }
        for identifier in identifiers {
            identifier.validate()?;
        }

        let unique = dedupe(identifiers);
        let batches = unique.len().div_ceil(self.batch_size);
        let url = self.endpoints.collection_url();
        let mut result = CollectionResult::default();

        for (index, batch) in unique.chunks(self.batch_size).enumerate() {
            if index > 0 {
                debug!("pausing {:?} before batch {}", self.batch_delay, index + 1);
                self.pacer.sleep(self.batch_delay);
            }
            let request = ApiEndpoints::collection_request(batch)?;
            let response: CollectionResponse = self
                .session
                .post_json(url.clone(), &request)
                .map_err(|source| CollectionError::Batch {
                    batch: index + 1,
                    batches,
                    source,
                })?;
            let (found, not_found) = reconcile(batch, response);
            info!(
                "batch {}/{batches}: {} found, {} not found",
                index + 1,
                found.len(),
                not_found.len()
            );
            result.found.extend(found);
            result.not_found.extend(not_found);
        }

        if !result.not_found.is_empty() {
            let missing: Vec<String> = result.not_found.iter().map(ToString::to_string).collect();
            warn!(
                "{} identifiers not found: {}",
                missing.len(),
                missing.join(", ")
            );
        }
        Ok(result)
    }
}

fn dedupe(identifiers: &[Identifier]) -> Vec<Identifier> {
    let mut seen = HashSet::with_capacity(identifiers.len());
    identifiers
        .iter()
        .filter(|identifier| {
            seen.insert((
                identifier.set.to_ascii_lowercase(),
                identifier.collector_number.clone(),
            ))
        })
        .cloned()
        .collect()
}

/// Keep both sides within the batch, free of duplicates and disjoint.
///
/// Set codes are compared case-insensitively.
fn reconcile(batch: &[Identifier], response: CollectionResponse) -> (Vec<RawRecord>, Vec<Identifier>) {
    let CollectionResponse { data, not_found } = response;

    let mut claimed = vec![false; batch.len()];
    let found: Vec<RawRecord> = data
        .into_iter()
        .filter(|card| {
            let slot = batch
                .iter()
                .position(|id| id.matches_record(card))
                .and_then(|index| claimed.get_mut(index));
            match slot {
                Some(taken) if !*taken => {
                    *taken = true;
                    true
                }
                Some(_) => {
                    warn!("ignoring duplicate card {}", describe_card(card));
                    false
                }
                None => {
                    warn!("ignoring card {} that was not requested", describe_card(card));
                    false
                }
            }
        })
        .collect();

    let mut reported: Vec<Identifier> = Vec::new();
    for identifier in not_found {
        if !batch.iter().any(|wanted| wanted.same_printing(&identifier)) {
            warn!("ignoring not-found entry {identifier} that was not requested");
            continue;
        }
        if found.iter().any(|card| identifier.matches_record(card)) {
            warn!("ignoring not-found entry {identifier} that was also returned");
            continue;
        }
        if reported.iter().any(|seen| seen.same_printing(&identifier)) {
            continue;
        }
        reported.push(identifier);
    }
    (found, reported)
}

fn describe_card(card: &RawRecord) -> String {
    let field = |name: &str| {
        card.get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("?")
    };
    format!("{}:{}", field("set"), field("collector_number"))
}
