//! URL and request-body construction for the provider's endpoints.
//!
//! Everything here is pure: no network access, only string and URL
//! manipulation.

use cardsync_core::Identifier;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::config::MAX_BATCH;

/// Errors raised when parsing the configured base URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The base URL could not be parsed.
    #[error("invalid API base URL {url:?}")]
    Parse {
        /// Offending URL.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL is not an `http` or `https` URL with a path.
    #[error("API base URL {url:?} must be an http(s) URL")]
    Scheme {
        /// Offending URL.
        url: String,
    },
}

/// A collection request holding more identifiers than the provider accepts.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("collection request holds {size} identifiers; the provider accepts at most {limit}")]
pub struct BatchTooLargeError {
    /// Identifiers supplied.
    pub size: usize,
    /// Provider ceiling.
    pub limit: usize,
}

/// Body of a collection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionRequest<'a> {
    /// Identifiers in request order.
    pub identifiers: &'a [Identifier],
}

/// Resolves provider URLs relative to a validated base URL.
///
/// # Examples
///
/// ```
/// use cardsync_data::api::ApiEndpoints;
///
/// let endpoints = ApiEndpoints::new("https://api.scryfall.com").expect("valid base URL");
/// assert_eq!(endpoints.set_url(None).as_str(), "https://api.scryfall.com/sets");
/// assert_eq!(
///     endpoints.set_url(Some("tdm")).as_str(),
///     "https://api.scryfall.com/sets/tdm"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base: Url,
}

impl ApiEndpoints {
    /// Parse and validate `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when the URL does not parse or is not an
    /// `http(s)` URL.
    pub fn new(base_url: &str) -> Result<Self, EndpointError> {
        let base = Url::parse(base_url).map_err(|source| EndpointError::Parse {
            url: base_url.to_owned(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(EndpointError::Scheme {
                url: base_url.to_owned(),
            });
        }
        Ok(Self { base })
    }

    /// Base URL as configured.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Catalog URL when `code` is `None`, otherwise the single-set URL.
    ///
    /// The code is percent-encoded as one path segment.
    #[must_use]
    pub fn set_url(&self, code: Option<&str>) -> Url {
        match code {
            Some(code) => self.endpoint(&["sets", code]),
            None => self.endpoint(&["sets"]),
        }
    }

    /// Collection endpoint URL.
    #[must_use]
    pub fn collection_url(&self) -> Url {
        self.endpoint(&["cards", "collection"])
    }

    /// Build a collection request body for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchTooLargeError`] when `identifiers` exceeds
    /// [`MAX_BATCH`].
    pub fn collection_request(
        identifiers: &[Identifier],
    ) -> Result<CollectionRequest<'_>, BatchTooLargeError> {
        if identifiers.len() > MAX_BATCH {
            return Err(BatchTooLargeError {
                size: identifiers.len(),
                limit: MAX_BATCH,
            });
        }
        Ok(CollectionRequest { identifiers })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Cannot-be-a-base URLs are rejected in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
