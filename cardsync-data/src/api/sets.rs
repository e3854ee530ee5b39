//! Set catalog retrieval.

use cardsync_core::RawRecord;
use log::info;
use serde::Deserialize;
use thiserror::Error;

use super::endpoints::ApiEndpoints;
use super::error::ApiError;
use super::session::Session;

/// Errors returned by [`SetsService`].
#[derive(Debug, Error)]
pub enum SetsError {
    /// The requested set code was blank.
    #[error("set code must not be blank")]
    BlankCode,
    /// The provider request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Deserialize)]
struct SetList {
    #[serde(default)]
    data: Vec<RawRecord>,
}

/// Fetches the set catalog or individual sets.
#[derive(Debug, Clone, Copy)]
pub struct SetsService<'s> {
    session: &'s Session,
    endpoints: &'s ApiEndpoints,
}

impl<'s> SetsService<'s> {
    /// Create a service over a shared session.
    #[must_use]
    pub const fn new(session: &'s Session, endpoints: &'s ApiEndpoints) -> Self {
        Self { session, endpoints }
    }

    /// Fetch every set in the catalog.
    ///
    /// A payload without a `data` list is an empty catalog, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SetsError::Api`] when the request fails after retries.
    pub fn get_sets(&self) -> Result<Vec<RawRecord>, SetsError> {
        let list: SetList = self.session.get_json(self.endpoints.set_url(None))?;
        info!("fetched {} sets from the catalog", list.data.len());
        Ok(list.data)
    }

    /// Fetch a single set by code.
    ///
    /// The provider returns the set object without a wrapper key. An unknown
    /// code surfaces as an HTTP 404 [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`SetsError::BlankCode`] before any request for a blank code,
    /// otherwise [`SetsError::Api`] when the request fails.
    pub fn get_set(&self, code: &str) -> Result<RawRecord, SetsError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SetsError::BlankCode);
        }
        let set: RawRecord = self.session.get_json(self.endpoints.set_url(Some(code)))?;
        info!("fetched set {code}");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::RetryPolicy;
    use crate::api::test_support::{RecordingSleeper, ScriptedExchange, set_json};
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn endpoints() -> ApiEndpoints {
        ApiEndpoints::new("https://api.example.test").expect("valid base URL")
    }

    fn session(exchange: &ScriptedExchange) -> Session {
        Session::with_exchange(
            exchange.clone(),
            RetryPolicy::default(),
            RecordingSleeper::new(),
        )
    }

    #[rstest]
    fn get_sets_returns_data_list(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new().respond_json(
            200,
            json!({"object": "list", "has_more": false, "data": [set_json("tdm"), set_json("fdn")]}),
        );
        let session = session(&exchange);

        let sets = SetsService::new(&session, &endpoints)
            .get_sets()
            .expect("catalog should load");

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1]["code"], "fdn");
        assert_eq!(
            exchange.requests()[0].url.as_str(),
            "https://api.example.test/sets"
        );
    }

    #[rstest]
    fn get_sets_without_data_key_is_empty(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new().respond_json(200, json!({"object": "list"}));
        let session = session(&exchange);

        let sets = SetsService::new(&session, &endpoints)
            .get_sets()
            .expect("catalog should load");

        assert!(sets.is_empty());
    }

    #[rstest]
    fn get_set_returns_unwrapped_object(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new().respond_json(200, set_json("tdm"));
        let session = session(&exchange);

        let set = SetsService::new(&session, &endpoints)
            .get_set(" tdm ")
            .expect("set should load");

        assert_eq!(set["code"], "tdm");
        assert_eq!(
            exchange.requests()[0].url.as_str(),
            "https://api.example.test/sets/tdm"
        );
    }

    #[rstest]
    fn unknown_set_is_not_found(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new().respond_json(
            404,
            json!({"object": "error", "code": "not_found", "status": 404, "details": "No set found for the given code"}),
        );
        let session = session(&exchange);

        let err = SetsService::new(&session, &endpoints)
            .get_set("zzz")
            .expect_err("should fail");

        match err {
            SetsError::Api(api) => assert_eq!(api.status(), Some(404)),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[rstest]
    fn blank_code_makes_no_request(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new();
        let session = session(&exchange);

        let err = SetsService::new(&session, &endpoints)
            .get_set("  ")
            .expect_err("should fail");

        assert!(matches!(err, SetsError::BlankCode));
        assert_eq!(exchange.request_count(), 0);
    }

    #[rstest]
    fn catalog_that_is_not_a_list_object_is_a_decode_error(endpoints: ApiEndpoints) {
        let exchange = ScriptedExchange::new().respond_json(200, json!({"data": "nope"}));
        let session = session(&exchange);

        let err = SetsService::new(&session, &endpoints)
            .get_sets()
            .expect_err("should fail");

        assert!(matches!(err, SetsError::Api(ApiError::Decode { .. })));
    }
}
