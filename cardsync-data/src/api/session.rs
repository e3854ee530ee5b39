//! Retrying transport session shared by the retrieval services.

use log::{debug, warn};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use super::config::{ApiConfig, RetryPolicy};
use super::error::{ApiError, is_retryable_status};
use super::exchange::{
    ApiRequest, ApiResponse, HttpExchange, ReqwestExchange, SessionBuildError, Sleeper,
    ThreadSleeper,
};

/// A reusable HTTP session with default headers and bounded retries.
///
/// Requests run strictly one after another on the calling thread. Transient
/// failures (HTTP 429/500/502/503/504, timeouts and connection failures) are
/// retried according to the [`RetryPolicy`]; everything else is returned at
/// once.
///
/// # Examples
///
/// ```
/// use cardsync_data::api::{ApiConfig, RetryPolicy, Session};
/// use cardsync_data::api::test_support::{RecordingSleeper, ScriptedExchange};
/// use serde_json::{Value, json};
/// use url::Url;
///
/// let exchange = ScriptedExchange::new()
///     .respond_status(503)
///     .respond_json(200, json!({"object": "list", "data": []}));
/// let sleeper = RecordingSleeper::new();
/// let session = Session::with_exchange(exchange.clone(), RetryPolicy::default(), sleeper.clone());
///
/// let url = Url::parse("https://api.example.test/sets").expect("valid URL");
/// let body: Value = session.get_json(url).expect("second attempt succeeds");
/// assert_eq!(body["object"], "list");
/// assert_eq!(exchange.request_count(), 2);
/// assert_eq!(sleeper.waits().len(), 1);
/// ```
pub struct Session {
    exchange: Box<dyn HttpExchange>,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a production session over `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionBuildError`] when the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, SessionBuildError> {
        let exchange = ReqwestExchange::new(config)?;
        Ok(Self::with_exchange(exchange, config.retry, ThreadSleeper))
    }

    /// Build a session over an arbitrary exchange and sleeper.
    pub fn with_exchange(
        exchange: impl HttpExchange + 'static,
        retry: RetryPolicy,
        sleeper: impl Sleeper + 'static,
    ) -> Self {
        Self {
            exchange: Box::new(exchange),
            retry,
            sleeper: Box::new(sleeper),
        }
    }

    /// Retry policy in force.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send `request`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for permanent HTTP failures,
    /// [`ApiError::Transport`] for permanent transport failures and
    /// [`ApiError::RetriesExhausted`] once the retry budget is spent.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut retries = 0;
        loop {
            let (failure, advised) = match self.exchange.send(request) {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if is_retryable_status(response.status) => {
                    let advised = response.retry_after;
                    (status_error(request, &response), advised)
                }
                Ok(response) => return Err(status_error(request, &response)),
                Err(err) if err.is_transient() => (ApiError::Transport(err), None),
                Err(err) => return Err(ApiError::Transport(err)),
            };

            if retries >= self.retry.max_retries {
                return Err(ApiError::RetriesExhausted {
                    method: request.method,
                    url: request.url.to_string(),
                    attempts: retries + 1,
                    last: Box::new(failure),
                });
            }

            retries += 1;
            let delay = self.retry.delay_for(retries, advised);
            warn!(
                "{} {} failed ({failure}); retry {retries}/{} in {delay:?}",
                request.method, request.url, self.retry.max_retries
            );
            self.sleeper.sleep(delay);
        }
    }

    /// `GET` `url` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// As [`Session::execute`], plus [`ApiError::Decode`] when the body does
    /// not match `T`.
    pub fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {url}");
        let response = self.execute(&ApiRequest::get(url.clone()))?;
        decode(&url, &response)
    }

    /// `POST` `body` as JSON to `url` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// As [`Session::get_json`], plus [`ApiError::Encode`] when `body`
    /// cannot be serialised.
    pub fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {url}");
        let payload = serde_json::to_value(body).map_err(|source| ApiError::Encode {
            url: url.to_string(),
            source,
        })?;
        let response = self.execute(&ApiRequest::post(url.clone(), payload))?;
        decode(&url, &response)
    }
}

fn decode<T: DeserializeOwned>(url: &Url, response: &ApiResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

#[derive(serde::Deserialize)]
struct ProviderErrorBody {
    details: Option<String>,
}

fn status_error(request: &ApiRequest, response: &ApiResponse) -> ApiError {
    let details = serde_json::from_slice::<ProviderErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.details)
        .or_else(|| {
            reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "unexpected status".to_owned());
    ApiError::Status {
        method: request.method,
        url: request.url.to_string(),
        status: response.status,
        details,
    }
}
