//! Raw request/response exchange and blocking waits.
//!
//! [`HttpExchange`] is the seam between [`super::Session`] and the network.
//! [`ReqwestExchange`] is the production implementation; tests substitute
//! the scripted double from [`super::test_support`].

use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::config::ApiConfig;
use super::error::{Method, TransportError};

/// One request as issued by [`super::Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// JSON body, sent only with `POST`.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// A body-less `GET`.
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
        }
    }

    /// A `POST` with a JSON body.
    #[must_use]
    pub const fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
        }
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed `Retry-After` header, when given in seconds.
    pub retry_after: Option<Duration>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs exactly one HTTP exchange, without retries.
pub trait HttpExchange {
    /// Send `request` and return whatever status came back.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was received.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Blocking wait used for backoff and batch pacing.
pub trait Sleeper {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Errors raised while building the production exchange.
#[derive(Debug, Error)]
pub enum SessionBuildError {
    /// The user agent is not a valid header value.
    #[error("user agent {user_agent:?} is not a valid header value")]
    UserAgent {
        /// Offending user agent.
        user_agent: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

/// [`HttpExchange`] over a `reqwest` client.
///
/// The client carries the default `Accept` and `User-Agent` headers and the
/// configured timeout. Calls block on an owned current-thread Tokio runtime,
/// or on the caller's runtime via [`tokio::task::block_in_place`] when one
/// multi-threaded runtime is already active.
pub struct ReqwestExchange {
    client: Client,
    timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for ReqwestExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExchange")
            .field("client", &self.client)
            .field("timeout", &self.timeout)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl ReqwestExchange {
    /// Build the client and runtime from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user agent is not a valid header value or the
    /// HTTP client or Tokio runtime fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, SessionBuildError> {
        let client = Client::builder()
            .default_headers(default_headers(&config.user_agent)?)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SessionBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SessionBuildError::Runtime)?;
        Ok(Self {
            client,
            timeout: config.timeout,
            runtime,
        })
    }

    async fn send_async(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &request.url))?;
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &request.url))?;

        Ok(ApiResponse {
            status,
            retry_after,
            body: body.to_vec(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            };
        }
        if error.is_connect() {
            return TransportError::Connect {
                url: url.to_string(),
                message: error.to_string(),
            };
        }
        TransportError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

impl HttpExchange for ReqwestExchange {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let future = self.send_async(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

fn default_headers(user_agent: &str) -> Result<HeaderMap, SessionBuildError> {
    let agent = HeaderValue::from_str(user_agent).map_err(|_| SessionBuildError::UserAgent {
        user_agent: user_agent.to_owned(),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, agent);
    Ok(headers)
}

/// Only the delta-seconds form is honoured; HTTP dates fall back to backoff.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
