//! Error taxonomy for provider requests.

use std::fmt;

use thiserror::Error;

/// HTTP method of an [`super::ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Statuses retried by [`super::Session`].
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Whether `status` is a transient provider failure.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Failures below HTTP: no status line was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The connection could not be established.
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// Requested URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
    /// Any other client-side failure, e.g. an unreadable body.
    #[error("request to {url} failed: {message}")]
    Other {
        /// Requested URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
}

impl TransportError {
    /// Timeouts and connection failures are worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connect { .. })
    }
}

/// Errors surfaced by [`super::Session`] once the retry policy has run.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provider answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {details}")]
    Status {
        /// Request method.
        method: Method,
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Provider `details`, or the canonical reason phrase.
        details: String,
    },
    /// A transient failure persisted through every allowed retry.
    #[error("{method} {url} failed after {attempts} attempts")]
    RetriesExhausted {
        /// Request method.
        method: Method,
        /// Requested URL.
        url: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure seen on the final attempt.
        #[source]
        last: Box<ApiError>,
    },
    /// The request failed below HTTP.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request body could not be encoded.
    #[error("failed to encode request body for {url}")]
    Encode {
        /// Requested URL.
        url: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The response body was not the expected JSON.
    #[error("failed to decode response from {url}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the failure, looking through exhausted retries.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            Self::Transport(_) | Self::Encode { .. } | Self::Decode { .. } => None,
        }
    }

    /// Whether re-running the whole operation later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::RetriesExhausted { .. } => true,
            Self::Transport(err) => err.is_transient(),
            Self::Encode { .. } | Self::Decode { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn status_error(status: u16) -> ApiError {
        ApiError::Status {
            method: Method::Get,
            url: "https://api.example.test/sets".into(),
            status,
            details: "details".into(),
        }
    }

    #[rstest]
    #[case(429, true)]
    #[case(500, true)]
    #[case(503, true)]
    #[case(404, false)]
    #[case(400, false)]
    #[case(501, false)]
    fn classifies_statuses(#[case] status: u16, #[case] transient: bool) {
        assert_eq!(is_retryable_status(status), transient);
        assert_eq!(status_error(status).is_transient(), transient);
    }

    #[rstest]
    fn exhausted_retries_report_last_status() {
        let err = ApiError::RetriesExhausted {
            method: Method::Post,
            url: "https://api.example.test/cards/collection".into(),
            attempts: 4,
            last: Box::new(status_error(503)),
        };
        assert_eq!(err.status(), Some(503));
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "POST https://api.example.test/cards/collection failed after 4 attempts"
        );
    }

    #[rstest]
    fn transport_errors_are_transient_only_for_timeouts_and_connects() {
        let timeout = TransportError::Timeout {
            url: "u".into(),
            timeout_secs: 30,
        };
        let other = TransportError::Other {
            url: "u".into(),
            message: "body".into(),
        };
        assert!(timeout.is_transient());
        assert!(!other.is_transient());
        assert!(!ApiError::from(other).is_transient());
    }
}
