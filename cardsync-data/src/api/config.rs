//! Explicit configuration for the provider session and retrieval services.

use std::time::Duration;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.scryfall.com";

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = concat!("cardsync/", env!("CARGO_PKG_VERSION"));

/// Provider ceiling on identifiers per collection request.
pub const MAX_BATCH: usize = 75;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default pause between collection batches in milliseconds.
const DEFAULT_BATCH_DELAY_MILLIS: u64 = 100;

/// Default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound for any single backoff wait.
const MAX_BACKOFF_SECS: u64 = 120;

/// Bounded exponential backoff for transient failures.
///
/// Retry `n` (1-based) waits `backoff_factor * 2^(n-1)`, capped at
/// [`RetryPolicy::max_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Base delay doubled on every retry.
    pub backoff_factor: Duration,
    /// Ceiling applied to computed and server-advised waits.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(MAX_BACKOFF_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff factor.
    #[must_use]
    pub const fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Total attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the given retry (1-based).
    ///
    /// A server-advised delay replaces the computed one; both are capped.
    #[must_use]
    pub fn delay_for(&self, retry: u32, advised: Option<Duration>) -> Duration {
        let computed = || {
            let exponent = retry.saturating_sub(1).min(31);
            self.backoff_factor
                .checked_mul(1_u32 << exponent)
                .unwrap_or(self.max_backoff)
        };
        advised.unwrap_or_else(computed).min(self.max_backoff)
    }
}

/// Configuration shared by [`super::Session`] and the retrieval services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Provider root, e.g. `"https://api.scryfall.com"`.
    pub base_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
    /// Identifiers per collection request, at most [`MAX_BATCH`].
    pub batch_size: usize,
    /// Pause before every collection batch after the first.
    pub batch_delay: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            batch_size: MAX_BATCH,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MILLIS),
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the collection batch size. Values outside `1..=MAX_BATCH` are
    /// rejected when a collection is requested.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the pause between collection batches.
    #[must_use]
    pub const fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }
}
