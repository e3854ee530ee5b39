//! Provider access: transport session, endpoint resolution and retrieval.
//!
//! # Architecture
//!
//! [`Session`] wraps one [`HttpExchange`] with default headers and a bounded
//! retry policy. [`ApiEndpoints`] computes URLs and request bodies without
//! touching the network. [`SetsService`] and [`CardsService`] borrow a
//! session and endpoints and expose the provider operations. Everything is
//! synchronous: requests run one at a time on the calling thread and every
//! wait blocks that thread.
//!
//! # Example
//!
//! ```no_run
//! use cardsync_data::api::{ApiConfig, ApiEndpoints, CardsService, Session, SetsService};
//! use cardsync_core::Identifier;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::default();
//! let session = Session::new(&config)?;
//! let endpoints = ApiEndpoints::new(&config.base_url)?;
//!
//! let sets = SetsService::new(&session, &endpoints).get_sets()?;
//! println!("{} sets", sets.len());
//!
//! let cards = CardsService::new(&session, &endpoints, &config)
//!     .get_cards_collection(&[Identifier::new("tdm", "1")])?;
//! println!("{} found", cards.found.len());
//! # Ok(())
//! # }
//! ```

mod cards;
mod config;
mod endpoints;
mod error;
mod exchange;
mod session;
mod sets;

#[doc(hidden)]
pub mod test_support;

pub use cards::{CardsService, CollectionError, CollectionResult};
pub use config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, MAX_BATCH, RetryPolicy};
pub use endpoints::{ApiEndpoints, BatchTooLargeError, CollectionRequest, EndpointError};
pub use error::{ApiError, Method, RETRYABLE_STATUSES, TransportError, is_retryable_status};
pub use exchange::{
    ApiRequest, ApiResponse, HttpExchange, ReqwestExchange, SessionBuildError, Sleeper,
    ThreadSleeper,
};
pub use session::Session;
pub use sets::{SetsError, SetsService};
