//! Error types emitted by the cardsync CLI.

use std::sync::Arc;

use cardsync_data::IngestError;
use cardsync_data::api::SessionBuildError;
use cardsync_data::store::StoreError;
use thiserror::Error;

/// Errors emitted by the cardsync CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A merged option holds an unusable value.
    #[error("invalid {field} (set --{field} or {env}): {message}")]
    InvalidArgument {
        field: &'static str,
        env: &'static str,
        message: String,
    },
    /// Two mutually exclusive options were both supplied.
    #[error("--{first} and --{second} cannot be combined")]
    ConflictingArguments {
        first: &'static str,
        second: &'static str,
    },
    /// The HTTP session could not be built.
    #[error("failed to build provider session: {0}")]
    BuildSession(#[from] SessionBuildError),
    /// An ingestion run failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// The store could not be inspected.
    #[error("failed to inspect database {url}: {source}")]
    Inspect {
        url: String,
        #[source]
        source: StoreError,
    },
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    pub(crate) fn invalid(
        field: &'static str,
        env: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            field,
            env,
            message: message.into(),
        }
    }
}
