//! Command-line interface for cardsync.
//!
//! `cardsync ingest` fetches the set catalog, one set, or a list of cards
//! and upserts them into the local database. `cardsync status` checks the
//! database and reports row counts and schema drift.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod ingest;
mod status;

pub use error::CliError;

use ingest::{IngestArgs, run_ingest};
use status::{StatusArgs, run_status};

const ARG_DATABASE_URL: &str = "database-url";
const ARG_BASE_URL: &str = "base-url";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_MAX_RETRIES: &str = "max-retries";
const ARG_BATCH_SIZE: &str = "batch-size";
const ARG_BATCH_DELAY_MS: &str = "batch-delay-ms";
const ARG_SET: &str = "set";
const ARG_CARDS: &str = "cards";
const ENV_INGEST_DATABASE_URL: &str = "CARDSYNC_CMDS_INGEST_DATABASE_URL";
const ENV_BASE_URL: &str = "CARDSYNC_CMDS_INGEST_BASE_URL";
const ENV_USER_AGENT: &str = "CARDSYNC_CMDS_INGEST_USER_AGENT";
const ENV_TIMEOUT_SECS: &str = "CARDSYNC_CMDS_INGEST_TIMEOUT_SECS";
const ENV_BATCH_SIZE: &str = "CARDSYNC_CMDS_INGEST_BATCH_SIZE";
const ENV_SET: &str = "CARDSYNC_CMDS_INGEST_SET";
const ENV_CARDS: &str = "CARDSYNC_CMDS_INGEST_CARDS";
const ENV_STATUS_DATABASE_URL: &str = "CARDSYNC_CMDS_STATUS_DATABASE_URL";

/// Run the cardsync CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, or when
/// the selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Ingest(args) => run_ingest(args),
        Command::Status(args) => run_status(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "cardsync",
    about = "Fetch card and set data from the provider into a local database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch records from the provider and upsert them.
    Ingest(IngestArgs),
    /// Report database connectivity, row counts and schema drift.
    Status(StatusArgs),
}

#[cfg(test)]
mod tests;
