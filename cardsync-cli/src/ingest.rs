//! `ingest` command: fetch, validate and upsert provider records.

use std::io::Write;
use std::time::Duration;

use cardsync_core::Identifier;
use cardsync_data::api::{
    ApiConfig, ApiEndpoints, CardsService, DEFAULT_BASE_URL, MAX_BATCH, RetryPolicy, Session,
    SetsService,
};
use cardsync_data::store::{DEFAULT_DATABASE_URL, DatabaseUrl, SqliteConnectionFactory};
use cardsync_data::{IngestReport, ingest_cards, ingest_set, ingest_sets};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BASE_URL, ARG_BATCH_DELAY_MS, ARG_BATCH_SIZE, ARG_CARDS, ARG_DATABASE_URL,
    ARG_MAX_RETRIES, ARG_SET, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError, ENV_BASE_URL,
    ENV_BATCH_SIZE, ENV_CARDS, ENV_INGEST_DATABASE_URL, ENV_SET, ENV_TIMEOUT_SECS,
    ENV_USER_AGENT,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch records from the provider, validate every record and \
                 upsert them in one transaction. Without --set or --cards the \
                 whole set catalog is ingested. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Fetch sets or cards and store them"
)]
#[ortho_config(prefix = "CARDSYNC")]
pub(crate) struct IngestArgs {
    /// Ingest a single set by code.
    #[arg(long = ARG_SET, value_name = "code", conflicts_with = ARG_CARDS)]
    #[serde(default)]
    pub(crate) set: Option<String>,
    /// Ingest cards by identifier, e.g. `tdm:1,tdm:2`.
    #[arg(long = ARG_CARDS, value_name = "set:number,...")]
    #[serde(default)]
    pub(crate) cards: Option<String>,
    /// Database connection string.
    #[arg(long = ARG_DATABASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) database_url: Option<String>,
    /// Provider API root.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// User-Agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Retries after the first attempt for transient failures.
    #[arg(long = ARG_MAX_RETRIES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_retries: Option<u32>,
    /// Identifiers per collection request.
    #[arg(long = ARG_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) batch_size: Option<usize>,
    /// Pause between collection requests in milliseconds.
    #[arg(long = ARG_BATCH_DELAY_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) batch_delay_ms: Option<u64>,
}

impl IngestArgs {
    fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// What an ingestion run fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IngestTarget {
    AllSets,
    Set(String),
    Cards(Vec<Identifier>),
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IngestConfig {
    pub(crate) target: IngestTarget,
    pub(crate) database_url: DatabaseUrl,
    pub(crate) api: ApiConfig,
    pub(crate) endpoints: ApiEndpoints,
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let target = match (args.set, args.cards) {
            (Some(_), Some(_)) => {
                return Err(CliError::ConflictingArguments {
                    first: ARG_SET,
                    second: ARG_CARDS,
                });
            }
            (Some(code), None) => IngestTarget::Set(parse_set_code(&code)?),
            (None, Some(list)) => IngestTarget::Cards(parse_identifiers(&list)?),
            (None, None) => IngestTarget::AllSets,
        };

        let database_url = args
            .database_url
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_URL)
            .parse::<DatabaseUrl>()
            .map_err(|err| {
                CliError::invalid(ARG_DATABASE_URL, ENV_INGEST_DATABASE_URL, err.to_string())
            })?;

        let base_url = args.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let endpoints = ApiEndpoints::new(&base_url)
            .map_err(|err| CliError::invalid(ARG_BASE_URL, ENV_BASE_URL, err.to_string()))?;

        let mut api = ApiConfig::new(base_url);
        if let Some(user_agent) = args.user_agent {
            if user_agent.trim().is_empty() {
                return Err(CliError::invalid(
                    ARG_USER_AGENT,
                    ENV_USER_AGENT,
                    "must not be blank",
                ));
            }
            api = api.with_user_agent(user_agent);
        }
        if let Some(secs) = args.timeout_secs {
            if secs == 0 {
                return Err(CliError::invalid(
                    ARG_TIMEOUT_SECS,
                    ENV_TIMEOUT_SECS,
                    "must be at least 1",
                ));
            }
            api = api.with_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = args.max_retries {
            api = api.with_retry(RetryPolicy::default().with_max_retries(retries));
        }
        if let Some(size) = args.batch_size {
            if size == 0 || size > MAX_BATCH {
                return Err(CliError::invalid(
                    ARG_BATCH_SIZE,
                    ENV_BATCH_SIZE,
                    format!("must be between 1 and {MAX_BATCH}"),
                ));
            }
            api = api.with_batch_size(size);
        }
        if let Some(ms) = args.batch_delay_ms {
            api = api.with_batch_delay(Duration::from_millis(ms));
        }

        Ok(Self {
            target,
            database_url,
            api,
            endpoints,
        })
    }
}

fn parse_set_code(code: &str) -> Result<String, CliError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(CliError::invalid(ARG_SET, ENV_SET, "must not be blank"));
    }
    Ok(trimmed.to_owned())
}

fn parse_identifiers(list: &str) -> Result<Vec<Identifier>, CliError> {
    let identifiers = list
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<Identifier>()
                .map_err(|err| CliError::invalid(ARG_CARDS, ENV_CARDS, err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if identifiers.is_empty() {
        return Err(CliError::invalid(
            ARG_CARDS,
            ENV_CARDS,
            "expected at least one set:number identifier",
        ));
    }
    Ok(identifiers)
}

/// Builds the provider session for one invocation.
pub(crate) trait SessionBuilder {
    fn build(&self, config: &ApiConfig) -> Result<Session, CliError>;
}

pub(crate) struct DefaultSessionBuilder;

impl SessionBuilder for DefaultSessionBuilder {
    fn build(&self, config: &ApiConfig) -> Result<Session, CliError> {
        Ok(Session::new(config)?)
    }
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mut stdout = std::io::stdout().lock();
    execute_ingest(&config, &DefaultSessionBuilder, &mut stdout)?;
    Ok(())
}

pub(crate) fn execute_ingest(
    config: &IngestConfig,
    builder: &dyn SessionBuilder,
    writer: &mut dyn Write,
) -> Result<IngestReport, CliError> {
    let session = builder.build(&config.api)?;
    let factory = SqliteConnectionFactory::new(config.database_url.clone());
    info!("ingesting into {}", config.database_url);
    let report = match &config.target {
        IngestTarget::AllSets => {
            ingest_sets(&SetsService::new(&session, &config.endpoints), &factory)?
        }
        IngestTarget::Set(code) => ingest_set(
            &SetsService::new(&session, &config.endpoints),
            &factory,
            code,
        )?,
        IngestTarget::Cards(identifiers) => ingest_cards(
            &CardsService::new(&session, &config.endpoints, &config.api),
            &factory,
            identifiers,
        )?,
    };
    write_ingest_report(writer, &report)?;
    Ok(report)
}

fn write_ingest_report(writer: &mut dyn Write, report: &IngestReport) -> Result<(), CliError> {
    writeln!(
        writer,
        "{}: fetched {}, persisted {}",
        report.table, report.fetched, report.persisted
    )
    .map_err(CliError::WriteOutput)?;
    for identifier in &report.not_found {
        writeln!(writer, "not found: {identifier}").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}
