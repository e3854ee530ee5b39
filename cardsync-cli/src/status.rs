//! `status` command: connectivity, row counts and schema drift.

use std::io::Write;

use cardsync_core::{CARD_SCHEMA, SET_SCHEMA};
use cardsync_data::store::{
    ColumnDrift, ConnectionFactory, DEFAULT_DATABASE_URL, DatabaseUrl, SqliteConnectionFactory,
    StoreError, count_rows, ping, verify_alignment,
};
use clap::Parser;
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE_URL, CliError, ENV_STATUS_DATABASE_URL};

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Check the database and report table sizes")]
#[ortho_config(prefix = "CARDSYNC")]
pub(crate) struct StatusArgs {
    /// Database connection string.
    #[arg(long = ARG_DATABASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) database_url: Option<String>,
}

impl StatusArgs {
    fn into_url(self) -> Result<DatabaseUrl, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        resolve_database_url(merged.database_url.as_deref())
    }
}

pub(crate) fn resolve_database_url(raw: Option<&str>) -> Result<DatabaseUrl, CliError> {
    raw.unwrap_or(DEFAULT_DATABASE_URL)
        .parse()
        .map_err(|err: cardsync_data::store::DatabaseUrlError| {
            CliError::invalid(ARG_DATABASE_URL, ENV_STATUS_DATABASE_URL, err.to_string())
        })
}

/// State of one managed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableStatus {
    pub(crate) table: &'static str,
    /// `None` when the table does not exist yet.
    pub(crate) rows: Option<u64>,
    pub(crate) drift: Vec<ColumnDrift>,
}

pub(crate) fn run_status(args: StatusArgs) -> Result<(), CliError> {
    let url = args.into_url()?;
    let factory = SqliteConnectionFactory::new(url);
    let mut stdout = std::io::stdout().lock();
    execute_status(&factory, &mut stdout)?;
    Ok(())
}

pub(crate) fn execute_status(
    factory: &SqliteConnectionFactory,
    writer: &mut dyn Write,
) -> Result<Vec<TableStatus>, CliError> {
    let url = factory.url().to_string();
    let tables = collect_status(factory).map_err(|source| CliError::Inspect {
        url: url.clone(),
        source,
    })?;
    writeln!(writer, "database {url}: reachable").map_err(CliError::WriteOutput)?;
    for status in &tables {
        match status.rows {
            Some(rows) => writeln!(writer, "{}: {rows} rows", status.table),
            None => writeln!(writer, "{}: not created", status.table),
        }
        .map_err(CliError::WriteOutput)?;
        for drift in &status.drift {
            warn!("schema drift: {drift}");
            writeln!(writer, "  drift: {drift}").map_err(CliError::WriteOutput)?;
        }
    }
    Ok(tables)
}

fn collect_status(factory: &impl ConnectionFactory) -> Result<Vec<TableStatus>, StoreError> {
    let connection = factory.connect()?;
    ping(&connection)?;
    [&SET_SCHEMA, &CARD_SCHEMA]
        .into_iter()
        .map(|schema| {
            let drift = verify_alignment(&connection, schema)?;
            let missing = drift
                .iter()
                .any(|entry| matches!(entry, ColumnDrift::MissingTable { .. }));
            let rows = if missing {
                None
            } else {
                Some(count_rows(&connection, schema)?)
            };
            Ok(TableStatus {
                table: schema.table,
                rows,
                drift: drift
                    .into_iter()
                    .filter(|entry| !matches!(entry, ColumnDrift::MissingTable { .. }))
                    .collect(),
            })
        })
        .collect()
}
