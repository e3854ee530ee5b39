//! Unit tests for the status command.

use super::helpers::Workspace;
use super::*;
use crate::status::{execute_status, resolve_database_url};
use cardsync_data::store::{DatabaseUrl, SqliteConnectionFactory};
use rstest::rstest;
use rusqlite::Connection;

fn factory_for(workspace: &Workspace) -> SqliteConnectionFactory {
    SqliteConnectionFactory::new(DatabaseUrl::File(workspace.database_path()))
}

#[rstest]
fn fresh_database_reports_tables_not_created() {
    let workspace = Workspace::new();
    let mut output = Vec::new();

    let tables = execute_status(&factory_for(&workspace), &mut output).expect("status");

    assert!(tables.iter().all(|table| table.rows.is_none()));
    let text = String::from_utf8(output).expect("utf-8 output");
    assert!(text.contains("sets: not created"), "unexpected output {text}");
    assert!(text.contains("cards: not created"), "unexpected output {text}");
}

#[rstest]
fn reports_row_counts_after_ingest() {
    let workspace = Workspace::new();
    let factory = factory_for(&workspace);
    {
        let mut connection = cardsync_data::store::ConnectionFactory::connect(&factory)
            .expect("connect");
        cardsync_data::store::initialise_schema(&mut connection).expect("schema");
        connection
            .execute(
                "INSERT INTO sets (code, name, set_type, card_count, digital, icon_svg_uri) \
                 VALUES ('tdm', 'Tarkir', 'expansion', 286, 0, 'https://example.test/tdm.svg')",
                [],
            )
            .expect("insert set");
    }
    let mut output = Vec::new();

    let tables = execute_status(&factory, &mut output).expect("status");

    let rows: Vec<_> = tables.iter().map(|table| (table.table, table.rows)).collect();
    assert_eq!(rows, vec![("sets", Some(1)), ("cards", Some(0))]);
    assert!(tables.iter().all(|table| table.drift.is_empty()));
}

#[rstest]
fn reports_drift_in_existing_tables() {
    let workspace = Workspace::new();
    let factory = factory_for(&workspace);
    let path = workspace.database_path();
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create data dir");
    let connection = Connection::open(path.as_std_path()).expect("open database");
    connection
        .execute_batch("CREATE TABLE sets (code TEXT PRIMARY KEY NOT NULL, name TEXT);")
        .expect("create drifted table");
    drop(connection);
    let mut output = Vec::new();

    let tables = execute_status(&factory, &mut output).expect("status");

    let sets = tables.first().expect("sets status");
    assert_eq!(sets.rows, Some(0));
    assert!(!sets.drift.is_empty());
    let text = String::from_utf8(output).expect("utf-8 output");
    assert!(text.contains("drift: sets."), "unexpected output {text}");
}

#[rstest]
#[case(None, DatabaseUrl::default())]
#[case(Some("sqlite::memory:"), DatabaseUrl::Memory)]
fn resolves_database_urls(#[case] raw: Option<&str>, #[case] expected: DatabaseUrl) {
    assert_eq!(resolve_database_url(raw).expect("url"), expected);
}

#[rstest]
fn rejects_unsupported_database_urls() {
    let err = resolve_database_url(Some("mysql://db")).expect_err("should fail");
    match err {
        CliError::InvalidArgument { field, env, .. } => {
            assert_eq!(field, ARG_DATABASE_URL);
            assert_eq!(env, ENV_STATUS_DATABASE_URL);
        }
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}
