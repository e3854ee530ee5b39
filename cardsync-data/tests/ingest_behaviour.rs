//! Behavioural tests for whole ingestion runs.

use camino::Utf8PathBuf;
use cardsync_core::SET_SCHEMA;
use cardsync_data::api::test_support::{RecordingSleeper, ScriptedExchange, set_json};
use cardsync_data::api::{ApiEndpoints, RetryPolicy, Session, SetsService};
use cardsync_data::store::{
    ConnectionFactory, DatabaseUrl, SqliteConnectionFactory, count_rows, initialise_schema,
};
use cardsync_data::{ErrorKind, IngestError, IngestReport, ingest_sets};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use std::cell::RefCell;
use tempfile::TempDir;

type ReportCell = RefCell<Option<Result<IngestReport, IngestError>>>;

/// Shared state for one scenario.
struct IngestWorld {
    _dir: TempDir,
    factory: SqliteConnectionFactory,
    exchange: RefCell<ScriptedExchange>,
    report: ReportCell,
}

#[fixture]
fn world() -> IngestWorld {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 temp path");
    IngestWorld {
        factory: SqliteConnectionFactory::new(DatabaseUrl::File(root.join("data/mtgcards.db"))),
        _dir: dir,
        exchange: RefCell::new(ScriptedExchange::new()),
        report: RefCell::new(None),
    }
}

#[given("a provider listing the sets tdm and fdn")]
fn valid_catalog(world: &IngestWorld) {
    *world.exchange.borrow_mut() = ScriptedExchange::new().respond_json(
        200,
        json!({"object": "list", "data": [set_json("tdm"), set_json("fdn")]}),
    );
}

#[given("a provider listing tdm and a set without a name")]
fn malformed_catalog(world: &IngestWorld) {
    let mut broken = set_json("bad");
    broken.remove("name");
    *world.exchange.borrow_mut() = ScriptedExchange::new().respond_json(
        200,
        json!({"object": "list", "data": [set_json("tdm"), broken]}),
    );
}

#[when("I ingest the set catalog")]
fn ingest(world: &IngestWorld) {
    let exchange = world.exchange.borrow().clone();
    let session = Session::with_exchange(exchange, RetryPolicy::default(), RecordingSleeper::new());
    let endpoints = ApiEndpoints::new("https://api.example.test").expect("valid base URL");
    let sets = SetsService::new(&session, &endpoints);
    *world.report.borrow_mut() = Some(ingest_sets(&sets, &world.factory));
}

#[then("the run persists {count} sets")]
fn run_persists(world: &IngestWorld, count: usize) {
    match world.report.borrow().as_ref() {
        Some(Ok(report)) => {
            assert_eq!(report.fetched, count);
            assert_eq!(report.persisted, count);
        }
        other => panic!("expected a successful run, got {other:?}"),
    }
}

#[then("the run fails validation on the field {field}")]
fn run_fails(world: &IngestWorld, field: String) {
    match world.report.borrow().as_ref() {
        Some(Err(err @ IngestError::Validation(violation))) => {
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(violation.field(), field);
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[then("the database holds {count} sets")]
fn database_holds(world: &IngestWorld, count: u64) {
    let mut connection = world.factory.connect().expect("connect");
    initialise_schema(&mut connection).expect("initialise schema");
    assert_eq!(count_rows(&connection, &SET_SCHEMA).expect("count rows"), count);
}

#[scenario(path = "tests/features/ingest_sets.feature", index = 0)]
fn ingesting_a_valid_catalog(world: IngestWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/ingest_sets.feature", index = 1)]
fn aborting_on_a_malformed_set(world: IngestWorld) {
    let _ = world;
}
