//! Behavioural tests for persisting set records using rstest-bdd.

use super::super::{DatabaseUrl, SqliteConnectionFactory, StoreError, persist_records};
use crate::api::test_support::set_json;
use cardsync_core::{SET_SCHEMA, ValidatedRecord, validate};
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rusqlite::Connection;
use serde_json::json;
use std::cell::RefCell;
use tempfile::TempDir;

type PersistResultCell = RefCell<Option<Result<usize, StoreError>>>;

#[fixture]
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[fixture]
pub fn db_path() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

#[fixture]
pub fn persist_result() -> PersistResultCell {
    RefCell::new(None)
}

fn set_with_count(code: &str, card_count: i64) -> ValidatedRecord {
    let mut raw = set_json(code);
    raw.insert("card_count".into(), json!(card_count));
    validate(&SET_SCHEMA, &raw).expect("valid set")
}

fn factory(db_path: &RefCell<Option<Utf8PathBuf>>) -> SqliteConnectionFactory {
    let path = db_path
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("database path must be initialised"));
    SqliteConnectionFactory::new(DatabaseUrl::File(path))
}

#[given("an empty card database")]
fn empty_database(temp_dir: &TempDir, db_path: &RefCell<Option<Utf8PathBuf>>) {
    let root =
        Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("UTF-8 temp path");
    *db_path.borrow_mut() = Some(root.join("data/mtgcards.db"));
}

#[given("the set TDM was stored with 286 cards")]
fn stored_once(db_path: &RefCell<Option<Utf8PathBuf>>) {
    persist_records(&factory(db_path), &[set_with_count("tdm", 286)]).expect("seed set");
}

#[when("I store the set TDM with 291 cards")]
fn store_again(db_path: &RefCell<Option<Utf8PathBuf>>, persist_result: &PersistResultCell) {
    let result = persist_records(&factory(db_path), &[set_with_count("tdm", 291)]);
    *persist_result.borrow_mut() = Some(result);
}

#[when("I store the sets TDM and FDN")]
fn store_two(db_path: &RefCell<Option<Utf8PathBuf>>, persist_result: &PersistResultCell) {
    let records = [set_with_count("tdm", 286), set_with_count("fdn", 271)];
    let result = persist_records(&factory(db_path), &records);
    *persist_result.borrow_mut() = Some(result);
}

#[then("the database holds exactly one TDM row with 291 cards")]
fn one_row_latest(db_path: &RefCell<Option<Utf8PathBuf>>, persist_result: &PersistResultCell) {
    let binding = persist_result.borrow();
    let result = binding
        .as_ref()
        .unwrap_or_else(|| panic!("persistence result must be recorded"));
    if let Err(err) = result {
        panic!("expected success, got error: {err}");
    }

    let path = db_path.borrow().clone().expect("database path");
    let connection = Connection::open(path.as_std_path()).expect("open SQLite database");
    let rows: Vec<i64> = connection
        .prepare("SELECT card_count FROM sets WHERE code = 'tdm'")
        .expect("prepare select")
        .query_map([], |row| row.get(0))
        .expect("query sets")
        .collect::<Result<_, _>>()
        .expect("collect rows");
    assert_eq!(rows, vec![291]);
}

#[then("both sets are stored in a database file under the data directory")]
fn both_stored(db_path: &RefCell<Option<Utf8PathBuf>>, persist_result: &PersistResultCell) {
    let binding = persist_result.borrow();
    match binding.as_ref() {
        Some(Ok(written)) => assert_eq!(*written, 2),
        other => panic!("expected two records written, got {other:?}"),
    }
    let path = db_path.borrow().clone().expect("database path");
    assert!(path.exists(), "database file should exist at {path}");
}

#[scenario(path = "tests/features/persist_sets.feature", index = 0)]
fn storing_a_set_twice(
    temp_dir: TempDir,
    db_path: RefCell<Option<Utf8PathBuf>>,
    persist_result: PersistResultCell,
) {
    let _ = (temp_dir, db_path, persist_result);
}

#[scenario(path = "tests/features/persist_sets.feature", index = 1)]
fn storing_into_a_new_database(
    temp_dir: TempDir,
    db_path: RefCell<Option<Utf8PathBuf>>,
    persist_result: PersistResultCell,
) {
    let _ = (temp_dir, db_path, persist_result);
}
