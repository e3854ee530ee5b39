//! Test helpers for running commands against scripted providers.

use super::*;
use crate::ingest::SessionBuilder;
use camino::Utf8PathBuf;
use cardsync_data::api::test_support::{RecordingSleeper, ScriptedExchange};
use cardsync_data::api::{ApiConfig, Session};
use tempfile::TempDir;

/// Session builder handing out sessions over a shared scripted exchange.
pub(super) struct ScriptedSessionBuilder {
    pub(super) exchange: ScriptedExchange,
}

impl SessionBuilder for ScriptedSessionBuilder {
    fn build(&self, config: &ApiConfig) -> Result<Session, CliError> {
        Ok(Session::with_exchange(
            self.exchange.clone(),
            config.retry,
            RecordingSleeper::new(),
        ))
    }
}

/// Temporary workspace holding a database path.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace path");
        Self { _dir: dir, root }
    }

    pub(super) fn database_path(&self) -> Utf8PathBuf {
        self.root.join("data/mtgcards.db")
    }

    pub(super) fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path())
    }
}
