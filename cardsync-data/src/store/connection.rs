//! Connection acquisition for the relational store.

use std::io;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use rusqlite::Connection;

use super::StoreError;
use super::url::DatabaseUrl;

/// Yields a fresh database handle for one unit of work.
///
/// The handle is owned by the caller and closed when dropped, so no
/// connection outlives the operation that opened it.
pub trait ConnectionFactory {
    /// Open a connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened.
    fn connect(&self) -> Result<Connection, StoreError>;
}

/// [`ConnectionFactory`] for SQLite databases.
///
/// File databases get their parent directory created on first use. Foreign
/// keys are enabled on every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConnectionFactory {
    url: DatabaseUrl,
}

impl SqliteConnectionFactory {
    /// Create a factory for `url`.
    #[must_use]
    pub const fn new(url: DatabaseUrl) -> Self {
        Self { url }
    }

    /// Database this factory connects to.
    #[must_use]
    pub const fn url(&self) -> &DatabaseUrl {
        &self.url
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    fn connect(&self) -> Result<Connection, StoreError> {
        let connection = match &self.url {
            DatabaseUrl::Memory => Connection::open_in_memory(),
            DatabaseUrl::File(path) => {
                ensure_parent_dir(path)?;
                Connection::open(path.as_std_path())
            }
        }
        .map_err(|source| StoreError::Open {
            url: self.url.to_string(),
            source,
        })?;
        connection
            .pragma_update(None, "foreign_keys", true)
            .map_err(|source| StoreError::Sqlite {
                operation: "enable foreign keys",
                source,
            })?;
        debug!("opened {}", self.url);
        Ok(connection)
    }
}

/// Create the parent of `path` below its nearest existing ancestor.
///
/// Opening the ancestor itself keeps leading `..` components out of the
/// capability sandbox.
fn ensure_parent_dir(path: &Utf8Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let directory_error = |source: io::Error| StoreError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    };

    for ancestor in parent.ancestors() {
        let base = if ancestor.as_str().is_empty() {
            Utf8Path::new(".")
        } else {
            ancestor
        };
        let dir = match fs_utf8::Dir::open_ambient_dir(base, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(directory_error(err)),
        };
        let missing = parent.strip_prefix(ancestor).unwrap_or(parent);
        if missing.as_str().is_empty() {
            return Ok(());
        }
        debug!("creating {missing} under {base}");
        return dir.create_dir_all(missing).map_err(directory_error);
    }
    Err(directory_error(io::Error::new(
        io::ErrorKind::NotFound,
        "no existing ancestor directory",
    )))
}
