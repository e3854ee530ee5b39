//! Database connection strings.

use std::{fmt, str::FromStr};

use camino::Utf8PathBuf;
use thiserror::Error;

/// Connection string used when none is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/mtgcards.db";

const SQLITE_PREFIX: &str = "sqlite:";
const MEMORY_FORMS: [&str; 2] = ["sqlite::memory:", ":memory:"];

/// A parsed SQLite connection string.
///
/// Accepted forms are `sqlite://<path>`, `sqlite:<path>`, a bare path and
/// `sqlite::memory:`.
///
/// # Examples
///
/// ```
/// use cardsync_data::store::DatabaseUrl;
///
/// let url: DatabaseUrl = "sqlite://data/mtgcards.db".parse().expect("valid URL");
/// assert_eq!(url, DatabaseUrl::File("data/mtgcards.db".into()));
/// assert_eq!("sqlite::memory:".parse::<DatabaseUrl>(), Ok(DatabaseUrl::Memory));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// A private in-memory database.
    Memory,
    /// A database file.
    File(Utf8PathBuf),
}

/// Errors returned when parsing a [`DatabaseUrl`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseUrlError {
    /// The connection string was blank.
    #[error("database URL must not be empty")]
    Empty,
    /// The connection string names a different database engine.
    #[error("unsupported database URL {url:?}; expected sqlite://<path>")]
    UnsupportedScheme {
        /// Offending connection string.
        url: String,
    },
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::File(Utf8PathBuf::from("data/mtgcards.db"))
    }
}

impl FromStr for DatabaseUrl {
    type Err = DatabaseUrlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DatabaseUrlError::Empty);
        }
        if MEMORY_FORMS.contains(&trimmed) {
            return Ok(Self::Memory);
        }
        let path = match trimmed.strip_prefix(SQLITE_PREFIX) {
            Some(rest) => rest.strip_prefix("//").unwrap_or(rest),
            None if trimmed.contains("://") => {
                return Err(DatabaseUrlError::UnsupportedScheme {
                    url: trimmed.to_owned(),
                });
            }
            None => trimmed,
        };
        if path.is_empty() {
            return Err(DatabaseUrlError::Empty);
        }
        Ok(Self::File(Utf8PathBuf::from(path)))
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY_FORMS[0]),
            Self::File(path) => write!(f, "sqlite://{path}"),
        }
    }
}
