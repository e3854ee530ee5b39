//! Card identifiers accepted by the collection endpoint.
//!
//! An [`Identifier`] names one printing by its set code and collector
//! number. The pipeline treats it as opaque beyond equality and
//! serialisation; it is never persisted on its own.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `(set, collector_number)` pair naming one card printing.
///
/// The serialised form matches the collection endpoint's identifier object,
/// so the same type is used for request bodies and for the `not_found`
/// entries echoed back by the provider.
///
/// # Examples
///
/// ```
/// use cardsync_core::Identifier;
///
/// # fn main() -> Result<(), cardsync_core::IdentifierError> {
/// let id: Identifier = "tdm:1".parse()?;
/// assert_eq!(id, Identifier::new("tdm", "1"));
/// assert_eq!(id.to_string(), "tdm:1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Set code, e.g. `tdm`.
    pub set: String,
    /// Collector number within the set. Kept as text: numbers such as
    /// `123a` or `★12` are valid.
    pub collector_number: String,
}

/// Errors returned by [`Identifier::validate`] and [`Identifier::from_str`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The set code was empty or whitespace.
    #[error("identifier {input:?} has a blank set code")]
    BlankSet {
        /// Identifier as supplied.
        input: String,
    },
    /// The collector number was empty or whitespace.
    #[error("identifier {input:?} has a blank collector number")]
    BlankCollectorNumber {
        /// Identifier as supplied.
        input: String,
    },
    /// Text form was not `set:number`.
    #[error("identifier {input:?} must have the form set:collector_number")]
    Malformed {
        /// Identifier as supplied.
        input: String,
    },
}

impl Identifier {
    /// Construct an identifier without validating it.
    ///
    /// Set codes are case-insensitive at the provider and are stored
    /// lowercased.
    pub fn new(set: impl Into<String>, collector_number: impl Into<String>) -> Self {
        let mut set = set.into();
        set.make_ascii_lowercase();
        Self {
            set,
            collector_number: collector_number.into(),
        }
    }

    /// Reject identifiers the provider could never match.
    pub fn validate(&self) -> Result<(), IdentifierError> {
        if self.set.trim().is_empty() {
            return Err(IdentifierError::BlankSet {
                input: self.to_string(),
            });
        }
        if self.collector_number.trim().is_empty() {
            return Err(IdentifierError::BlankCollectorNumber {
                input: self.to_string(),
            });
        }
        Ok(())
    }

    /// Whether `other` names the same printing, ignoring set code case.
    pub fn same_printing(&self, other: &Self) -> bool {
        self.set.eq_ignore_ascii_case(&other.set) && self.collector_number == other.collector_number
    }

    /// Whether `record` carries this identifier's set and collector number.
    ///
    /// The set code is compared case-insensitively.
    pub fn matches_record(&self, record: &crate::RawRecord) -> bool {
        let field = |name: &str| record.get(name).and_then(serde_json::Value::as_str);
        field("set").is_some_and(|set| set.eq_ignore_ascii_case(&self.set))
            && field("collector_number") == Some(self.collector_number.as_str())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.set, self.collector_number)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (set, number) = input
            .split_once(':')
            .ok_or_else(|| IdentifierError::Malformed {
                input: input.to_owned(),
            })?;
        let identifier = Self::new(set.trim(), number.trim());
        identifier.validate()?;
        Ok(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn parses_set_and_number() {
        let id: Identifier = " tdm : 12a ".parse().expect("identifier should parse");
        assert_eq!(id.set, "tdm");
        assert_eq!(id.collector_number, "12a");
    }

    #[rstest]
    fn lowercases_set_code() {
        let id: Identifier = "TDM:1".parse().expect("identifier should parse");
        assert_eq!(id, Identifier::new("tdm", "1"));
        assert_eq!(id.to_string(), "tdm:1");
    }

    #[rstest]
    #[case("tdm")]
    #[case("")]
    fn rejects_text_without_separator(#[case] input: &str) {
        let err = input.parse::<Identifier>().expect_err("should fail");
        assert!(matches!(err, IdentifierError::Malformed { .. }));
    }

    #[rstest]
    #[case(":1", true)]
    #[case("tdm: ", false)]
    fn rejects_blank_parts(#[case] input: &str, #[case] blank_set: bool) {
        let err = input.parse::<Identifier>().expect_err("should fail");
        if blank_set {
            assert!(matches!(err, IdentifierError::BlankSet { .. }));
        } else {
            assert!(matches!(err, IdentifierError::BlankCollectorNumber { .. }));
        }
    }

    #[rstest]
    fn serialises_as_collection_identifier() {
        let value = serde_json::to_value(Identifier::new("tdm", "1")).expect("serialise");
        assert_eq!(value, json!({"set": "tdm", "collector_number": "1"}));
    }

    #[rstest]
    fn matches_record_by_set_and_number() {
        let record = json!({"set": "tdm", "collector_number": "1", "name": "Ugin"});
        let record = record.as_object().cloned().expect("object");
        assert!(Identifier::new("tdm", "1").matches_record(&record));
        assert!(!Identifier::new("tdm", "2").matches_record(&record));
    }

    #[rstest]
    fn matches_record_ignores_set_case() {
        let record = json!({"set": "TDM", "collector_number": "1"});
        let record = record.as_object().cloned().expect("object");
        assert!(Identifier::new("tdm", "1").matches_record(&record));
    }

    #[rstest]
    fn same_printing_ignores_set_case() {
        let upper = Identifier {
            set: "TDM".to_owned(),
            collector_number: "1".to_owned(),
        };
        assert!(upper.same_printing(&Identifier::new("tdm", "1")));
        assert!(!upper.same_printing(&Identifier::new("tdm", "1a")));
    }
}
