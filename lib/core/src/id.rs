//! Identifier of a backend record.
//!
//! Every record the dashboard manages (children, programs, enrollments,
//! sponsors, donations, staff) is addressed by the integer primary key the
//! backend assigns. Route parameters such as `/children/edit/:id` carry the
//! same value as text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing a record ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The text that failed to parse.
    pub input: String,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse record id '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Primary key of a backend record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record ID from its numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed.parse::<u64>().map(Self).map_err(|e| ParseIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_plain_number() {
        assert_eq!(RecordId::new(42).to_string(), "42");
    }

    #[test]
    fn parse_route_param() {
        let id: RecordId = "17".parse().expect("should parse");
        assert_eq!(id.get(), 17);
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        let id: RecordId = " 3 ".parse().expect("should parse");
        assert_eq!(id, RecordId::new(3));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        let err = "abc".parse::<RecordId>().unwrap_err();
        assert_eq!(err.input, "abc");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn parse_rejects_negative() {
        assert!("-1".parse::<RecordId>().is_err());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&RecordId::new(9)).expect("serialize");
        assert_eq!(json, "9");
        let parsed: RecordId = serde_json::from_str("9").expect("deserialize");
        assert_eq!(parsed, RecordId::new(9));
    }
}
