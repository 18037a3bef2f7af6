//! Match identifier naming a two-player room.
//!
//! Match identifiers are produced by the external match-management API and
//! are opaque to the relay. [`MatchId`] only rejects values that cannot be
//! a sensible room key: empty strings, oversized strings, control characters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Longest accepted match identifier, in bytes.
pub const MAX_MATCH_ID_LEN: usize = 128;

/// Opaque, validated match identifier.
///
/// Deserializes through [`MatchId::parse`], so a frame carrying an invalid
/// identifier fails to decode instead of creating a junk room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
    /// Validates and wraps a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidMatchId`] if the value is empty, longer
    /// than [`MAX_MATCH_ID_LEN`] bytes, or contains control characters.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RelayError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(RelayError::InvalidMatchId("must not be empty".to_string()));
        }
        if raw.len() > MAX_MATCH_ID_LEN {
            return Err(RelayError::InvalidMatchId(format!(
                "longer than {MAX_MATCH_ID_LEN} bytes"
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(RelayError::InvalidMatchId(
                "contains control characters".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MatchId {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.0
    }
}
