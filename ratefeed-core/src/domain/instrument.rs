//! Instrument codes: short uppercase identifiers such as `USD` or `KEY_RATE`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest code accepted from a source.
const MAX_CODE_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("instrument code is empty")]
    Empty,

    #[error("instrument code '{0}' is longer than {MAX_CODE_LEN} characters")]
    TooLong(String),

    #[error("instrument code '{0}' contains characters other than letters, digits and '_'")]
    InvalidCharacter(String),
}

/// Identifier of a tradable unit inside a rate row.
///
/// Always stored uppercase; construction trims surrounding whitespace so
/// `" usd "` and `"USD"` are the same code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentCode(String);

impl InstrumentCode {
    pub fn new(raw: &str) -> Result<Self, InstrumentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InstrumentError::Empty);
        }
        if trimmed.chars().count() > MAX_CODE_LEN {
            return Err(InstrumentError::TooLong(trimmed.to_string()));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(InstrumentError::InvalidCharacter(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstrumentCode {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InstrumentCode {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<InstrumentCode> for String {
    fn from(code: InstrumentCode) -> Self {
        code.0
    }
}

impl AsRef<str> for InstrumentCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for InstrumentCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}
