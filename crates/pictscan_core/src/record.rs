use std::fmt;

use serde::ser::{Serialize, SerializeTuple, Serializer};

/// Why a URL ended without a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Fetch(String),
    Parse(String),
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Fetch(message) => write!(f, "Fetch failed: {message}"),
            FailureReason::Parse(message) => write!(f, "Parse failed: {message}"),
            FailureReason::Cancelled => write!(f, "Cancelled before complete"),
        }
    }
}

/// Terminal outcome of one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    Matched,
    NotMatched,
    Failed(FailureReason),
}

/// A failed URL and its reason. Serializes as `[url, reason]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub url: String,
    pub reason: FailureReason,
}

impl ErrorRecord {
    pub fn new(url: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            url: url.into(),
            reason,
        }
    }
}

impl Serialize for ErrorRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.url)?;
        pair.serialize_element(&self.reason.to_string())?;
        pair.end()
    }
}
