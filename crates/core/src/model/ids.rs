use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::{Builder, Uuid};

/// Opaque unique identifier for a Question.
///
/// Identifiers coming from storage or remote generators are kept verbatim;
/// locally minted ones are simple-formatted UUIDs.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random identifier from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Mints an identifier from caller-supplied random bytes.
    ///
    /// Lets a seeded RNG produce reproducible ids in tests.
    #[must_use]
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        let uuid = Builder::from_random_bytes(bytes).into_uuid();
        Self(uuid.simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for parsing an id from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid question id: {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ParseIdError { raw: s.to_string() });
        }
        Ok(Self::new(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = QuestionId::generate();
        let b = QuestionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn same_bytes_give_same_id() {
        let a = QuestionId::from_random_bytes([7; 16]);
        let b = QuestionId::from_random_bytes([7; 16]);
        assert_eq!(a, b);
    }

    #[test]
    fn from_str_trims_and_rejects_blank() {
        let id: QuestionId = "  abc123 ".parse().unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert!("   ".parse::<QuestionId>().is_err());
        assert!("a b".parse::<QuestionId>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = QuestionId::new("k3j2l1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"k3j2l1\"");
    }
}
