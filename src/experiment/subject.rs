//! Subject identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of the entity being bucketed (a user, in practice).
///
/// Its `Display` form is what goes into bucketing keys, so a numeric user id
/// and its decimal string bucket identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for SubjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&SubjectId> for SubjectId {
    fn from(id: &SubjectId) -> Self {
        id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_agree() {
        assert_eq!(SubjectId::from(42u64), SubjectId::from("42"));
        assert_eq!(SubjectId::from(-3i64).as_str(), "-3");
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&SubjectId::new("user-9")).unwrap();
        assert_eq!(json, "\"user-9\"");
    }
}
