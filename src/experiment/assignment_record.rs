//! Assignment Record - the binding of a subject to one variant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SubjectId;
use crate::Error;

/// Identifier of an assignment.
///
/// Derived from `(subject, experiment)` with BLAKE3, so every store and every
/// process computes the same id for the same pair. Each component is length
/// prefixed before hashing; names containing `:` cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(String);

impl AssignmentId {
    /// Derive the id for a `(subject, experiment)` pair.
    #[must_use]
    pub fn derive(subject: &SubjectId, experiment: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in [subject.as_str(), experiment] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let hash = hasher.finalize();
        Self(hash.to_hex()[..32].to_string())
    }

    /// Borrow the hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assignment Record binds a subject to exactly one variant of an experiment.
///
/// Once stored it is never modified. Re-requesting the variant returns the
/// recorded one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "StoredAssignment")]
pub struct AssignmentRecord {
    id: AssignmentId,
    subject: SubjectId,
    experiment: String,
    variant: String,
    assigned_at: DateTime<Utc>,
}

/// Serialized form; the id is checked against `(subject, experiment)`.
#[derive(Deserialize)]
struct StoredAssignment {
    id: AssignmentId,
    subject: SubjectId,
    experiment: String,
    variant: String,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<StoredAssignment> for AssignmentRecord {
    type Error = Error;

    fn try_from(stored: StoredAssignment) -> Result<Self, Self::Error> {
        let expected = AssignmentId::derive(&stored.subject, &stored.experiment);
        if stored.id != expected {
            return Err(Error::InvalidInput(format!(
                "assignment id {} does not match {}/{}",
                stored.id, stored.subject, stored.experiment
            )));
        }
        Ok(Self {
            id: stored.id,
            subject: stored.subject,
            experiment: stored.experiment,
            variant: stored.variant,
            assigned_at: stored.assigned_at,
        })
    }
}

impl AssignmentRecord {
    /// Create an assignment record.
    ///
    /// # Arguments
    ///
    /// * `subject` - The bucketed subject
    /// * `experiment` - Experiment name
    /// * `variant` - Name of the selected variant
    /// * `assigned_at` - Assignment instant
    #[must_use]
    pub fn new(
        subject: impl Into<SubjectId>,
        experiment: impl Into<String>,
        variant: impl Into<String>,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        let subject = subject.into();
        let experiment = experiment.into();
        Self {
            id: AssignmentId::derive(&subject, &experiment),
            subject,
            experiment,
            variant: variant.into(),
            assigned_at,
        }
    }

    /// Get the assignment id.
    #[must_use]
    pub const fn id(&self) -> &AssignmentId {
        &self.id
    }

    /// Get the subject.
    #[must_use]
    pub const fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// Get the experiment name.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the assigned variant name.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Get the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}

impl fmt::Display for AssignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.subject, self.variant)
    }
}
