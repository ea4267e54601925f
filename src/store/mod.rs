//! Experiment Repository
//!
//! Storage for experiments, variants, assignments and conversions behind
//! a single trait, so the service can be handed any backend:
//! - [`MemoryStore`]: lock-free in-memory backend (default)
//! - [`JournalStore`]: in-memory state plus an append-only JSON-lines journal
//!
//! # Uniqueness
//!
//! Backends are the authority for the two uniqueness constraints:
//! one assignment per `(subject, experiment)` and one conversion per
//! `(assignment, kind)`. Inserting a row that already exists fails with
//! [`Error::Duplicate`](crate::Error::Duplicate); the check and the insert
//! happen atomically, so of two racing writers exactly one succeeds.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use pal_abtest::experiment::{AssignmentRecord, ExperimentRecord, VariantRecord};
//! use pal_abtest::store::{ExperimentRepository, MemoryStore};
//!
//! # fn example() -> pal_abtest::Result<()> {
//! let store = MemoryStore::new();
//! store.create_experiment(ExperimentRecord::new("checkout"))?;
//! store.add_variant(VariantRecord::new("checkout", "control"))?;
//!
//! let row = AssignmentRecord::new(1u64, "checkout", "control", Utc::now());
//! store.insert_assignment(row.clone())?;
//! assert!(store.insert_assignment(row).unwrap_err().is_duplicate());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod journal;
mod memory;

pub use journal::{JournalEvent, JournalStore};
pub use memory::MemoryStore;

use crate::experiment::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, SubjectId, VariantRecord,
};
use crate::{Error, Result};

/// Repository the A/B testing service depends on.
///
/// Every method is synchronous and expected to be fast; there is nothing
/// to retry or time out at this layer.
pub trait ExperimentRepository: Send + Sync {
    /// Look up an experiment by name.
    fn experiment(&self, name: &str) -> Result<Option<ExperimentRecord>>;

    /// List all experiments, ordered by name.
    fn experiments(&self) -> Result<Vec<ExperimentRecord>>;

    /// Variants of an experiment in declaration order.
    ///
    /// Unknown experiments have no variants.
    fn variants(&self, experiment: &str) -> Result<Vec<VariantRecord>>;

    /// The assignment for `(subject, experiment)`, if one exists.
    fn assignment(&self, subject: &SubjectId, experiment: &str)
        -> Result<Option<AssignmentRecord>>;

    /// Store a new assignment.
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`](crate::Error::Duplicate) when the pair already
    /// has an assignment.
    fn insert_assignment(&self, record: AssignmentRecord) -> Result<()>;

    /// Store a new conversion.
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`](crate::Error::Duplicate) when the assignment
    /// already converted on this kind, [`Error::NotFound`](crate::Error::NotFound)
    /// when the assignment does not exist.
    fn insert_conversion(&self, record: ConversionRecord) -> Result<()>;

    /// All assignments of an experiment.
    fn assignments(&self, experiment: &str) -> Result<Vec<AssignmentRecord>>;

    /// All conversions recorded against assignments of an experiment.
    fn conversions(&self, experiment: &str) -> Result<Vec<ConversionRecord>>;

    /// Register a new experiment.
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`](crate::Error::Duplicate) on a name clash,
    /// [`Error::InvalidInput`](crate::Error::InvalidInput) when the record
    /// fails validation.
    fn create_experiment(&self, record: ExperimentRecord) -> Result<()>;

    /// Append a variant to its experiment.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) when the experiment does
    /// not exist, [`Error::Duplicate`](crate::Error::Duplicate) when the
    /// name is taken within the experiment,
    /// [`Error::InvalidInput`](crate::Error::InvalidInput) for a zero weight.
    fn add_variant(&self, record: VariantRecord) -> Result<()>;

    /// Register an experiment together with its full variant list.
    ///
    /// The variants are in place before the experiment becomes visible to
    /// readers, so no assignment can be made against a partial variant set.
    /// Nothing is written when any record is invalid.
    ///
    /// # Errors
    ///
    /// [`Error::Duplicate`](crate::Error::Duplicate) when the experiment
    /// already exists, [`Error::InvalidInput`](crate::Error::InvalidInput)
    /// when a record fails validation, a variant belongs to another
    /// experiment, or two variants share a name.
    fn install_experiment(
        &self,
        record: ExperimentRecord,
        variants: Vec<VariantRecord>,
    ) -> Result<()>;

    /// Delete an experiment together with its variants, assignments and
    /// conversions. Returns whether the experiment existed.
    fn delete_experiment(&self, name: &str) -> Result<bool>;
}

/// Validate an experiment and the variant list installed with it.
///
/// # Errors
///
/// [`Error::InvalidInput`] for an invalid record, a variant owned by a
/// different experiment, or a repeated variant name.
pub fn validate_variant_set(record: &ExperimentRecord, variants: &[VariantRecord]) -> Result<()> {
    record.validate()?;
    for (idx, variant) in variants.iter().enumerate() {
        variant.validate()?;
        if variant.experiment() != record.name() {
            return Err(Error::InvalidInput(format!(
                "variant {}/{} does not belong to experiment {}",
                variant.experiment(),
                variant.name(),
                record.name()
            )));
        }
        if variants[..idx].iter().any(|v| v.name() == variant.name()) {
            return Err(Error::InvalidInput(format!(
                "variant name {} repeated in experiment {}",
                variant.name(),
                record.name()
            )));
        }
    }
    Ok(())
}
