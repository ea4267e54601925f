//! In-memory repository implementation using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.
//! For persistence, use [`JournalStore`](super::JournalStore).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{validate_variant_set, ExperimentRepository};
use crate::experiment::{
    AssignmentId, AssignmentRecord, ConversionKind, ConversionRecord, ExperimentRecord,
    SubjectId, VariantRecord,
};
use crate::{Error, Result};

/// In-memory repository using lock-free concurrent hashmaps.
///
/// Thread-safe and optimized for high-concurrency read/write workloads.
/// Uniqueness is enforced through the `DashMap` entry API, which holds the
/// shard lock between the existence check and the insert.
///
/// # Example
///
/// ```rust
/// use pal_abtest::experiment::ExperimentRecord;
/// use pal_abtest::store::{ExperimentRepository, MemoryStore};
///
/// # fn example() -> pal_abtest::Result<()> {
/// let store = MemoryStore::new();
/// store.create_experiment(ExperimentRecord::new("hello"))?;
/// assert!(store.experiment("hello")?.is_some());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    experiments: DashMap<String, ExperimentRecord>,
    variants: DashMap<String, Vec<VariantRecord>>,
    assignments: DashMap<AssignmentId, AssignmentRecord>,
    conversions: DashMap<(AssignmentId, ConversionKind), ConversionRecord>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no experiments, assignments, or conversions).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.assignments.is_empty() && self.conversions.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of assignments in the store.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Get the number of conversions in the store.
    #[must_use]
    pub fn conversion_count(&self) -> usize {
        self.conversions.len()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.conversions.clear();
        self.assignments.clear();
        self.variants.clear();
        self.experiments.clear();
    }
}

impl ExperimentRepository for MemoryStore {
    fn experiment(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.get(name).map(|e| e.value().clone()))
    }

    fn experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut all: Vec<ExperimentRecord> =
            self.experiments.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    fn variants(&self, experiment: &str) -> Result<Vec<VariantRecord>> {
        Ok(self
            .variants
            .get(experiment)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }

    fn assignment(
        &self,
        subject: &SubjectId,
        experiment: &str,
    ) -> Result<Option<AssignmentRecord>> {
        let id = AssignmentId::derive(subject, experiment);
        Ok(self.assignments.get(&id).map(|a| a.value().clone()))
    }

    fn insert_assignment(&self, record: AssignmentRecord) -> Result<()> {
        match self.assignments.entry(record.id().clone()) {
            Entry::Occupied(_) => Err(Error::duplicate(
                "assignment",
                format!("{}/{}", record.subject(), record.experiment()),
            )),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn insert_conversion(&self, record: ConversionRecord) -> Result<()> {
        if !self.assignments.contains_key(record.assignment_id()) {
            return Err(Error::NotFound(format!(
                "assignment {}",
                record.assignment_id()
            )));
        }
        let key = (record.assignment_id().clone(), record.kind());
        match self.conversions.entry(key) {
            Entry::Occupied(_) => Err(Error::duplicate(
                "conversion",
                format!("{}/{}", record.assignment_id(), record.kind()),
            )),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn assignments(&self, experiment: &str) -> Result<Vec<AssignmentRecord>> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| a.experiment() == experiment)
            .map(|a| a.value().clone())
            .collect())
    }

    fn conversions(&self, experiment: &str) -> Result<Vec<ConversionRecord>> {
        Ok(self
            .conversions
            .iter()
            .filter(|c| {
                self.assignments
                    .get(c.assignment_id())
                    .is_some_and(|a| a.experiment() == experiment)
            })
            .map(|c| c.value().clone())
            .collect())
    }

    fn create_experiment(&self, record: ExperimentRecord) -> Result<()> {
        record.validate()?;
        match self.experiments.entry(record.name().to_string()) {
            Entry::Occupied(_) => Err(Error::duplicate("experiment", record.name())),
            Entry::Vacant(slot) => {
                self.variants.insert(record.name().to_string(), Vec::new());
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn add_variant(&self, record: VariantRecord) -> Result<()> {
        record.validate()?;
        // Holding the experiment guard keeps a concurrent delete out until
        // the variant is in place.
        let Some(_experiment) = self.experiments.get(record.experiment()) else {
            return Err(Error::NotFound(format!("experiment {}", record.experiment())));
        };
        let mut variants = self
            .variants
            .entry(record.experiment().to_string())
            .or_default();
        if variants.iter().any(|v| v.name() == record.name()) {
            return Err(Error::duplicate(
                "variant",
                format!("{}/{}", record.experiment(), record.name()),
            ));
        }
        variants.push(record);
        Ok(())
    }

    fn install_experiment(
        &self,
        record: ExperimentRecord,
        variants: Vec<VariantRecord>,
    ) -> Result<()> {
        validate_variant_set(&record, &variants)?;
        match self.experiments.entry(record.name().to_string()) {
            Entry::Occupied(_) => Err(Error::duplicate("experiment", record.name())),
            Entry::Vacant(slot) => {
                // Readers look the experiment up first, so the variants must
                // land before the slot is filled.
                self.variants.insert(record.name().to_string(), variants);
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn delete_experiment(&self, name: &str) -> Result<bool> {
        if self.experiments.remove(name).is_none() {
            return Ok(false);
        }
        self.variants.remove(name);
        self.conversions.retain(|(id, _), _| {
            self.assignments
                .get(id)
                .map_or(true, |a| a.experiment() != name)
        });
        self.assignments.retain(|_, a| a.experiment() != name);
        Ok(true)
    }
}
