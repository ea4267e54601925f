//! A/B testing service
//!
//! The in-process API the web application calls from its request handlers.
//! The repository is injected; the service holds no other state.
//!
//! Reading and assigning are separate operations:
//! [`AbTesting::peek_assignment`] never writes, [`AbTesting::get_or_assign`]
//! may create the one assignment row for the pair.

use std::sync::Arc;

use tracing::{debug, info};

use crate::allocator::{decide_inclusion, select_variant};
use crate::clock::{Clock, SystemClock};
use crate::experiment::{AssignmentRecord, ConversionKind, ConversionRecord, SubjectId};
use crate::results::{compute_results, ExperimentResults};
use crate::store::{ExperimentRepository, MemoryStore};
use crate::{Error, Result};

/// A/B testing service over a repository.
///
/// # Example
///
/// ```rust
/// use pal_abtest::experiment::{ConversionKind, ExperimentRecord, VariantRecord};
/// use pal_abtest::store::{ExperimentRepository, MemoryStore};
/// use pal_abtest::AbTesting;
///
/// # fn example() -> pal_abtest::Result<()> {
/// let store = MemoryStore::new();
/// store.create_experiment(ExperimentRecord::new("onboarding_flow"))?;
/// store.add_variant(VariantRecord::new("onboarding_flow", "control"))?;
///
/// let ab = AbTesting::new(store);
/// let variant = ab.get_variant(42u64, "onboarding_flow")?;
/// assert_eq!(variant.as_deref(), Some("control"));
///
/// assert!(ab.track_conversion(42u64, "onboarding_flow", ConversionKind::CompletedOnboarding, None)?);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct AbTesting<R = MemoryStore> {
    repository: R,
    clock: Arc<dyn Clock>,
}

impl<R: ExperimentRepository> AbTesting<R> {
    /// Service over `repository` using the wall clock.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> AbTestingBuilder<R> {
        AbTestingBuilder::default()
    }

    /// The underlying repository.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// The stored assignment for `(subject, experiment)`, without assigning.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn peek_assignment(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
    ) -> Result<Option<AssignmentRecord>> {
        self.repository.assignment(&subject.into(), experiment)
    }

    /// Return the subject's variant, assigning one on first call.
    ///
    /// `None` means "no treatment": the experiment is unknown, not running,
    /// has no variants, or the subject falls outside its traffic share.
    /// Traffic-excluded subjects are not recorded, so they are evaluated
    /// again on the next call.
    ///
    /// # Errors
    ///
    /// Propagates repository failures other than the assignment uniqueness
    /// conflict, which is resolved by re-reading the winning row.
    pub fn get_or_assign(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
    ) -> Result<Option<String>> {
        let subject = subject.into();

        if let Some(existing) = self.repository.assignment(&subject, experiment)? {
            return Ok(Some(existing.variant().to_string()));
        }

        let Some(record) = self.repository.experiment(experiment)? else {
            debug!(%subject, experiment, "Experiment not found");
            return Ok(None);
        };

        let now = self.clock.now();
        if !record.is_running_at(now) {
            debug!(%subject, experiment, "Experiment not running");
            return Ok(None);
        }

        if !decide_inclusion(&subject, &record) {
            debug!(
                %subject,
                experiment,
                traffic = record.traffic_percentage(),
                "Subject outside traffic share"
            );
            return Ok(None);
        }

        let variants = self.repository.variants(experiment)?;
        let Some(variant) = select_variant(&subject, &record, &variants) else {
            debug!(%subject, experiment, "Experiment has no variants");
            return Ok(None);
        };

        let assignment = AssignmentRecord::new(subject.clone(), experiment, variant.name(), now);
        match self.repository.insert_assignment(assignment) {
            Ok(()) => {
                info!(%subject, experiment, variant = variant.name(), "Assigned variant");
                Ok(Some(variant.name().to_string()))
            }
            Err(Error::Duplicate { .. }) => {
                debug!(%subject, experiment, "Lost assignment race, re-reading");
                Ok(self
                    .repository
                    .assignment(&subject, experiment)?
                    .map(|winner| winner.variant().to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Variant name shown to `subject`; see [`AbTesting::get_or_assign`].
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn get_variant(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
    ) -> Result<Option<String>> {
        self.get_or_assign(subject, experiment)
    }

    /// Config payload of the subject's assigned variant.
    ///
    /// Read-only: an unassigned subject (or a variant that no longer exists)
    /// gets an empty JSON object.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn get_variant_config(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
    ) -> Result<serde_json::Value> {
        let empty = || serde_json::Value::Object(serde_json::Map::new());
        let Some(assignment) = self.repository.assignment(&subject.into(), experiment)? else {
            return Ok(empty());
        };
        Ok(self
            .repository
            .variants(experiment)?
            .into_iter()
            .find(|v| v.name() == assignment.variant())
            .map_or_else(empty, |v| v.config().clone()))
    }

    /// Record that the subject's assignment reached `kind`.
    ///
    /// Returns `true` when a conversion was recorded, `false` when the
    /// subject has no assignment or already converted on this kind.
    ///
    /// # Errors
    ///
    /// Propagates repository failures other than the uniqueness conflict.
    pub fn record_conversion(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
        kind: ConversionKind,
        metadata: Option<serde_json::Value>,
    ) -> Result<bool> {
        let subject = subject.into();
        let Some(assignment) = self.repository.assignment(&subject, experiment)? else {
            debug!(%subject, experiment, %kind, "Conversion for unassigned subject ignored");
            return Ok(false);
        };

        let conversion =
            ConversionRecord::new(assignment.id().clone(), kind, metadata, self.clock.now());
        match self.repository.insert_conversion(conversion) {
            Ok(()) => {
                info!(
                    %subject,
                    experiment,
                    variant = assignment.variant(),
                    %kind,
                    "Recorded conversion"
                );
                Ok(true)
            }
            Err(Error::Duplicate { .. }) => {
                debug!(%subject, experiment, %kind, "Conversion already recorded");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Same as [`AbTesting::record_conversion`].
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn track_conversion(
        &self,
        subject: impl Into<SubjectId>,
        experiment: &str,
        kind: ConversionKind,
        metadata: Option<serde_json::Value>,
    ) -> Result<bool> {
        self.record_conversion(subject, experiment, kind, metadata)
    }

    /// Aggregated per-variant results. Unknown experiments yield empty results.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub fn get_results(&self, experiment: &str) -> Result<ExperimentResults> {
        if self.repository.experiment(experiment)?.is_none() {
            return Ok(ExperimentResults::default());
        }
        let variants = self.repository.variants(experiment)?;
        let assignments = self.repository.assignments(experiment)?;
        let conversions = self.repository.conversions(experiment)?;
        Ok(compute_results(&variants, &assignments, &conversions))
    }
}

/// Builder for [`AbTesting`].
pub struct AbTestingBuilder<R> {
    repository: Option<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Default for AbTestingBuilder<R> {
    fn default() -> Self {
        Self {
            repository: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl<R: ExperimentRepository> AbTestingBuilder<R> {
    /// Set the repository.
    #[must_use]
    pub fn repository(mut self, repository: R) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Set the clock used for run windows and timestamps.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if no repository was set.
    pub fn build(self) -> Result<AbTesting<R>> {
        let repository = self
            .repository
            .ok_or_else(|| Error::InvalidInput("AbTesting requires a repository".into()))?;
        Ok(AbTesting {
            repository,
            clock: self.clock,
        })
    }
}
