//! Experiment Record - root entity of an A/B test

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Experiment Record represents a named A/B test.
///
/// This is the root entity in the schema. Each experiment owns its
/// variants; assignments and conversions hang off it as well and are
/// removed with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    name: String,
    #[serde(default)]
    description: String,
    is_active: bool,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    traffic_percentage: u8,
    created_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Create an active experiment starting now with 100% traffic.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique experiment name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            is_active: true,
            start_date: now,
            end_date: None,
            traffic_percentage: 100,
            created_at: now,
        }
    }

    /// Create a builder for constructing an experiment record with optional fields.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(name)
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the operator has the experiment switched on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Get the start of the run window.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Get the end of the run window, if any.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Get the share of subjects (0-100) admitted to the experiment.
    #[must_use]
    pub const fn traffic_percentage(&self) -> u8 {
        self.traffic_percentage
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check whether the experiment is running at `now`.
    ///
    /// Running means active, started, and not past its end date.
    #[must_use]
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if matches!(self.end_date, Some(end) if now > end) {
            return false;
        }
        now >= self.start_date
    }

    /// Check whether the experiment is running against the wall clock.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running_at(Utc::now())
    }

    /// Validate administrative invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty name, a traffic
    /// percentage above 100, or an end date before the start date.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("experiment name is empty".into()));
        }
        if self.traffic_percentage > 100 {
            return Err(Error::InvalidInput(format!(
                "experiment {}: traffic percentage {} exceeds 100",
                self.name, self.traffic_percentage
            )));
        }
        if matches!(self.end_date, Some(end) if end < self.start_date) {
            return Err(Error::InvalidInput(format!(
                "experiment {}: end date precedes start date",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ExperimentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_active { "Active" } else { "Inactive" };
        write!(f, "{} ({status})", self.name)
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    record: ExperimentRecord,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: ExperimentRecord::new(name),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = description.into();
        self
    }

    /// Switch the experiment on or off.
    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.record.is_active = is_active;
        self
    }

    /// Set the start of the run window.
    #[must_use]
    pub const fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.record.start_date = start_date;
        self
    }

    /// Set the end of the run window.
    #[must_use]
    pub const fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.record.end_date = Some(end_date);
        self
    }

    /// Set the traffic percentage (0-100).
    #[must_use]
    pub const fn traffic_percentage(mut self, traffic_percentage: u8) -> Self {
        self.record.traffic_percentage = traffic_percentage;
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_experiment_record_new() {
        let record = ExperimentRecord::new("onboarding_flow");
        assert_eq!(record.name(), "onboarding_flow");
        assert!(record.is_active());
        assert_eq!(record.traffic_percentage(), 100);
        assert!(record.end_date().is_none());
        assert!(record.description().is_empty());
    }

    #[test]
    fn test_experiment_record_builder() {
        let record = ExperimentRecord::builder("checkout")
            .description("Checkout copy test")
            .traffic_percentage(25)
            .active(false)
            .build();

        assert_eq!(record.description(), "Checkout copy test");
        assert_eq!(record.traffic_percentage(), 25);
        assert!(!record.is_active());
    }

    #[test]
    fn test_is_running_window() {
        let now = Utc::now();
        let record = ExperimentRecord::builder("window")
            .start_date(now - Duration::days(1))
            .end_date(now + Duration::days(1))
            .build();

        assert!(record.is_running_at(now));
        assert!(!record.is_running_at(now - Duration::days(2)));
        assert!(!record.is_running_at(now + Duration::days(2)));
        // Both window edges are inclusive
        assert!(record.is_running_at(now - Duration::days(1)));
        assert!(record.is_running_at(now + Duration::days(1)));
    }

    #[test]
    fn test_inactive_never_running() {
        let now = Utc::now();
        let record = ExperimentRecord::builder("off")
            .start_date(now - Duration::days(1))
            .active(false)
            .build();
        assert!(!record.is_running_at(now));
    }

    #[test]
    fn test_display() {
        let on = ExperimentRecord::new("a");
        let off = ExperimentRecord::builder("b").active(false).build();
        assert_eq!(on.to_string(), "a (Active)");
        assert_eq!(off.to_string(), "b (Inactive)");
    }

    #[test]
    fn test_validate() {
        assert!(ExperimentRecord::new("ok").validate().is_ok());
        assert!(ExperimentRecord::new("  ").validate().is_err());
        assert!(ExperimentRecord::builder("too_much")
            .traffic_percentage(101)
            .build()
            .validate()
            .is_err());

        let now = Utc::now();
        let backwards = ExperimentRecord::builder("backwards")
            .start_date(now)
            .end_date(now - Duration::hours(1))
            .build();
        assert!(backwards.validate().is_err());
    }
}
