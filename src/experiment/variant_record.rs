//! Variant Record - one treatment arm of an experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Variant Record represents a treatment arm.
///
/// The weight is relative: a variant with weight 2 is picked twice as often
/// as one with weight 1. The `config` payload is opaque to this crate and is
/// handed back to callers as per-variant feature flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantRecord {
    experiment: String,
    name: String,
    #[serde(default)]
    description: String,
    weight: u32,
    #[serde(default = "empty_config")]
    config: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl VariantRecord {
    /// Create a weight-1 variant with an empty config.
    ///
    /// # Arguments
    ///
    /// * `experiment` - Name of the owning experiment
    /// * `name` - Variant name, unique within the experiment
    #[must_use]
    pub fn new(experiment: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            name: name.into(),
            description: String::new(),
            weight: 1,
            config: empty_config(),
            created_at: Utc::now(),
        }
    }

    /// Create a builder for constructing a variant record with optional fields.
    #[must_use]
    pub fn builder(experiment: impl Into<String>, name: impl Into<String>) -> VariantRecordBuilder {
        VariantRecordBuilder::new(experiment, name)
    }

    /// Get the owning experiment name.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the variant name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the selection weight.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Get the configuration payload.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Validate administrative invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty name or a zero weight.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "experiment {}: variant name is empty",
                self.experiment
            )));
        }
        if self.weight == 0 {
            return Err(Error::InvalidInput(format!(
                "variant {}/{}: weight must be at least 1",
                self.experiment, self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.experiment, self.name)
    }
}

/// Builder for `VariantRecord`.
#[derive(Debug)]
pub struct VariantRecordBuilder {
    record: VariantRecord,
}

impl VariantRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(experiment: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record: VariantRecord::new(experiment, name),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = description.into();
        self
    }

    /// Set the selection weight.
    #[must_use]
    pub const fn weight(mut self, weight: u32) -> Self {
        self.record.weight = weight;
        self
    }

    /// Set the configuration payload.
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.record.config = config;
        self
    }

    /// Build the `VariantRecord`.
    #[must_use]
    pub fn build(self) -> VariantRecord {
        self.record
    }
}
