//! Experiment definitions
//!
//! Operators describe experiments as data. [`ExperimentDefinition`] is the
//! serde form (JSON), [`ExperimentDefinition::install`] writes it through a
//! repository, and [`create_onboarding_test`] installs the built-in
//! onboarding experiment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::experiment::{ExperimentRecord, VariantRecord};
use crate::store::{validate_variant_set, ExperimentRepository};
use crate::{Error, Result};

/// Name of the built-in onboarding experiment.
pub const ONBOARDING_FLOW: &str = "onboarding_flow";

fn default_active() -> bool {
    true
}

const fn default_traffic() -> u8 {
    100
}

const fn default_weight() -> u32 {
    1
}

/// Declarative variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantDefinition {
    /// Variant name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Selection weight
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Config payload
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Declarative experiment with its variants.
///
/// ```rust
/// use pal_abtest::seed::ExperimentDefinition;
///
/// let def = ExperimentDefinition::from_json(r#"{
///     "name": "checkout_copy",
///     "traffic_percentage": 20,
///     "variants": [{"name": "control"}, {"name": "friendly", "weight": 2}]
/// }"#).unwrap();
/// assert!(def.is_active);
/// assert_eq!(def.variants[1].weight, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentDefinition {
    /// Unique experiment name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Active flag
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Start of the run window; defaults to install time
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// End of the run window
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Traffic share, 0-100
    #[serde(default = "default_traffic")]
    pub traffic_percentage: u8,
    /// Variants in declaration order
    #[serde(default)]
    pub variants: Vec<VariantDefinition>,
}

impl ExperimentDefinition {
    /// Parse a definition from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a list of definitions from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) on malformed input.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }

    /// The experiment record this definition describes.
    #[must_use]
    pub fn experiment(&self) -> ExperimentRecord {
        let mut builder = ExperimentRecord::builder(&self.name)
            .description(&self.description)
            .active(self.is_active)
            .traffic_percentage(self.traffic_percentage);
        if let Some(start) = self.start_date {
            builder = builder.start_date(start);
        }
        if let Some(end) = self.end_date {
            builder = builder.end_date(end);
        }
        builder.build()
    }

    /// The variant records this definition describes, in declaration order.
    #[must_use]
    pub fn variant_records(&self) -> Vec<VariantRecord> {
        self.variants
            .iter()
            .map(|variant| {
                let builder = VariantRecord::builder(&self.name, &variant.name)
                    .description(&variant.description)
                    .weight(variant.weight);
                let builder = match &variant.config {
                    Some(config) => builder.config(config.clone()),
                    None => builder,
                };
                builder.build()
            })
            .collect()
    }

    /// Get-or-create the experiment. Variants are only added when the
    /// experiment is newly created; an existing experiment is returned
    /// untouched.
    ///
    /// The experiment and its variants are written in one repository call,
    /// so a failed install leaves nothing behind. When a concurrent install
    /// of the same name wins, the winner's record is returned.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`](crate::Error::InvalidInput) for an invalid
    /// definition (including repeated variant names); repository failures
    /// are propagated.
    pub fn install<R: ExperimentRepository + ?Sized>(&self, repo: &R) -> Result<ExperimentRecord> {
        if let Some(existing) = repo.experiment(&self.name)? {
            return Ok(existing);
        }

        let record = self.experiment();
        let variants = self.variant_records();
        validate_variant_set(&record, &variants)?;

        match repo.install_experiment(record.clone(), variants) {
            Ok(()) => {}
            Err(Error::Duplicate { .. }) => {
                debug!(experiment = %self.name, "Experiment installed concurrently, re-reading");
                return repo
                    .experiment(&self.name)?
                    .ok_or_else(|| Error::NotFound(format!("experiment {}", self.name)));
            }
            Err(e) => return Err(e),
        }
        info!(
            experiment = %self.name,
            variants = self.variants.len(),
            traffic = self.traffic_percentage,
            "Installed experiment"
        );
        Ok(record)
    }
}

/// Definition of the built-in onboarding experiment.
#[must_use]
pub fn onboarding_definition() -> ExperimentDefinition {
    ExperimentDefinition {
        name: ONBOARDING_FLOW.to_string(),
        description: "Test different onboarding flows to optimize completion rate".to_string(),
        is_active: true,
        start_date: None,
        end_date: None,
        traffic_percentage: 100,
        variants: vec![
            VariantDefinition {
                name: "control".to_string(),
                description: "Current 5-step onboarding flow".to_string(),
                weight: 1,
                config: Some(serde_json::json!({
                    "steps": 5,
                    "show_progress_bar": true,
                    "skip_allowed": false
                })),
            },
            VariantDefinition {
                name: "simplified".to_string(),
                description: "Simplified 3-step onboarding (profile, privacy, connect)"
                    .to_string(),
                weight: 1,
                config: Some(serde_json::json!({
                    "steps": 3,
                    "show_progress_bar": true,
                    "skip_allowed": true,
                    "skip_steps": [1, 2]
                })),
            },
            VariantDefinition {
                name: "progressive".to_string(),
                description: "Progressive 5-step with ability to skip and complete later"
                    .to_string(),
                weight: 1,
                config: Some(serde_json::json!({
                    "steps": 5,
                    "show_progress_bar": true,
                    "skip_allowed": true,
                    "complete_later_prompt": true
                })),
            },
        ],
    }
}

/// Get-or-create the onboarding experiment and its three variants.
///
/// # Errors
///
/// Propagates repository failures.
pub fn create_onboarding_test<R: ExperimentRepository + ?Sized>(
    repo: &R,
) -> Result<ExperimentRecord> {
    onboarding_definition().install(repo)
}
