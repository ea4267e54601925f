//! Results Aggregator
//!
//! Per-variant subject counts and conversion rates, computed from stored
//! assignments and conversions. Pure read-side projection.
//!
//! Serialized, an [`ExperimentResults`] keeps the reporting shape used by the
//! admin dashboard:
//!
//! ```text
//! {
//!   "control": {
//!     "description": "...",
//!     "total_users": 100,
//!     "conversions": {
//!       "completed_onboarding": {"label": "...", "count": 75, "rate": 0.75, "percentage": 75.0},
//!       ...
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::experiment::{
    AssignmentId, AssignmentRecord, ConversionKind, ConversionRecord, VariantRecord,
};

/// Conversion figures for one `(variant, kind)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionStats {
    /// Human-readable kind label
    pub label: &'static str,
    /// Subjects of the variant that converted on this kind
    pub count: u64,
    /// `count / total_subjects`, 4 decimals; 0 for an empty variant
    pub rate: f64,
    /// `rate * 100`, 1 decimal
    pub percentage: f64,
}

impl ConversionStats {
    fn new(kind: ConversionKind, count: u64, total_subjects: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let rate = if total_subjects > 0 {
            count as f64 / total_subjects as f64
        } else {
            0.0
        };
        Self {
            label: kind.label(),
            count,
            rate: round_to(rate, 4),
            percentage: round_to(rate * 100.0, 1),
        }
    }
}

/// Figures for one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantStats {
    /// Variant name
    #[serde(skip)]
    pub name: String,
    /// Variant description
    pub description: String,
    /// Number of subjects assigned to the variant
    #[serde(rename = "total_users")]
    pub total_subjects: u64,
    /// One entry per catalogue kind, in catalogue order
    pub conversions: BTreeMap<ConversionKind, ConversionStats>,
}

impl VariantStats {
    /// Figures for one kind.
    #[must_use]
    pub fn conversion(&self, kind: ConversionKind) -> Option<&ConversionStats> {
        self.conversions.get(&kind)
    }
}

/// Results of one experiment, variants in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentResults {
    variants: Vec<VariantStats>,
}

impl ExperimentResults {
    /// Stats for a variant by name.
    #[must_use]
    pub fn get(&self, variant: &str) -> Option<&VariantStats> {
        self.variants.iter().find(|v| v.name == variant)
    }

    /// Iterate variants in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariantStats> {
        self.variants.iter()
    }

    /// Number of variants reported.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// True for an unknown experiment or one without variants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Serialize for ExperimentResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.variants.len()))?;
        for stats in &self.variants {
            map.serialize_entry(&stats.name, stats)?;
        }
        map.end()
    }
}

/// Aggregate assignments and conversions per variant.
///
/// Assignments naming a variant that is not in `variants` are ignored, as
/// are conversions whose assignment is not in `assignments`.
#[must_use]
pub fn compute_results(
    variants: &[VariantRecord],
    assignments: &[AssignmentRecord],
    conversions: &[ConversionRecord],
) -> ExperimentResults {
    let mut subjects: FxHashMap<&str, u64> = FxHashMap::default();
    let mut variant_of: FxHashMap<&AssignmentId, &str> = FxHashMap::default();
    for assignment in assignments {
        *subjects.entry(assignment.variant()).or_default() += 1;
        variant_of.insert(assignment.id(), assignment.variant());
    }

    let mut converted: FxHashMap<(&str, ConversionKind), u64> = FxHashMap::default();
    for conversion in conversions {
        if let Some(variant) = variant_of.get(conversion.assignment_id()) {
            *converted.entry((*variant, conversion.kind())).or_default() += 1;
        }
    }

    let variants = variants
        .iter()
        .map(|variant| {
            let total = subjects.get(variant.name()).copied().unwrap_or(0);
            let conversions = ConversionKind::ALL
                .into_iter()
                .map(|kind| {
                    let count = converted.get(&(variant.name(), kind)).copied().unwrap_or(0);
                    (kind, ConversionStats::new(kind, count, total))
                })
                .collect();
            VariantStats {
                name: variant.name().to_string(),
                description: variant.description().to_string(),
                total_subjects: total,
                conversions,
            }
        })
        .collect();

    ExperimentResults { variants }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
