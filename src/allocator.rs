//! Variant Allocator
//!
//! Two decisions, both derived from the hash bucketer:
//!
//! - **Inclusion**: is the subject inside the experiment's traffic share?
//! - **Selection**: which variant does an included subject get?
//!
//! Both are pure functions of `(subject, experiment name, configuration)`.
//! The variant list is walked in the order given, so callers must pass
//! variants in their declaration order.

use std::fmt::Display;

use crate::bucket::{bucket, bucket_key, TRAFFIC_PURPOSE, VARIANT_PURPOSE};
use crate::experiment::{ExperimentRecord, VariantRecord};

/// Decide whether `subject` falls inside the experiment's traffic share.
///
/// Experiments at 100% admit everyone. Otherwise the subject is included
/// when `hash("{subject}:{name}:traffic") % 100 < traffic_percentage`, so 0%
/// admits nobody.
#[must_use]
pub fn decide_inclusion(subject: impl Display, experiment: &ExperimentRecord) -> bool {
    let traffic = u64::from(experiment.traffic_percentage());
    if traffic >= 100 {
        return true;
    }
    let key = bucket_key(subject, experiment.name(), TRAFFIC_PURPOSE);
    bucket(&key, 100).is_some_and(|value| value < traffic)
}

/// Pick a variant for `subject` by weight.
///
/// Returns `None` when `variants` is empty. The selection bucket is
/// `hash("{subject}:{name}:variant") % total_weight`; the first variant whose
/// cumulative weight exceeds it wins.
#[must_use]
pub fn select_variant<'a>(
    subject: impl Display,
    experiment: &ExperimentRecord,
    variants: &'a [VariantRecord],
) -> Option<&'a VariantRecord> {
    let total_weight: u64 = variants.iter().map(|v| u64::from(v.weight())).sum();
    let key = bucket_key(subject, experiment.name(), VARIANT_PURPOSE);
    let selection = bucket(&key, total_weight)?;

    let mut cumulative = 0u64;
    variants.iter().find(|variant| {
        cumulative += u64::from(variant.weight());
        selection < cumulative
    })
}
