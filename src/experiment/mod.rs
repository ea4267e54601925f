//! A/B Testing Schema
//!
//! Records for experiments, their variants, subject assignments and
//! conversion events.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< VariantRecord (N)
//!        │
//!        └──< AssignmentRecord (N) [one per subject]
//!                    │
//!                    └──< ConversionRecord (N) [one per kind]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Utc;
//! use pal_abtest::experiment::{
//!     AssignmentRecord, ConversionKind, ConversionRecord, ExperimentRecord, VariantRecord,
//! };
//!
//! let experiment = ExperimentRecord::builder("onboarding_flow")
//!     .traffic_percentage(50)
//!     .build();
//! let control = VariantRecord::new(experiment.name(), "control");
//!
//! let assignment = AssignmentRecord::new(42u64, experiment.name(), control.name(), Utc::now());
//! let conversion = ConversionRecord::new(
//!     assignment.id().clone(),
//!     ConversionKind::CompletedOnboarding,
//!     None,
//!     Utc::now(),
//! );
//! assert_eq!(conversion.assignment_id(), assignment.id());
//! ```

mod assignment_record;
mod conversion_record;
mod experiment_record;
mod subject;
mod variant_record;

pub use assignment_record::{AssignmentId, AssignmentRecord};
pub use conversion_record::{ConversionKind, ConversionRecord};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder};
pub use subject::SubjectId;
pub use variant_record::{VariantRecord, VariantRecordBuilder};
