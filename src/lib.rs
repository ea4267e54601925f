//! # pal-abtest: Deterministic A/B Testing for MyRecoveryPal
//!
//! Assigns subjects (users) to experiment variants, records funnel
//! conversions, and reports per-variant conversion rates.
//!
//! ## Design Principles
//!
//! - **Deterministic bucketing**: a subject's traffic bucket and variant come
//!   from a BLAKE3 hash of `"{subject}:{experiment}:{purpose}"`, stable across
//!   processes and restarts
//! - **One row per pair**: the repository's uniqueness constraint decides
//!   concurrent first assignments; the losing writer re-reads
//! - **No treatment is not an error**: unknown, stopped or empty experiments
//!   and traffic-excluded subjects yield `None`
//! - **Injected storage**: the service depends on [`store::ExperimentRepository`]
//!
//! ## Example Usage
//!
//! ```rust
//! use pal_abtest::experiment::ConversionKind;
//! use pal_abtest::seed::{create_onboarding_test, ONBOARDING_FLOW};
//! use pal_abtest::store::MemoryStore;
//! use pal_abtest::AbTesting;
//!
//! let store = MemoryStore::new();
//! create_onboarding_test(&store)?;
//!
//! let ab = AbTesting::new(store);
//! if let Some(variant) = ab.get_variant(1001u64, ONBOARDING_FLOW)? {
//!     let config = ab.get_variant_config(1001u64, ONBOARDING_FLOW)?;
//!     println!("{variant}: {config}");
//! }
//! ab.track_conversion(1001u64, ONBOARDING_FLOW, ConversionKind::CompletedOnboarding, None)?;
//!
//! let results = ab.get_results(ONBOARDING_FLOW)?;
//! assert_eq!(results.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod allocator;
pub mod bucket;
pub mod clock;
pub mod error;
pub mod experiment;
pub mod results;
pub mod seed;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::{AbTesting, AbTestingBuilder};
