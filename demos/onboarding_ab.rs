//! Onboarding A/B Test Example
//!
//! Installs the built-in onboarding experiment, simulates a cohort of new
//! users moving through the funnel, and prints the per-variant results.
//!
//! Run with: cargo run --example onboarding_ab
//! Persist to a journal with: cargo run --example onboarding_ab -- /tmp/abtest.jsonl

use anyhow::Context;
use pal_abtest::experiment::ConversionKind;
use pal_abtest::seed::{create_onboarding_test, ONBOARDING_FLOW};
use pal_abtest::store::{ExperimentRepository, JournalStore, MemoryStore};
use pal_abtest::AbTesting;
use tracing_subscriber::EnvFilter;

const COHORT: u64 = 600;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    match std::env::args().nth(1) {
        Some(path) => {
            let store = JournalStore::open(&path)
                .with_context(|| format!("opening journal {path}"))?;
            run(store)
        }
        None => run(MemoryStore::new()),
    }
}

fn run<R: ExperimentRepository>(store: R) -> anyhow::Result<()> {
    println!("=== MyRecoveryPal A/B Testing ===\n");

    // -------------------------------------------------------------------------
    // 1. Initialize the onboarding test
    // -------------------------------------------------------------------------
    println!("1. Initializing A/B tests...");

    let test = create_onboarding_test(&store)?;
    let variants = store.variants(test.name())?;
    println!("   Created/Found A/B test: \"{}\"", test.name());
    println!("   Description: {}", test.description());
    println!(
        "   Status: {}",
        if test.is_active() { "Active" } else { "Inactive" }
    );
    println!("   Traffic: {}%", test.traffic_percentage());
    println!("   Variants: {}", variants.len());
    for variant in &variants {
        println!("     - {}: {}", variant.name(), variant.description());
        println!("       Config: {}", variant.config());
    }

    // -------------------------------------------------------------------------
    // 2. Assign a cohort and walk it through the funnel
    // -------------------------------------------------------------------------
    println!("\n2. Simulating {COHORT} sign-ups...");

    let ab = AbTesting::new(store);
    for user_id in 1..=COHORT {
        let Some(variant) = ab.get_variant(user_id, ONBOARDING_FLOW)? else {
            continue;
        };
        let config = ab.get_variant_config(user_id, ONBOARDING_FLOW)?;
        let steps = config["steps"].as_u64().unwrap_or(5);

        ab.track_conversion(user_id, ONBOARDING_FLOW, ConversionKind::StartedOnboarding, None)?;

        // Shorter flows lose fewer users per step
        let drop_out = user_id % (steps + 4);
        if drop_out >= steps {
            continue;
        }
        let metadata = serde_json::json!({ "variant": variant, "steps": steps });
        ab.track_conversion(
            user_id,
            ONBOARDING_FLOW,
            ConversionKind::CompletedOnboarding,
            Some(metadata),
        )?;
        if user_id % 3 == 0 {
            ab.track_conversion(user_id, ONBOARDING_FLOW, ConversionKind::FirstCheckin, None)?;
        }
    }

    // -------------------------------------------------------------------------
    // 3. Report
    // -------------------------------------------------------------------------
    println!("\n3. Results for \"{ONBOARDING_FLOW}\":");

    let results = ab.get_results(ONBOARDING_FLOW)?;
    for stats in results.iter() {
        println!("\n   {} ({} users)", stats.name, stats.total_subjects);
        for kind in [
            ConversionKind::StartedOnboarding,
            ConversionKind::CompletedOnboarding,
            ConversionKind::FirstCheckin,
        ] {
            if let Some(c) = stats.conversion(kind) {
                println!(
                    "     {:<22} {:>4}  {:>5.1}%",
                    c.label, c.count, c.percentage
                );
            }
        }
    }

    println!("\n   JSON:\n{}", serde_json::to_string_pretty(&results)?);
    println!("\nA/B tests initialized successfully!");

    Ok(())
}
