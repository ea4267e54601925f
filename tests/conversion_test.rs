//! Conversion recording tests

use std::sync::Arc;

use chrono::Utc;
use pal_abtest::experiment::{AssignmentRecord, ConversionKind, ExperimentRecord, VariantRecord};
use pal_abtest::store::{ExperimentRepository, MemoryStore};
use pal_abtest::AbTesting;

fn service() -> AbTesting {
    let store = MemoryStore::new();
    store.create_experiment(ExperimentRecord::new("exp")).unwrap();
    store.add_variant(VariantRecord::new("exp", "control")).unwrap();
    store.add_variant(VariantRecord::new("exp", "treatment")).unwrap();
    AbTesting::new(store)
}

#[test]
fn test_conversion_recorded_once() {
    let ab = service();
    ab.get_variant(1u64, "exp").unwrap();

    let first = ab
        .record_conversion(1u64, "exp", ConversionKind::CompletedOnboarding, None)
        .unwrap();
    let second = ab
        .record_conversion(1u64, "exp", ConversionKind::CompletedOnboarding, None)
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(ab.repository().conversion_count(), 1);
}

#[test]
fn test_distinct_kinds_recorded_separately() {
    let ab = service();
    ab.get_variant(1u64, "exp").unwrap();

    for kind in [
        ConversionKind::StartedOnboarding,
        ConversionKind::CompletedStep1,
        ConversionKind::CompletedOnboarding,
    ] {
        assert!(ab.track_conversion(1u64, "exp", kind, None).unwrap());
    }
    assert_eq!(ab.repository().conversion_count(), 3);
}

#[test]
fn test_unassigned_conversion_rejected() {
    let ab = service();

    let tracked = ab
        .track_conversion(99u64, "exp", ConversionKind::FirstPost, None)
        .unwrap();

    assert!(!tracked);
    assert_eq!(ab.repository().conversion_count(), 0);
    // Tracking must not assign either
    assert!(ab.peek_assignment(99u64, "exp").unwrap().is_none());
}

#[test]
fn test_conversion_for_unknown_experiment() {
    let ab = service();
    ab.get_variant(1u64, "exp").unwrap();
    assert!(!ab
        .track_conversion(1u64, "ghost", ConversionKind::FirstPost, None)
        .unwrap());
}

#[test]
fn test_conversion_on_inactive_experiment() {
    // Conversions only need the assignment, not a running experiment
    let store = MemoryStore::new();
    store
        .create_experiment(ExperimentRecord::builder("exp").active(false).build())
        .unwrap();
    store.add_variant(VariantRecord::new("exp", "a")).unwrap();
    store
        .insert_assignment(AssignmentRecord::new(1u64, "exp", "a", Utc::now()))
        .unwrap();
    let ab = AbTesting::new(store);

    assert!(ab
        .track_conversion(1u64, "exp", ConversionKind::Day7Return, None)
        .unwrap());
    assert_eq!(ab.repository().conversion_count(), 1);
}

#[test]
fn test_conversion_kind_from_identifier() {
    let ab = service();
    ab.get_variant(1u64, "exp").unwrap();
    let kind: ConversionKind = "first_checkin".parse().unwrap();
    assert!(ab.track_conversion(1u64, "exp", kind, None).unwrap());
    let stored = ab.repository().conversions("exp").unwrap();
    assert_eq!(stored[0].kind(), ConversionKind::FirstCheckin);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_conversions() {
    let ab = Arc::new(service());
    ab.get_variant(1u64, "exp").unwrap();

    let mut handles = vec![];
    for _ in 0..32 {
        let ab = Arc::clone(&ab);
        handles.push(tokio::task::spawn_blocking(move || {
            ab.track_conversion(1u64, "exp", ConversionKind::FollowedUser, None)
                .unwrap()
        }));
    }

    let mut recorded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            recorded += 1;
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(ab.repository().conversion_count(), 1);
}
