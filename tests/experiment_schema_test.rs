//! A/B Testing Schema Tests
//!
//! Record construction, builders, and JSON round trips for the schema types.

use chrono::{Duration, TimeZone, Utc};
use pal_abtest::experiment::{
    AssignmentId, AssignmentRecord, ConversionKind, ConversionRecord, ExperimentRecord,
    SubjectId, VariantRecord,
};

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("onboarding_flow");

    assert_eq!(record.name(), "onboarding_flow");
    assert!(record.is_active());
    assert_eq!(record.traffic_percentage(), 100);
    assert!(record.created_at().timestamp() > 0);
    assert!(record.end_date().is_none());
    assert!(record.is_running());
}

#[test]
fn test_experiment_record_serialization() {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let record = ExperimentRecord::builder("checkout")
        .description("Checkout copy")
        .start_date(start)
        .end_date(start + Duration::days(30))
        .traffic_percentage(40)
        .build();

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
    assert_eq!(deserialized.end_date(), Some(start + Duration::days(30)));
}

#[test]
fn test_experiment_not_started_yet() {
    let record = ExperimentRecord::builder("future")
        .start_date(Utc::now() + Duration::days(1))
        .build();
    assert!(!record.is_running());
}

// =============================================================================
// VariantRecord Tests
// =============================================================================

#[test]
fn test_variant_record_with_config() {
    let config = serde_json::json!({
        "steps": 5,
        "show_progress_bar": true,
        "skip_allowed": true,
        "complete_later_prompt": true
    });

    let variant = VariantRecord::builder("onboarding_flow", "progressive")
        .description("Progressive 5-step")
        .weight(2)
        .config(config.clone())
        .build();

    assert_eq!(variant.experiment(), "onboarding_flow");
    assert_eq!(variant.config(), &config);
    assert_eq!(variant.weight(), 2);
    assert_eq!(variant.to_string(), "onboarding_flow: progressive");
}

#[test]
fn test_variant_record_serialization() {
    let variant = VariantRecord::builder("exp", "a")
        .config(serde_json::json!({"color": "teal"}))
        .build();
    let json = serde_json::to_string(&variant).unwrap();
    let back: VariantRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(variant, back);
}

// =============================================================================
// AssignmentRecord Tests
// =============================================================================

#[test]
fn test_assignment_record_id_matches_pair() {
    let record = AssignmentRecord::new("user-1", "exp", "a", Utc::now());
    assert_eq!(
        record.id(),
        &AssignmentId::derive(&SubjectId::from("user-1"), "exp")
    );
    assert_ne!(
        record.id(),
        &AssignmentId::derive(&SubjectId::from("user-1"), "other")
    );
    assert_eq!(record.id().as_str().len(), 32);
}

#[test]
fn test_assignment_record_serialization() {
    let record = AssignmentRecord::new(12u64, "exp", "a", Utc::now());
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["subject"], "12");
    assert_eq!(value["variant"], "a");

    let back: AssignmentRecord = serde_json::from_value(value).unwrap();
    assert_eq!(record, back);
}

// =============================================================================
// ConversionRecord Tests
// =============================================================================

#[test]
fn test_conversion_record_serialization() {
    let assignment = AssignmentRecord::new(12u64, "exp", "a", Utc::now());
    let record = ConversionRecord::new(
        assignment.id().clone(),
        ConversionKind::CompletedStep3,
        Some(serde_json::json!({"duration_s": 41})),
        Utc::now(),
    );

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["kind"], "completed_step_3");
    assert_eq!(value["metadata"]["duration_s"], 41);

    let back: ConversionRecord = serde_json::from_value(value).unwrap();
    assert_eq!(record, back);
}

#[test]
fn test_conversion_catalogue_order() {
    let ids: Vec<&str> = ConversionKind::ALL.iter().map(|k| k.as_str()).collect();
    assert_eq!(ids.first(), Some(&"started_onboarding"));
    assert_eq!(ids.last(), Some(&"day_7_return"));
    assert_eq!(ids.len(), 12);
}
