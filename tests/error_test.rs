//! Tests for error types

use pal_abtest::Error;

#[test]
fn test_duplicate_error() {
    let error = Error::duplicate("assignment", "42/onboarding_flow");
    let error_str = format!("{error}");
    assert!(error_str.contains("Duplicate assignment"));
    assert!(error_str.contains("42/onboarding_flow"));
    assert!(error.is_duplicate());
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("experiment ghost".to_string());
    assert_eq!(format!("{error}"), "Not found: experiment ghost");
    assert!(!error.is_duplicate());
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("weight must be at least 1".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("weight"));
}

#[test]
fn test_corrupt_error() {
    let error = Error::Corrupt {
        line: 7,
        reason: "expected value".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("line 7"));
    assert!(error_str.contains("expected value"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_error_debug() {
    let error = Error::NotFound("x".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("NotFound"));
}
