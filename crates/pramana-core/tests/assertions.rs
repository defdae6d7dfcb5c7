// crates/pramana-core/tests/assertions.rs
// ============================================================================
// Module: Assertion Evaluator Tests
// Description: Verifies pass/fail semantics for every assertion kind.
// ============================================================================
//! ## Overview
//! Exercises each assertion kind across case sensitivity, trimming, missing
//! ideals, and JSON structural comparison.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use pramana_core::Assertion;
use pramana_core::AssertionError;
use pramana_core::AssertionKind;
use pramana_core::evaluate;

/// Builds an assertion with explicit case sensitivity.
fn assertion(kind: AssertionKind, case_sensitive: bool) -> Assertion {
    Assertion {
        kind,
        case_sensitive,
    }
}

/// Converts string literals into an owned ideal vector.
fn ideal(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|entry| (*entry).to_string()).collect()
}

// ============================================================================
// SECTION: Exact Match
// ============================================================================

#[test]
fn exact_match_passes_on_equal_output() {
    let rule = assertion(AssertionKind::ExactMatch, true);
    let outcome = evaluate(&rule, "4", &ideal(&["4"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn exact_match_trims_surrounding_whitespace() {
    let rule = assertion(AssertionKind::ExactMatch, true);
    let outcome = evaluate(&rule, "  4\n", &ideal(&["4"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn exact_match_case_insensitive_ignores_case() {
    let rule = assertion(AssertionKind::ExactMatch, false);
    let outcome = evaluate(&rule, "Paris", &ideal(&["paris"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn exact_match_case_insensitive_still_fails_on_punctuation() {
    let rule = assertion(AssertionKind::ExactMatch, false);
    let outcome = evaluate(&rule, "Paris.", &ideal(&["paris"])).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn exact_match_accepts_any_ideal_entry() {
    let rule = assertion(AssertionKind::ExactMatch, true);
    let outcome = evaluate(&rule, "three", &ideal(&["3", "three"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn exact_match_keeps_internal_whitespace_significant() {
    let rule = assertion(AssertionKind::ExactMatch, true);
    let outcome = evaluate(&rule, "a  b", &ideal(&["a b"])).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn exact_match_without_ideal_is_an_error() {
    let rule = assertion(AssertionKind::ExactMatch, true);
    let result = evaluate(&rule, "4", &[]);
    assert!(matches!(
        result,
        Err(AssertionError::MissingIdeal {
            kind: AssertionKind::ExactMatch
        })
    ));
}

// ============================================================================
// SECTION: Contains
// ============================================================================

#[test]
fn contains_passes_on_substring() {
    let rule = assertion(AssertionKind::Contains, true);
    let outcome = evaluate(&rule, "The answer is 4.", &ideal(&["4"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn contains_uses_only_the_first_ideal_entry() {
    let rule = assertion(AssertionKind::Contains, true);
    let outcome = evaluate(&rule, "beta only", &ideal(&["alpha", "beta"])).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn contains_case_insensitive_folds_both_sides() {
    let rule = assertion(AssertionKind::Contains, false);
    let outcome = evaluate(&rule, "The CAPITAL is Paris", &ideal(&["paris"])).expect("evaluate");
    assert!(outcome.passed);
}

// ============================================================================
// SECTION: Contains Any
// ============================================================================

#[test]
fn contains_any_passes_when_later_entry_matches() {
    let rule = assertion(AssertionKind::ContainsAny, true);
    let outcome = evaluate(&rule, "only beta here", &ideal(&["alpha", "beta"])).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn contains_any_fails_when_no_entry_matches() {
    let rule = assertion(AssertionKind::ContainsAny, true);
    let outcome = evaluate(&rule, "gamma", &ideal(&["alpha", "beta"])).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn contains_any_without_ideal_is_an_error() {
    let rule = assertion(AssertionKind::ContainsAny, true);
    let result = evaluate(&rule, "anything", &[]);
    assert!(matches!(result, Err(AssertionError::MissingIdeal { .. })));
}

// ============================================================================
// SECTION: Is Json
// ============================================================================

#[test]
fn is_json_passes_on_empty_object() {
    let rule = assertion(AssertionKind::IsJson, true);
    let outcome = evaluate(&rule, "{}", &[]).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn is_json_fails_on_invalid_json() {
    let rule = assertion(AssertionKind::IsJson, true);
    let outcome = evaluate(&rule, "{not json", &[]).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn is_json_compares_structure_not_formatting() {
    let rule = assertion(AssertionKind::IsJson, true);
    let reference = ideal(&[r#"{"a": 1, "b": 2}"#]);
    let outcome = evaluate(&rule, "{\"b\":2,\n  \"a\":1}", &reference).expect("evaluate");
    assert!(outcome.passed);
}

#[test]
fn is_json_fails_on_structural_mismatch() {
    let rule = assertion(AssertionKind::IsJson, true);
    let reference = ideal(&[r#"{"a": 1}"#]);
    let outcome = evaluate(&rule, r#"{"a": 2}"#, &reference).expect("evaluate");
    assert!(!outcome.passed);
}

#[test]
fn is_json_tolerates_surrounding_whitespace() {
    let rule = assertion(AssertionKind::IsJson, true);
    let outcome = evaluate(&rule, "  [1, 2, 3]\n", &[]).expect("evaluate");
    assert!(outcome.passed);
}
