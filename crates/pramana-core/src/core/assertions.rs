// crates/pramana-core/src/core/assertions.rs
// ============================================================================
// Module: Pramana Assertion Evaluator
// Description: Pure pass/fail evaluation of provider output against a rule.
// Purpose: Decide case outcomes without any I/O or shared state.
// Dependencies: crate::core::case, serde_json
// ============================================================================

//! ## Overview
//! Assertion evaluation is a pure function over `(rule, actual, ideal)`.
//! All string comparisons trim leading and trailing whitespace before
//! matching; internal whitespace is never touched. Case folding applies to
//! both sides when a rule is case-insensitive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::case::Assertion;
use crate::core::case::AssertionKind;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of evaluating one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionOutcome {
    /// Whether the output satisfied the rule.
    pub passed: bool,
    /// Human-readable grading detail.
    pub detail: String,
}

impl AssertionOutcome {
    /// Creates a passing outcome with the provided detail.
    #[must_use]
    fn passed(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    /// Creates a failing outcome with the provided detail.
    #[must_use]
    fn failed(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when an assertion cannot be evaluated.
///
/// Suite loading validates ideal requiredness, so these surface only when a
/// case bypassed the store.
#[derive(Debug, Error)]
pub enum AssertionError {
    /// The assertion kind requires at least one ideal entry.
    #[error("assertion `{kind}` requires at least one ideal entry")]
    MissingIdeal {
        /// The assertion kind missing its ideal.
        kind: AssertionKind,
    },
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates provider output against an assertion rule.
///
/// # Errors
///
/// Returns [`AssertionError::MissingIdeal`] when the kind requires an ideal
/// entry and none is present.
pub fn evaluate(
    assertion: &Assertion,
    actual: &str,
    ideal: &[String],
) -> Result<AssertionOutcome, AssertionError> {
    match assertion.kind {
        AssertionKind::ExactMatch => exact_match(assertion, actual, ideal),
        AssertionKind::Contains => contains(assertion, actual, ideal),
        AssertionKind::ContainsAny => contains_any(assertion, actual, ideal),
        AssertionKind::IsJson => Ok(is_json(actual, ideal)),
    }
}

/// Output must equal one of the ideal entries after trimming.
fn exact_match(
    assertion: &Assertion,
    actual: &str,
    ideal: &[String],
) -> Result<AssertionOutcome, AssertionError> {
    let first = require_ideal(assertion.kind, ideal)?;
    let actual_norm = normalize(actual, assertion.case_sensitive);
    for (index, entry) in ideal.iter().enumerate() {
        if actual_norm == normalize(entry, assertion.case_sensitive) {
            return Ok(AssertionOutcome::passed(format!(
                "matched ideal entry {index}"
            )));
        }
    }
    Ok(AssertionOutcome::failed(format!(
        "output does not equal any ideal entry (expected e.g. `{first}`)"
    )))
}

/// Output must contain the first ideal entry as a substring.
fn contains(
    assertion: &Assertion,
    actual: &str,
    ideal: &[String],
) -> Result<AssertionOutcome, AssertionError> {
    let term = require_ideal(assertion.kind, ideal)?;
    let haystack = normalize(actual, assertion.case_sensitive);
    let needle = normalize(term, assertion.case_sensitive);
    if haystack.contains(&needle) {
        Ok(AssertionOutcome::passed(format!("found `{term}`")))
    } else {
        Ok(AssertionOutcome::failed(format!("missing `{term}`")))
    }
}

/// Output must contain at least one ideal entry as a substring.
fn contains_any(
    assertion: &Assertion,
    actual: &str,
    ideal: &[String],
) -> Result<AssertionOutcome, AssertionError> {
    require_ideal(assertion.kind, ideal)?;
    let haystack = normalize(actual, assertion.case_sensitive);
    for (index, entry) in ideal.iter().enumerate() {
        let needle = normalize(entry, assertion.case_sensitive);
        if haystack.contains(&needle) {
            return Ok(AssertionOutcome::passed(format!(
                "matched ideal entry {index} (`{entry}`)"
            )));
        }
    }
    Ok(AssertionOutcome::failed(
        "output contains none of the ideal entries",
    ))
}

/// Output must parse as JSON; with an ideal, it must equal the reference.
fn is_json(actual: &str, ideal: &[String]) -> AssertionOutcome {
    let parsed: Value = match serde_json::from_str(actual.trim()) {
        Ok(value) => value,
        Err(err) => return AssertionOutcome::failed(format!("invalid json: {err}")),
    };
    let Some(reference_text) = ideal.first() else {
        return AssertionOutcome::passed("valid json");
    };
    let reference: Value = match serde_json::from_str(reference_text.trim()) {
        Ok(value) => value,
        Err(err) => {
            return AssertionOutcome::failed(format!("reference structure is not valid json: {err}"));
        }
    };
    if parsed == reference {
        AssertionOutcome::passed("json equals reference structure")
    } else {
        AssertionOutcome::failed("json does not equal reference structure")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the first ideal entry or the missing-ideal error.
fn require_ideal<'a>(
    kind: AssertionKind,
    ideal: &'a [String],
) -> Result<&'a str, AssertionError> {
    ideal.first().map(String::as_str).ok_or(AssertionError::MissingIdeal {
        kind,
    })
}

/// Trims surrounding whitespace and folds case when insensitive.
fn normalize(value: &str, case_sensitive: bool) -> String {
    let trimmed = value.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}
