// crates/pramana-core/src/core/record.rs
// ============================================================================
// Module: Pramana Result Record
// Description: Per-case outcomes and the hashable aggregate run record.
// Purpose: Seal run output into a deterministic, submission-ready artifact.
// Dependencies: crate::core::{hashing, time}, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! A [`RunResult`] is built exactly once at the end of a run and owned by the
//! orchestrator until handed to the submission boundary. Its `result_hash`
//! fingerprints `(suite hash, model, mode, parameters, per-case output)` for
//! deduplication and tamper evidence. Timestamps and latencies are excluded
//! from the fingerprint so two runs with identical provider behavior hash
//! identically; that identity is the basis for drift detection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::time::Timestamp;
use crate::interfaces::CompletionError;
use crate::interfaces::ProviderMode;

// ============================================================================
// SECTION: Case Errors
// ============================================================================

/// Stable labels for per-case, non-fatal failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseErrorKind {
    /// Transient network or provider failure after the retry budget.
    Transient,
    /// Rate limit exhaustion beyond the retry budget.
    RateLimited,
    /// Provider call exceeded the per-case deadline.
    Timeout,
    /// Authentication or authorization failure.
    Auth,
    /// Provider response could not be parsed.
    MalformedResponse,
    /// Case was still pending when the run was cancelled.
    Cancelled,
    /// Assertion could not be evaluated (suite validation should prevent this).
    InvalidCase,
}

impl CaseErrorKind {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Auth => "auth",
            Self::MalformedResponse => "malformed_response",
            Self::Cancelled => "cancelled",
            Self::InvalidCase => "invalid_case",
        }
    }
}

impl fmt::Display for CaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&CompletionError> for CaseErrorKind {
    fn from(err: &CompletionError) -> Self {
        match err {
            CompletionError::Transient(_) => Self::Transient,
            CompletionError::RateLimited(_) => Self::RateLimited,
            CompletionError::Timeout(_) => Self::Timeout,
            CompletionError::Auth(_) => Self::Auth,
            CompletionError::MalformedResponse(_) => Self::MalformedResponse,
        }
    }
}

/// A captured per-case failure. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseError {
    /// Stable failure category.
    pub kind: CaseErrorKind,
    /// Human-readable failure description.
    pub message: String,
}

impl CaseError {
    /// Creates a case error from a kind and message.
    #[must_use]
    pub fn new(kind: CaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&CompletionError> for CaseError {
    fn from(err: &CompletionError) -> Self {
        Self::new(CaseErrorKind::from(err), err.to_string())
    }
}

// ============================================================================
// SECTION: Case Outcome
// ============================================================================

/// Outcome of executing one test case. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Identifier of the test case.
    pub case_id: String,
    /// Whether the assertion passed. Always false when `error` is set.
    pub passed: bool,
    /// Provider output text, absent when the case errored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Wall-clock latency of the provider call in milliseconds.
    pub latency_ms: u64,
    /// Token count reported or estimated by the provider.
    pub token_count: u64,
    /// Captured failure, if the case could not be evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CaseError>,
}

impl CaseOutcome {
    /// Creates an errored outcome for a case that produced no output.
    #[must_use]
    pub fn errored(case_id: impl Into<String>, error: CaseError) -> Self {
        Self {
            case_id: case_id.into(),
            passed: false,
            output: None,
            latency_ms: 0,
            token_count: 0,
            error: Some(error),
        }
    }
}

// ============================================================================
// SECTION: Run Result
// ============================================================================

/// Aggregate record of one suite run, sealed with a deterministic fingerprint.
///
/// # Invariants
/// - `cases` order matches the suite's declared case order.
/// - `pass_rate` counts errored cases in the denominator only.
/// - `result_hash` is a pure function of the fingerprint fields; timestamps
///   and latencies do not participate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Suite version identifier.
    pub suite_version: String,
    /// Content hash of the suite that was run.
    pub suite_hash: HashDigest,
    /// Model identifier.
    pub model: String,
    /// Mode of the provider that served the run.
    pub provider_mode: ProviderMode,
    /// Requested sampling temperature.
    pub temperature: f64,
    /// Requested sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Whether the provider reported enforcing both reproducibility
    /// parameters for every completed case. Best-effort, never a
    /// determinism guarantee.
    pub reproducible: bool,
    /// Per-case outcomes in suite order.
    pub cases: Vec<CaseOutcome>,
    /// Number of cases whose assertion passed.
    pub passed_count: u64,
    /// Number of cases captured as errors.
    pub error_count: u64,
    /// `passed_count / total`; errored cases count in the denominator.
    pub pass_rate: f64,
    /// Run start wall-clock time.
    pub started_at: Timestamp,
    /// Run finish wall-clock time.
    pub finished_at: Timestamp,
    /// Deterministic fingerprint of the fields above (minus timestamps).
    pub result_hash: HashDigest,
}

impl RunResult {
    /// Assembles the final record, computing counts, rate, and fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when fingerprint canonicalization fails.
    #[allow(clippy::too_many_arguments, reason = "Record assembly takes the full run header.")]
    pub fn assemble(
        suite_version: String,
        suite_hash: HashDigest,
        model: String,
        provider_mode: ProviderMode,
        temperature: f64,
        seed: Option<u64>,
        reproducible: bool,
        cases: Vec<CaseOutcome>,
        started_at: Timestamp,
        finished_at: Timestamp,
    ) -> Result<Self, HashError> {
        let total = cases.len();
        let passed_count = count_u64(cases.iter().filter(|case| case.passed).count());
        let error_count = count_u64(cases.iter().filter(|case| case.error.is_some()).count());
        #[allow(clippy::cast_precision_loss, reason = "Suite sizes are far below 2^52 cases.")]
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed_count as f64 / total as f64
        };
        let fingerprint = RunFingerprint {
            suite_hash: &suite_hash,
            model: &model,
            provider_mode,
            temperature,
            seed,
            cases: cases.iter().map(CaseFingerprint::from).collect(),
            pass_rate,
            error_count,
        };
        let result_hash = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &fingerprint)?;
        Ok(Self {
            suite_version,
            suite_hash,
            model,
            provider_mode,
            temperature,
            seed,
            reproducible,
            cases,
            passed_count,
            error_count,
            pass_rate,
            started_at,
            finished_at,
            result_hash,
        })
    }
}

/// Widens a count to its stable wire width.
fn count_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Canonical fingerprint body hashed into `result_hash`.
#[derive(Serialize)]
struct RunFingerprint<'a> {
    /// Suite content hash.
    suite_hash: &'a HashDigest,
    /// Model identifier.
    model: &'a str,
    /// Provider mode.
    provider_mode: ProviderMode,
    /// Requested temperature.
    temperature: f64,
    /// Requested seed.
    seed: Option<u64>,
    /// Per-case fingerprint entries in suite order.
    cases: Vec<CaseFingerprint<'a>>,
    /// Aggregate pass rate.
    pass_rate: f64,
    /// Aggregate error count.
    error_count: u64,
}

/// Per-case contribution to the fingerprint.
#[derive(Serialize)]
struct CaseFingerprint<'a> {
    /// Case identifier.
    id: &'a str,
    /// Output text, absent for errored cases.
    output: Option<&'a str>,
    /// Pass flag.
    passed: bool,
    /// Stable error kind label, if the case errored.
    error: Option<&'a str>,
}

impl<'a> From<&'a CaseOutcome> for CaseFingerprint<'a> {
    fn from(outcome: &'a CaseOutcome) -> Self {
        Self {
            id: &outcome.case_id,
            output: outcome.output.as_deref(),
            passed: outcome.passed,
            error: outcome.error.as_ref().map(|err| err.kind.as_str()),
        }
    }
}
