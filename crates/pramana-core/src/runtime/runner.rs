// crates/pramana-core/src/runtime/runner.rs
// ============================================================================
// Module: Pramana Run Orchestrator
// Description: Bounded-concurrency suite execution with ordered reassembly.
// Purpose: Execute a suite against a resolved provider and seal the result.
// Dependencies: crate::{core, interfaces, runtime::cancel}, tokio
// ============================================================================

//! ## Overview
//! One runner executes one suite against one resolved provider. Cases run
//! through a bounded-concurrency pool sized for provider rate limits, not
//! throughput; outcomes are reassembled by case index so the final record
//! always matches suite order regardless of completion order. A failing case
//! is captured as a per-case error and never aborts the run; only internal
//! invariant violations are fatal. Cancellation stops new dispatches, waits a
//! grace period for in-flight calls, then marks still-pending cases as
//! cancelled error outcomes so every case appears exactly once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::core::assertions::evaluate;
use crate::core::case::TestCase;
use crate::core::hashing::HashError;
use crate::core::record::CaseError;
use crate::core::record::CaseErrorKind;
use crate::core::record::CaseOutcome;
use crate::core::record::RunResult;
use crate::core::suite::Suite;
use crate::core::time::Timestamp;
use crate::interfaces::Completion;
use crate::interfaces::CompletionError;
use crate::interfaces::CompletionProvider;
use crate::interfaces::CompletionRequest;
use crate::interfaces::ParameterEnforcement;
use crate::interfaces::ProviderMode;
use crate::runtime::cancel::CancelToken;

// ============================================================================
// SECTION: Runner Configuration
// ============================================================================

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    /// Requested sampling temperature.
    pub temperature: f64,
    /// Requested sampling seed.
    pub seed: Option<u64>,
    /// Maximum concurrent provider calls.
    pub max_concurrency: usize,
    /// Maximum attempts per case (first try plus retries) for transient
    /// failures.
    pub max_attempts: u32,
    /// Base delay for exponential retry backoff, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Per-case provider call deadline, in milliseconds.
    pub case_timeout_ms: u64,
    /// Optional whole-run deadline, in milliseconds.
    pub run_timeout_ms: Option<u64>,
    /// How long in-flight calls may finish after cancellation, in
    /// milliseconds.
    pub grace_period_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            seed: Some(42),
            max_concurrency: 4,
            max_attempts: 3,
            retry_base_delay_ms: 250,
            case_timeout_ms: 60_000,
            run_timeout_ms: None,
            grace_period_ms: 5_000,
        }
    }
}

// ============================================================================
// SECTION: Run Phase
// ============================================================================

/// Phase in which an internal invariant violation was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Cases are being dispatched and collected.
    Executing,
    /// Outcomes collected, aggregate being computed.
    Aggregating,
}

impl RunPhase {
    /// Returns the canonical phase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executing => "executing",
            Self::Aggregating => "aggregating",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Unrecoverable run failures. Per-case failures never surface here.
#[derive(Debug, Error)]
pub enum RunError {
    /// An internal invariant was violated.
    #[error("internal invariant violation during {phase}: {reason}")]
    Internal {
        /// Phase in which the violation was detected.
        phase: RunPhase,
        /// Violation description.
        reason: String,
    },
    /// Result fingerprinting failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Eval Runner
// ============================================================================

/// Executes one suite against one resolved provider.
///
/// # Invariants
/// - Per-run mutable state is owned exclusively by this instance.
/// - The final outcome sequence matches the suite's case order.
pub struct EvalRunner {
    /// Resolved provider serving all case dispatches.
    provider: Arc<dyn CompletionProvider>,
    /// Run configuration.
    config: RunnerConfig,
}

/// One collected case execution, tagged with its suite index.
struct CaseRun {
    /// Index of the case within the suite.
    index: usize,
    /// The sealed outcome.
    outcome: CaseOutcome,
    /// Enforcement report for successful completions.
    enforcement: Option<ParameterEnforcement>,
}

impl EvalRunner {
    /// Creates a runner for the given provider and configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, config: RunnerConfig) -> Self {
        Self {
            provider,
            config,
        }
    }

    /// Executes the suite and seals the aggregate result record.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Internal`] on invariant violations and
    /// [`RunError::Hash`] when fingerprinting fails. Per-case failures are
    /// captured inside the returned record, never raised here.
    pub async fn execute(
        &self,
        suite: &Suite,
        provider_mode: ProviderMode,
        cancel: &CancelToken,
    ) -> Result<RunResult, RunError> {
        let started_at = Timestamp::now();
        let total = suite.cases.len();
        let capabilities = self.provider.capabilities();

        // Internal stop signal: caller cancellation or run deadline.
        let stop = CancelToken::new();
        let forward = {
            let stop = stop.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                stop.cancel();
            })
        };
        let deadline = self.config.run_timeout_ms.map(|millis| {
            let stop = stop.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                stop.cancel();
            })
        });

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut joins: JoinSet<CaseRun> = JoinSet::new();
        for (index, case) in suite.cases.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let stop = stop.clone();
            let config = self.config;
            let case = case.clone();
            joins.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return cancelled_run(index, &case, "dispatch pool closed");
                };
                if stop.is_cancelled() {
                    return cancelled_run(index, &case, "run cancelled before dispatch");
                }
                run_case(provider.as_ref(), &case, &config, &stop, index).await
            });
        }

        let mut slots: Vec<Option<CaseOutcome>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        let mut all_enforced = true;
        let mut interrupted = false;

        while !joins.is_empty() {
            tokio::select! {
                joined = joins.join_next() => {
                    match joined {
                        Some(Ok(run)) => place(&mut slots, run, &mut all_enforced)?,
                        // Panicked or aborted tasks are backfilled below.
                        Some(Err(_)) => {}
                        None => break,
                    }
                }
                () = stop.cancelled() => {
                    interrupted = true;
                    break;
                }
            }
        }

        if interrupted {
            let grace_deadline =
                Instant::now() + Duration::from_millis(self.config.grace_period_ms);
            while !joins.is_empty() {
                let remaining = grace_deadline.saturating_duration_since(Instant::now());
                match tokio::time::timeout(remaining, joins.join_next()).await {
                    Ok(Some(Ok(run))) => place(&mut slots, run, &mut all_enforced)?,
                    Ok(Some(Err(_))) => {}
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
            joins.abort_all();
            while let Some(joined) = joins.join_next().await {
                if let Ok(run) = joined {
                    place(&mut slots, run, &mut all_enforced)?;
                }
            }
        }

        forward.abort();
        if let Some(handle) = deadline {
            handle.abort();
        }

        // Every case appears exactly once: backfill anything still pending.
        let mut cases = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(outcome) => cases.push(outcome),
                None => {
                    let case = suite.cases.get(index).ok_or_else(|| RunError::Internal {
                        phase: RunPhase::Aggregating,
                        reason: format!("case index {index} out of bounds"),
                    })?;
                    cases.push(CaseOutcome::errored(
                        case.id.clone(),
                        CaseError::new(
                            CaseErrorKind::Cancelled,
                            "case still pending when the run stopped",
                        ),
                    ));
                }
            }
        }

        let reproducible = capabilities.fully_deterministic_best_effort() && all_enforced;
        let result = RunResult::assemble(
            suite.version.clone(),
            suite.hash.clone(),
            self.provider.model_id().to_string(),
            provider_mode,
            self.config.temperature,
            self.config.seed,
            reproducible,
            cases,
            started_at,
            Timestamp::now(),
        )?;
        Ok(result)
    }
}

// ============================================================================
// SECTION: Case Execution
// ============================================================================

/// Places a collected run into its slot, enforcing exactly-once delivery.
fn place(
    slots: &mut [Option<CaseOutcome>],
    run: CaseRun,
    all_enforced: &mut bool,
) -> Result<(), RunError> {
    let slot = slots.get_mut(run.index).ok_or_else(|| RunError::Internal {
        phase: RunPhase::Executing,
        reason: format!("case index {} out of bounds", run.index),
    })?;
    if slot.is_some() {
        return Err(RunError::Internal {
            phase: RunPhase::Executing,
            reason: format!("case index {} delivered twice", run.index),
        });
    }
    if let Some(enforcement) = run.enforcement {
        *all_enforced &= enforcement.both();
    }
    *slot = Some(run.outcome);
    Ok(())
}

/// Builds a cancelled outcome for a case that never dispatched.
fn cancelled_run(index: usize, case: &TestCase, message: &str) -> CaseRun {
    CaseRun {
        index,
        outcome: CaseOutcome::errored(
            case.id.clone(),
            CaseError::new(CaseErrorKind::Cancelled, message),
        ),
        enforcement: None,
    }
}

/// Executes one case with per-call timeout and capped transient retries.
async fn run_case(
    provider: &dyn CompletionProvider,
    case: &TestCase,
    config: &RunnerConfig,
    stop: &CancelToken,
    index: usize,
) -> CaseRun {
    let request = CompletionRequest {
        input: case.input.clone(),
        system_prompt: None,
        temperature: config.temperature,
        seed: config.seed,
    };
    let case_deadline = Duration::from_millis(config.case_timeout_ms);
    let mut attempt: u32 = 1;
    loop {
        if stop.is_cancelled() {
            return cancelled_run(index, case, "run cancelled before dispatch");
        }
        let result = match tokio::time::timeout(case_deadline, provider.complete(&request)).await {
            Ok(inner) => inner,
            Err(_) => Err(CompletionError::Timeout(config.case_timeout_ms)),
        };
        match result {
            Ok(completion) => {
                return graded_run(index, case, completion);
            }
            Err(err) if err.is_transient() && attempt < config.max_attempts => {
                let shift = u64::from((attempt - 1).min(16));
                let delay = config.retry_base_delay_ms.saturating_mul(1_u64 << shift);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
            Err(err) => {
                return CaseRun {
                    index,
                    outcome: CaseOutcome::errored(case.id.clone(), CaseError::from(&err)),
                    enforcement: None,
                };
            }
        }
    }
}

/// Grades a successful completion against the case's assertion.
fn graded_run(index: usize, case: &TestCase, completion: Completion) -> CaseRun {
    match evaluate(&case.assertion, &completion.text, &case.ideal) {
        Ok(graded) => CaseRun {
            index,
            outcome: CaseOutcome {
                case_id: case.id.clone(),
                passed: graded.passed,
                output: Some(completion.text),
                latency_ms: completion.latency_ms,
                token_count: completion.token_count,
                error: None,
            },
            enforcement: Some(completion.enforcement),
        },
        Err(err) => CaseRun {
            index,
            outcome: CaseOutcome {
                case_id: case.id.clone(),
                passed: false,
                output: Some(completion.text),
                latency_ms: completion.latency_ms,
                token_count: completion.token_count,
                error: Some(CaseError::new(CaseErrorKind::InvalidCase, err.to_string())),
            },
            enforcement: Some(completion.enforcement),
        },
    }
}
