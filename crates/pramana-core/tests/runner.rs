// crates/pramana-core/tests/runner.rs
// ============================================================================
// Module: Run Orchestrator Tests
// Description: Verifies ordering, retries, cancellation, and determinism.
// ============================================================================
//! ## Overview
//! Drives the runner against scripted in-process providers. Completion-order
//! shuffling, transient retry budgets, per-case timeouts, run deadlines, and
//! external cancellation are all exercised under the paused tokio clock so
//! timing behavior is deterministic.

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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pramana_core::Assertion;
use pramana_core::AssertionKind;
use pramana_core::CancelToken;
use pramana_core::CaseErrorKind;
use pramana_core::CaseMetadata;
use pramana_core::Category;
use pramana_core::Completion;
use pramana_core::CompletionError;
use pramana_core::CompletionProvider;
use pramana_core::CompletionRequest;
use pramana_core::DEFAULT_HASH_ALGORITHM;
use pramana_core::Difficulty;
use pramana_core::EvalRunner;
use pramana_core::ParameterEnforcement;
use pramana_core::ProviderCapabilities;
use pramana_core::ProviderMode;
use pramana_core::RunnerConfig;
use pramana_core::Suite;
use pramana_core::SuiteStore;
use pramana_core::SuiteTier;
use pramana_core::TestCase;
use pramana_core::hashing::hash_bytes;
use tempfile::TempDir;

// ============================================================================
// SECTION: Scripted Provider
// ============================================================================

/// Scripted behavior for one prompt.
#[derive(Debug, Clone)]
enum Script {
    /// Answer with the given text after an optional delay.
    Answer {
        /// Response text.
        text: String,
        /// Delay before responding, in milliseconds.
        delay_ms: u64,
    },
    /// Always fail with a transient error.
    Transient,
    /// Always fail with an auth error.
    Auth,
    /// Never respond within any reasonable deadline.
    Stall,
}

/// In-process provider that replays scripted behaviors by prompt.
struct ScriptedProvider {
    /// Declared capabilities.
    capabilities: ProviderCapabilities,
    /// Enforcement reported on every successful completion.
    enforcement: ParameterEnforcement,
    /// Prompt to scripted behavior.
    scripts: BTreeMap<String, Script>,
    /// Call count per prompt, across retries.
    calls: Mutex<BTreeMap<String, u64>>,
}

impl ScriptedProvider {
    /// Creates a fully-enforcing provider from the given scripts.
    fn new(scripts: BTreeMap<String, Script>) -> Self {
        Self {
            capabilities: ProviderCapabilities {
                honors_temperature: true,
                honors_seed: true,
            },
            enforcement: ParameterEnforcement {
                temperature: true,
                seed: true,
            },
            scripts,
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns how many times the given prompt was dispatched.
    fn call_count(&self, prompt: &str) -> u64 {
        self.calls
            .lock()
            .unwrap()
            .get(prompt)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn model_id(&self) -> &str {
        "scripted-test-model"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.input.clone())
            .or_insert(0) += 1;
        let script = self.scripts.get(&request.input).cloned().ok_or_else(|| {
            CompletionError::MalformedResponse(format!("no script for `{}`", request.input))
        })?;
        match script {
            Script::Answer { text, delay_ms } => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Ok(Completion {
                    token_count: self.estimate_tokens(&text),
                    latency_ms: delay_ms.max(1),
                    text,
                    enforcement: self.enforcement,
                })
            }
            Script::Transient => Err(CompletionError::Transient(
                "scripted transient failure".to_string(),
            )),
            Script::Auth => Err(CompletionError::Auth("scripted auth failure".to_string())),
            Script::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(CompletionError::Timeout(3_600_000))
            }
        }
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds an n-case exact-match suite with prompts `prompt {i}`.
fn make_suite(total: usize) -> Suite {
    let cases = (0..total)
        .map(|index| TestCase {
            id: format!("case-{}", index + 1),
            category: Category::Factual,
            input: format!("prompt {index}"),
            ideal: vec![format!("answer {index}")],
            assertion: Assertion {
                kind: AssertionKind::ExactMatch,
                case_sensitive: true,
            },
            metadata: CaseMetadata {
                difficulty: Difficulty::Easy,
                tokens_est: 10,
                tags: Vec::new(),
            },
        })
        .collect();
    Suite {
        tier: SuiteTier::Cheap,
        version: "v1.0".to_string(),
        hash: hash_bytes(DEFAULT_HASH_ALGORITHM, b"runner-fixture"),
        cases,
    }
}

/// Scripts every prompt to answer its ideal immediately.
fn echo_scripts(total: usize) -> BTreeMap<String, Script> {
    (0..total)
        .map(|index| {
            (
                format!("prompt {index}"),
                Script::Answer {
                    text: format!("answer {index}"),
                    delay_ms: 0,
                },
            )
        })
        .collect()
}

/// Test runner configuration with fast retries and a short grace period.
fn test_config() -> RunnerConfig {
    RunnerConfig {
        retry_base_delay_ms: 10,
        grace_period_ms: 100,
        ..RunnerConfig::default()
    }
}

/// Executes a suite against the provider with default mode and no cancel.
async fn run(
    provider: Arc<ScriptedProvider>,
    suite: &Suite,
    config: RunnerConfig,
) -> pramana_core::RunResult {
    let runner = EvalRunner::new(provider, config);
    runner
        .execute(suite, ProviderMode::Api, &CancelToken::new())
        .await
        .expect("run")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn full_pass_run_is_deterministic() {
    let suite = make_suite(5);
    let provider = Arc::new(ScriptedProvider::new(echo_scripts(5)));
    let first = run(Arc::clone(&provider), &suite, test_config()).await;

    let provider = Arc::new(ScriptedProvider::new(echo_scripts(5)));
    let second = run(provider, &suite, test_config()).await;

    assert_eq!(first.passed_count, 5);
    assert_eq!(first.error_count, 0);
    assert!((first.pass_rate - 1.0).abs() < f64::EPSILON);
    assert!(first.reproducible);
    assert_eq!(first.result_hash, second.result_hash);
}

#[tokio::test(start_paused = true)]
async fn outcomes_follow_suite_order_despite_completion_order() {
    let total = 8;
    let suite = make_suite(total);
    // Later cases finish first.
    let scripts = (0..total)
        .map(|index| {
            (
                format!("prompt {index}"),
                Script::Answer {
                    text: format!("answer {index}"),
                    delay_ms: ((total - index) * 10) as u64,
                },
            )
        })
        .collect();
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let config = RunnerConfig {
        max_concurrency: total,
        ..test_config()
    };
    let result = run(provider, &suite, config).await;

    let ids: Vec<&str> = result.cases.iter().map(|case| case.case_id.as_str()).collect();
    let expected: Vec<String> = (1..=total).map(|index| format!("case-{index}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(result.passed_count, total as u64);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_beyond_budget_is_captured_per_case() {
    let suite = make_suite(10);
    let mut scripts = echo_scripts(10);
    scripts.insert("prompt 3".to_string(), Script::Transient);
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let result = run(Arc::clone(&provider), &suite, test_config()).await;

    assert_eq!(result.error_count, 1);
    assert_eq!(result.passed_count, 9);
    assert!((result.pass_rate - 0.9).abs() < f64::EPSILON);
    let failed = &result.cases[3];
    assert_eq!(failed.case_id, "case-4");
    assert!(!failed.passed);
    assert_eq!(
        failed.error.as_ref().map(|err| err.kind),
        Some(CaseErrorKind::Transient)
    );
    // First try plus two retries.
    assert_eq!(provider.call_count("prompt 3"), 3);
}

#[tokio::test(start_paused = true)]
async fn per_case_timeout_is_reported_after_retries() {
    let suite = make_suite(1);
    let mut scripts = BTreeMap::new();
    scripts.insert("prompt 0".to_string(), Script::Stall);
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let config = RunnerConfig {
        case_timeout_ms: 500,
        ..test_config()
    };
    let result = run(Arc::clone(&provider), &suite, config).await;

    assert_eq!(result.error_count, 1);
    assert_eq!(
        result.cases[0].error.as_ref().map(|err| err.kind),
        Some(CaseErrorKind::Timeout)
    );
    assert_eq!(provider.call_count("prompt 0"), 3);
}

#[tokio::test(start_paused = true)]
async fn auth_failure_is_not_retried() {
    let suite = make_suite(1);
    let mut scripts = BTreeMap::new();
    scripts.insert("prompt 0".to_string(), Script::Auth);
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let result = run(Arc::clone(&provider), &suite, test_config()).await;

    assert_eq!(result.error_count, 1);
    assert_eq!(
        result.cases[0].error.as_ref().map(|err| err.kind),
        Some(CaseErrorKind::Auth)
    );
    assert_eq!(provider.call_count("prompt 0"), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_pass_rate_is_distinguishable_from_all_errors() {
    let suite = make_suite(4);

    // Every case answers, every answer is wrong.
    let wrong_scripts = (0..4)
        .map(|index| {
            (
                format!("prompt {index}"),
                Script::Answer {
                    text: "nope".to_string(),
                    delay_ms: 0,
                },
            )
        })
        .collect();
    let provider = Arc::new(ScriptedProvider::new(wrong_scripts));
    let all_wrong = run(provider, &suite, test_config()).await;
    assert!((all_wrong.pass_rate - 0.0).abs() < f64::EPSILON);
    assert_eq!(all_wrong.error_count, 0);

    // Every case fails outright.
    let auth_scripts = (0..4)
        .map(|index| (format!("prompt {index}"), Script::Auth))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(auth_scripts));
    let all_errored = run(provider, &suite, test_config()).await;
    assert!((all_errored.pass_rate - 0.0).abs() < f64::EPSILON);
    assert_eq!(all_errored.error_count, 4);

    assert_ne!(all_wrong.result_hash, all_errored.result_hash);
}

#[tokio::test(start_paused = true)]
async fn run_deadline_marks_pending_cases_cancelled() {
    let total = 5;
    let suite = make_suite(total);
    let mut scripts = echo_scripts(2);
    for index in 2..total {
        scripts.insert(format!("prompt {index}"), Script::Stall);
    }
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let config = RunnerConfig {
        max_concurrency: total,
        run_timeout_ms: Some(200),
        ..test_config()
    };
    let result = run(provider, &suite, config).await;

    assert_eq!(result.cases.len(), total);
    assert!(result.cases[0].passed);
    assert!(result.cases[1].passed);
    for outcome in &result.cases[2..] {
        assert_eq!(
            outcome.error.as_ref().map(|err| err.kind),
            Some(CaseErrorKind::Cancelled)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn external_cancellation_yields_one_outcome_per_case() {
    let total = 6;
    let suite = make_suite(total);
    let scripts = (0..total)
        .map(|index| (format!("prompt {index}"), Script::Stall))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(scripts));
    let runner = EvalRunner::new(provider, test_config());

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let result = runner
        .execute(&suite, ProviderMode::Subscription, &cancel)
        .await
        .expect("run");

    assert_eq!(result.cases.len(), total);
    assert_eq!(result.error_count, total as u64);
    for (index, outcome) in result.cases.iter().enumerate() {
        assert_eq!(outcome.case_id, format!("case-{}", index + 1));
        assert_eq!(
            outcome.error.as_ref().map(|err| err.kind),
            Some(CaseErrorKind::Cancelled)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn unenforced_seed_clears_the_reproducible_flag() {
    let suite = make_suite(2);
    let mut provider = ScriptedProvider::new(echo_scripts(2));
    provider.capabilities = ProviderCapabilities {
        honors_temperature: true,
        honors_seed: false,
    };
    provider.enforcement = ParameterEnforcement {
        temperature: true,
        seed: false,
    };
    let result = run(Arc::new(provider), &suite, test_config()).await;

    assert_eq!(result.passed_count, 2);
    assert!(!result.reproducible);
}

#[tokio::test(start_paused = true)]
async fn empty_suite_produces_an_empty_record() {
    let suite = make_suite(0);
    let provider = Arc::new(ScriptedProvider::new(BTreeMap::new()));
    let result = run(provider, &suite, test_config()).await;

    assert!(result.cases.is_empty());
    assert_eq!(result.passed_count, 0);
    assert!((result.pass_rate - 0.0).abs() < f64::EPSILON);
}

/// Builds one stored-suite JSONL line matching the echo script prompts.
fn stored_case_line(index: usize) -> String {
    let id = index + 1;
    format!(
        r#"{{"id":"case-{id}","category":"factual","input":"prompt {index}","ideal":["answer {index}"],"assertion":{{"type":"exact_match"}},"metadata":{{"difficulty":"easy","tokens_est":10,"tags":[]}}}}"#
    )
}

#[tokio::test(start_paused = true)]
async fn stored_suite_runs_identically_across_executions() {
    let dir = TempDir::new().expect("tempdir");
    let version_dir = dir.path().join("v1");
    std::fs::create_dir_all(&version_dir).expect("create version dir");
    let lines: Vec<String> = (0..10).map(stored_case_line).collect();
    std::fs::write(version_dir.join("cheap.jsonl"), lines.join("\n")).expect("write suite");
    std::fs::write(
        version_dir.join("manifest.json"),
        r#"{"version":"v1","suites":{"cheap":{"cases":10}}}"#,
    )
    .expect("write manifest");

    let store = SuiteStore::new(dir.path());
    let suite = store.load(SuiteTier::Cheap, "v1").expect("load suite");
    assert_eq!(suite.cases.len(), 10);

    let provider = Arc::new(ScriptedProvider::new(echo_scripts(10)));
    let first = run(Arc::clone(&provider), &suite, test_config()).await;
    let reloaded = store.load(SuiteTier::Cheap, "v1").expect("reload suite");
    let second = run(provider, &reloaded, test_config()).await;

    assert_eq!(first.passed_count, 10);
    assert_eq!(first.error_count, 0);
    assert_eq!(first.suite_hash, suite.hash);
    assert_eq!(second.suite_hash, suite.hash);
    assert_eq!(first.result_hash, second.result_hash);
}
