// crates/pramana-providers/src/claude_code.rs
// ============================================================================
// Module: Claude CLI Provider
// Description: Subscription-mode provider shelling out to the claude CLI.
// Purpose: Serve completions through a locally-authenticated subscription.
// Dependencies: pramana-core, serde, tokio
// ============================================================================

//! ## Overview
//! Subscription mode drives the locally-installed `claude` binary instead of
//! an API endpoint, so runs ride on the user's existing login with no key in
//! the environment. The CLI exposes neither temperature nor seed, so every
//! completion is reported as unenforced and records produced in this mode
//! are never marked reproducible. System prompts are folded into the prompt
//! text because `-p` accepts a single string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use pramana_core::Completion;
use pramana_core::CompletionError;
use pramana_core::CompletionProvider;
use pramana_core::CompletionRequest;
use pramana_core::ParameterEnforcement;
use pramana_core::ProviderCapabilities;
use serde::Deserialize;
use tokio::process::Command;

use crate::http::elapsed_ms;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default CLI binary name, resolved through `PATH`.
pub const CLAUDE_CLI_BINARY: &str = "claude";

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Subscription-mode provider backed by the `claude` CLI.
pub struct ClaudeCodeProvider {
    /// Model identifier passed via `--model`.
    model: String,
    /// CLI binary path or name, overridable for tests.
    binary: PathBuf,
}

impl ClaudeCodeProvider {
    /// Creates a provider using the `claude` binary from `PATH`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_binary(model, CLAUDE_CLI_BINARY)
    }

    /// Creates a provider using a specific binary path.
    #[must_use]
    pub fn with_binary(model: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for ClaudeCodeProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            honors_temperature: false,
            honors_seed: false,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let prompt = merge_prompt(request);

        let start = Instant::now();
        let output = Command::new(&self.binary)
            .arg("-p")
            .arg(&prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| {
                CompletionError::Transient(format!(
                    "failed to run `{}`: {err}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_cli_failure(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: CliResult = serde_json::from_str(stdout.trim())
            .map_err(|err| CompletionError::MalformedResponse(format!("invalid cli output: {err}")))?;
        let text = parsed.result;

        Ok(Completion {
            token_count: self.estimate_tokens(&text),
            latency_ms: elapsed_ms(start),
            text,
            enforcement: ParameterEnforcement {
                temperature: false,
                seed: false,
            },
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Folds the optional system prompt into a single prompt string.
fn merge_prompt(request: &CompletionRequest) -> String {
    request.system_prompt.as_deref().map_or_else(
        || request.input.clone(),
        |system| format!("System: {system}\n\nUser: {}", request.input),
    )
}

/// Maps a non-zero CLI exit to a stable completion error category.
fn classify_cli_failure(stderr: &str) -> CompletionError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("login") || lowered.contains("auth") || lowered.contains("credential") {
        CompletionError::Auth(format!("cli session unavailable: {}", stderr.trim()))
    } else {
        CompletionError::Transient(format!("cli exited with failure: {}", stderr.trim()))
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// JSON envelope produced by `claude --output-format json`.
#[derive(Deserialize)]
struct CliResult {
    /// Completion text.
    result: String,
}
