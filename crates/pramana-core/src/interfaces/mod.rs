// crates/pramana-core/src/interfaces/mod.rs
// ============================================================================
// Module: Pramana Interfaces
// Description: Backend-agnostic completion provider contract.
// Purpose: Define the seam between the orchestrator and concrete providers.
// Dependencies: async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! The orchestrator talks to providers exclusively through
//! [`CompletionProvider`]. Providers declare which reproducibility parameters
//! they honor and report, per completion, whether those parameters were
//! actually enforced. The abstraction never silently upgrades a non-honoring
//! provider to deterministic: enforcement is recorded, not assumed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Provider Mode
// ============================================================================

/// How a provider is authenticated and billed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMode {
    /// Direct API access with an API key.
    Api,
    /// Subscription access through a locally installed client.
    Subscription,
}

impl ProviderMode {
    /// Returns the canonical wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Subscription => "subscription",
        }
    }

    /// Parses a wire label into a mode.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "api" => Some(Self::Api),
            "subscription" => Some(Self::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Capabilities and Enforcement
// ============================================================================

/// Reproducibility parameters a provider declares it honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Provider honors the temperature parameter.
    pub honors_temperature: bool,
    /// Provider honors the seed parameter.
    pub honors_seed: bool,
}

impl ProviderCapabilities {
    /// Returns true when both reproducibility parameters are honored.
    #[must_use]
    pub const fn fully_deterministic_best_effort(self) -> bool {
        self.honors_temperature && self.honors_seed
    }
}

/// What was actually enforced for one completion.
///
/// Best-effort and provider-reported: enforcement of temperature does not
/// imply output determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEnforcement {
    /// Temperature was sent and accepted.
    pub temperature: bool,
    /// Seed was sent and accepted.
    pub seed: bool,
}

impl ParameterEnforcement {
    /// Returns true when both parameters were enforced.
    #[must_use]
    pub const fn both(self) -> bool {
        self.temperature && self.seed
    }
}

// ============================================================================
// SECTION: Request and Completion
// ============================================================================

/// One completion request issued by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Prompt text.
    pub input: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Requested sampling temperature.
    pub temperature: f64,
    /// Requested sampling seed.
    pub seed: Option<u64>,
}

/// One completed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Output text.
    pub text: String,
    /// Token count reported or estimated by the provider.
    pub token_count: u64,
    /// Wall-clock latency of the call in milliseconds.
    pub latency_ms: u64,
    /// Which reproducibility parameters were actually enforced.
    pub enforcement: ParameterEnforcement,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider call failures.
///
/// Transient categories are retried by the orchestrator up to a fixed budget;
/// the rest are captured immediately as per-case errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transient network or provider failure; retryable.
    #[error("transient provider error: {0}")]
    Transient(String),
    /// Rate limit response; retryable within the budget.
    #[error("provider rate limit: {0}")]
    RateLimited(String),
    /// Call exceeded its deadline; retryable.
    #[error("provider call timed out after {0} ms")]
    Timeout(u64),
    /// Authentication or authorization failure; never retried.
    #[error("provider authentication failed: {0}")]
    Auth(String),
    /// Response could not be parsed; never retried.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Returns true when the orchestrator may retry this failure.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transient(_) | Self::RateLimited(_) | Self::Timeout(_)
        )
    }
}

// ============================================================================
// SECTION: Completion Provider
// ============================================================================

/// Uniform capability-typed interface over heterogeneous LLM backends.
///
/// Implementations suspend only inside [`CompletionProvider::complete`];
/// token estimation is synchronous and local.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model identifier this provider serves.
    fn model_id(&self) -> &str;

    /// Returns the reproducibility parameters this provider honors.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Executes one completion.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError`] on network, auth, or parse failures.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError>;

    /// Estimates the token count for a text locally (roughly four characters
    /// per token; not billing-accurate).
    fn estimate_tokens(&self, text: &str) -> u64 {
        u64::try_from(text.len()).unwrap_or(u64::MAX) / 4
    }
}
