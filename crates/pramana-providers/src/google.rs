// crates/pramana-providers/src/google.rs
// ============================================================================
// Module: Google API Provider
// Description: Completion provider for the Gemini generateContent API.
// Purpose: Serve api-mode completions for gemini-* models.
// Dependencies: crate::http, pramana-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Thin client over `POST /v1beta/models/{model}:generateContent`. Both
//! temperature and seed ride in the generation config. Candidate part texts
//! are concatenated into one output string; token counts come from the usage
//! metadata when present.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use async_trait::async_trait;
use pramana_core::Completion;
use pramana_core::CompletionError;
use pramana_core::CompletionProvider;
use pramana_core::CompletionRequest;
use pramana_core::ParameterEnforcement;
use pramana_core::ProviderCapabilities;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;

use crate::http::ProviderInitError;
use crate::http::build_client;
use crate::http::classify_status;
use crate::http::classify_transport;
use crate::http::elapsed_ms;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Production API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Completion output cap, in tokens.
const MAX_OUTPUT_TOKENS: u64 = 1000;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Api-mode provider backed by the Gemini generateContent API.
pub struct GoogleProvider {
    /// Model identifier embedded in the request path.
    model: String,
    /// API key sent as a query parameter.
    api_key: String,
    /// Endpoint base URL, overridable for tests.
    base_url: String,
    /// Shared HTTP client.
    client: Client,
}

impl GoogleProvider {
    /// Creates a provider against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderInitError`] when the HTTP client cannot be built.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderInitError> {
        Self::with_base_url(model, api_key, DEFAULT_BASE_URL)
    }

    /// Creates a provider against a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderInitError`] when the HTTP client cannot be built.
    pub fn with_base_url(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderInitError> {
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: build_client()?,
        })
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            honors_temperature: true,
            honors_seed: true,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: request.input.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                seed: request.seed,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            system_instruction: request.system_prompt.as_deref().map(|system| Content {
                role: "user",
                parts: vec![Part {
                    text: system.to_string(),
                }],
            }),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|err| CompletionError::MalformedResponse(format!("invalid response body: {err}")))?;
        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            CompletionError::MalformedResponse("response carries no candidates".to_string())
        })?;
        let output: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();
        let token_count = parsed.usage_metadata.map_or_else(
            || self.estimate_tokens(&output),
            |usage| usage.total_token_count,
        );

        Ok(Completion {
            text: output,
            token_count,
            latency_ms: elapsed_ms(start),
            enforcement: ParameterEnforcement {
                temperature: true,
                seed: true,
            },
        })
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request body for `generateContent`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    /// Conversation turns.
    contents: Vec<Content>,
    /// Sampling configuration.
    generation_config: GenerationConfig,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

/// One conversation turn.
#[derive(Serialize)]
struct Content {
    /// Turn role.
    role: &'static str,
    /// Turn parts.
    parts: Vec<Part>,
}

/// One text part.
#[derive(Serialize, Deserialize)]
struct Part {
    /// Part text.
    #[serde(default)]
    text: String,
}

/// Sampling configuration block.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// Sampling temperature.
    temperature: f64,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    /// Output token cap.
    max_output_tokens: u64,
}

/// Response body for `generateContent`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    /// Completion candidates; the first is used.
    #[serde(default)]
    candidates: Vec<Candidate>,
    /// Token usage block.
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// One completion candidate.
#[derive(Deserialize)]
struct Candidate {
    /// Candidate content.
    content: ResponseContent,
}

/// Candidate content block.
#[derive(Deserialize)]
struct ResponseContent {
    /// Output parts, concatenated in order.
    #[serde(default)]
    parts: Vec<Part>,
}

/// Token usage block.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    /// Total tokens consumed by the call.
    #[serde(default)]
    total_token_count: u64,
}
