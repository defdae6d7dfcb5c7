// crates/pramana-providers/src/anthropic.rs
// ============================================================================
// Module: Anthropic API Provider
// Description: Completion provider for the Anthropic Messages API.
// Purpose: Serve api-mode completions for claude-* models.
// Dependencies: crate::http, pramana-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Thin client over `POST /v1/messages`. Temperature is sent and honored;
//! the API exposes no seed parameter, so seed requests are silently dropped
//! and reported as unenforced. Token counts come from the usage block when
//! present, falling back to the length estimate.

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
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Messages API version header value.
const API_VERSION: &str = "2023-06-01";

/// Completion output cap, in tokens.
const MAX_OUTPUT_TOKENS: u64 = 1000;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Api-mode provider backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    /// Model identifier sent on every request.
    model: String,
    /// API key sent in the `x-api-key` header.
    api_key: String,
    /// Endpoint base URL, overridable for tests.
    base_url: String,
    /// Shared HTTP client.
    client: Client,
}

impl AnthropicProvider {
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
impl CompletionProvider for AnthropicProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            honors_temperature: true,
            honors_seed: false,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.input,
            }],
            system: request.system_prompt.as_deref(),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|err| CompletionError::MalformedResponse(format!("invalid response body: {err}")))?;
        let output: String = parsed
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect();
        let token_count = parsed
            .usage
            .map_or_else(|| self.estimate_tokens(&output), Usage::total);

        Ok(Completion {
            text: output,
            token_count,
            latency_ms: elapsed_ms(start),
            enforcement: ParameterEnforcement {
                temperature: true,
                seed: false,
            },
        })
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request body for `POST /v1/messages`.
#[derive(Serialize)]
struct MessagesRequest<'a> {
    /// Model identifier.
    model: &'a str,
    /// Output token cap.
    max_tokens: u64,
    /// Sampling temperature.
    temperature: f64,
    /// Conversation turns; always a single user turn here.
    messages: Vec<Message<'a>>,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

/// One conversation turn.
#[derive(Serialize)]
struct Message<'a> {
    /// Turn role.
    role: &'static str,
    /// Turn text.
    content: &'a str,
}

/// Response body for `POST /v1/messages`.
#[derive(Deserialize)]
struct MessagesResponse {
    /// Output content blocks.
    #[serde(default)]
    content: Vec<ContentBlock>,
    /// Token usage block.
    #[serde(default)]
    usage: Option<Usage>,
}

/// One output content block; non-text blocks deserialize with `text: None`.
#[derive(Deserialize)]
struct ContentBlock {
    /// Text payload for text blocks.
    #[serde(default)]
    text: Option<String>,
}

/// Token usage block.
#[derive(Deserialize)]
struct Usage {
    /// Input token count.
    #[serde(default)]
    input_tokens: u64,
    /// Output token count.
    #[serde(default)]
    output_tokens: u64,
}

impl Usage {
    /// Total tokens consumed by the call.
    fn total(self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
