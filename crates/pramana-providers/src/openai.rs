// crates/pramana-providers/src/openai.rs
// ============================================================================
// Module: OpenAI API Provider
// Description: Completion provider for the OpenAI Chat Completions API.
// Purpose: Serve api-mode completions for gpt-* and o-series models.
// Dependencies: crate::http, pramana-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Thin client over `POST /v1/chat/completions`. Temperature and seed are
//! both sent. Some model families reject one or both parameters with a 400;
//! in that case the call is retried once with the rejected parameters
//! stripped and the completion is reported as unenforced, so the run record
//! reflects what actually reached the model.

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
use reqwest::StatusCode;
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
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Api-mode provider backed by the OpenAI Chat Completions API.
pub struct OpenAiProvider {
    /// Model identifier sent on every request.
    model: String,
    /// API key sent as a bearer token.
    api_key: String,
    /// Endpoint base URL, overridable for tests.
    base_url: String,
    /// Shared HTTP client.
    client: Client,
}

impl OpenAiProvider {
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

    /// Issues one chat-completions call, returning the status and raw body.
    async fn call(&self, body: &ChatRequest<'_>) -> Result<(StatusCode, String), CompletionError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| classify_transport(&err))?;
        Ok((status, text))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
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
        let mut messages = Vec::new();
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.input,
        });

        let full = ChatRequest {
            model: &self.model,
            messages: messages.clone(),
            temperature: Some(request.temperature),
            seed: request.seed,
        };

        let start = Instant::now();
        let (status, text) = self.call(&full).await?;
        let (text, enforcement) = if status.as_u16() == 400 && rejects_parameters(&text) {
            // Model family rejects sampling parameters; resend without them.
            let stripped = ChatRequest {
                model: &self.model,
                messages,
                temperature: None,
                seed: None,
            };
            let (retry_status, retry_text) = self.call(&stripped).await?;
            if !retry_status.is_success() {
                return Err(classify_status(retry_status, &retry_text));
            }
            (
                retry_text,
                ParameterEnforcement {
                    temperature: false,
                    seed: false,
                },
            )
        } else if status.is_success() {
            (
                text,
                ParameterEnforcement {
                    temperature: true,
                    seed: true,
                },
            )
        } else {
            return Err(classify_status(status, &text));
        };

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|err| CompletionError::MalformedResponse(format!("invalid response body: {err}")))?;
        let output = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::MalformedResponse("response carries no choices".to_string())
            })?;
        let token_count = parsed
            .usage
            .map_or_else(|| self.estimate_tokens(&output), |usage| usage.total_tokens);

        Ok(Completion {
            text: output,
            token_count,
            latency_ms: elapsed_ms(start),
            enforcement,
        })
    }
}

// ============================================================================
// SECTION: Parameter Rejection
// ============================================================================

/// Detects a 400 body complaining about temperature or seed support.
fn rejects_parameters(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("temperature") || lowered.contains("seed")
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request body for `POST /v1/chat/completions`.
#[derive(Serialize)]
struct ChatRequest<'a> {
    /// Model identifier.
    model: &'a str,
    /// Conversation turns.
    messages: Vec<ChatMessage<'a>>,
    /// Sampling temperature, omitted when rejected by the model family.
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    /// Sampling seed, omitted when rejected by the model family.
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// One conversation turn.
#[derive(Clone, Serialize)]
struct ChatMessage<'a> {
    /// Turn role.
    role: &'static str,
    /// Turn text.
    content: &'a str,
}

/// Response body for `POST /v1/chat/completions`.
#[derive(Deserialize)]
struct ChatResponse {
    /// Completion choices; the first is used.
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Token usage block.
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// One completion choice.
#[derive(Deserialize)]
struct ChatChoice {
    /// Assistant message.
    message: ChoiceMessage,
}

/// Assistant message within a choice.
#[derive(Deserialize)]
struct ChoiceMessage {
    /// Output text.
    #[serde(default)]
    content: Option<String>,
}

/// Token usage block.
#[derive(Deserialize)]
struct ChatUsage {
    /// Total tokens consumed by the call.
    #[serde(default)]
    total_tokens: u64,
}
