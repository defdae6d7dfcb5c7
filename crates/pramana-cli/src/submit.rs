// crates/pramana-cli/src/submit.rs
// ============================================================================
// Module: Result Submission Client
// Description: HTTP client for posting sealed run records to the backend.
// Purpose: Keep the submission boundary out of core and behind one type.
// Dependencies: pramana-config, pramana-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Submission is strictly one-way: a sealed [`RunResult`] is serialized and
//! posted to `POST /api/submit` with an optional bearer token. The backend
//! deduplicates on `result_hash`; a duplicate is reported, not treated as a
//! failure. Nothing here mutates the record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use pramana_config::AuthContext;
use pramana_core::RunResult;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Submission request timeout, in seconds.
const SUBMIT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while submitting a run record.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(String),
    /// The request could not be delivered.
    #[error("submission transport failure: {0}")]
    Transport(String),
    /// The backend rejected the credentials.
    #[error("submission rejected: authentication failed (http {status})")]
    Auth {
        /// Response status code.
        status: u16,
    },
    /// The backend rejected the submission.
    #[error("submission rejected (http {status}): {body}")]
    Rejected {
        /// Response status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },
    /// The backend response could not be parsed.
    #[error("invalid submission response: {0}")]
    MalformedResponse(String),
}

// ============================================================================
// SECTION: Receipt
// ============================================================================

/// Backend acknowledgement for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitReceipt {
    /// Whether the record was stored.
    #[serde(default)]
    pub accepted: bool,
    /// Whether an identical `result_hash` was already on file.
    #[serde(default)]
    pub duplicate: bool,
    /// Optional human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// One-way submission client bound to an auth context.
pub struct SubmissionClient {
    /// HTTP client.
    client: Client,
    /// Token and endpoint.
    auth: AuthContext,
}

impl SubmissionClient {
    /// Creates a client for the given auth context.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Client`] when the TLS backend cannot be
    /// initialized.
    pub fn new(auth: AuthContext) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECS))
            .build()
            .map_err(|err| SubmitError::Client(err.to_string()))?;
        Ok(Self {
            client,
            auth,
        })
    }

    /// Submits a sealed run record.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] on transport failures, auth rejection, backend
    /// rejection, or unparseable acknowledgements.
    pub async fn submit(&self, result: &RunResult) -> Result<SubmitReceipt, SubmitError> {
        let mut request = self
            .client
            .post(format!("{}/api/submit", self.auth.submission_url))
            .json(result);
        if let Some(token) = self.auth.bearer_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SubmitError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|err| SubmitError::MalformedResponse(err.to_string()))
    }
}
