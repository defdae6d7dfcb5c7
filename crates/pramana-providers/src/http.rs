// crates/pramana-providers/src/http.rs
// ============================================================================
// Module: HTTP Provider Plumbing
// Description: Shared client construction and error classification.
// Purpose: Keep transport handling uniform across API providers.
// Dependencies: pramana-core, reqwest
// ============================================================================

//! ## Overview
//! All API providers share one transport posture: a bounded-timeout client
//! over rustls, status classification into the core's stable error
//! categories, and truncated body excerpts in error messages so transcripts
//! never balloon. Retry policy lives in the orchestrator, not here; this
//! module only decides which category a failure belongs to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use pramana_core::CompletionError;
use reqwest::Client;
use reqwest::StatusCode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Transport-level timeout for provider calls, in seconds.
///
/// Deliberately generous: the orchestrator applies the effective per-case
/// deadline and this only catches sockets that hang past it.
pub(crate) const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Maximum error-body excerpt length, in bytes.
const BODY_EXCERPT_LIMIT: usize = 200;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a provider instance.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Client Construction
// ============================================================================

/// Builds the shared HTTP client used by API providers.
///
/// # Errors
///
/// Returns [`ProviderInitError::Client`] when the TLS backend cannot be
/// initialized.
pub(crate) fn build_client() -> Result<Client, ProviderInitError> {
    Client::builder()
        .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
        .build()
        .map_err(|err| ProviderInitError::Client(err.to_string()))
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Maps a non-success HTTP status to a stable completion error category.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> CompletionError {
    let detail = format!("http {}: {}", status.as_u16(), excerpt(body));
    match status.as_u16() {
        401 | 403 => CompletionError::Auth(detail),
        429 => CompletionError::RateLimited(detail),
        408 => CompletionError::Transient(detail),
        500..=599 => CompletionError::Transient(detail),
        _ => CompletionError::MalformedResponse(detail),
    }
}

/// Maps a transport-level failure to a stable completion error category.
pub(crate) fn classify_transport(err: &reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout(CLIENT_TIMEOUT_SECS * 1_000)
    } else {
        CompletionError::Transient(format!("transport error: {err}"))
    }
}

/// Milliseconds elapsed since `start`, saturating at `u64::MAX`.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Truncates a response body for inclusion in error messages.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LIMIT {
        return trimmed.to_string();
    }
    let mut cut = BODY_EXCERPT_LIMIT;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &trimmed[..cut])
}
