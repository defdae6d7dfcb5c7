// crates/pramana-providers/tests/wire.rs
// ============================================================================
// Module: Provider Wire Tests
// Description: Exercises API providers against local scripted HTTP stubs.
// ============================================================================
//! ## Overview
//! Each API provider is pointed at a local `tiny_http` stub that replays a
//! scripted response sequence and captures what the provider sent. Tests
//! cover response parsing, request shape, parameter-rejection fallback, and
//! status classification into the stable error categories.

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

use std::thread;

use pramana_core::CompletionError;
use pramana_core::CompletionProvider;
use pramana_core::CompletionRequest;
use pramana_providers::AnthropicProvider;
use pramana_providers::GoogleProvider;
use pramana_providers::OpenAiProvider;
use serde_json::Value;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Stub Server
// ============================================================================

/// One captured request as seen by the stub.
struct Captured {
    /// Request URL, including any query string.
    url: String,
    /// Request body text.
    body: String,
    /// Lowercased header field to value.
    headers: Vec<(String, String)>,
}

impl Captured {
    /// Returns the first header value for a lowercased field name.
    fn header(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Parses the captured body as JSON.
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("captured body is json")
    }
}

/// Scripted stub: serves the given responses in order, capturing requests.
struct StubServer {
    /// Base URL of the stub.
    base_url: String,
    /// Handler thread returning captures on join.
    handle: thread::JoinHandle<Vec<Captured>>,
}

impl StubServer {
    /// Starts a stub serving the given `(status, body)` sequence.
    fn start(responses: Vec<(u16, String)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind stub server");
        let addr = server.server_addr().to_ip().expect("stub ip addr");
        let base_url = format!("http://{addr}");
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for (status, body) in responses {
                let mut request = server.recv().expect("stub recv");
                let mut request_body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut request_body)
                    .expect("stub read body");
                captured.push(Captured {
                    url: request.url().to_string(),
                    body: request_body,
                    headers: request
                        .headers()
                        .iter()
                        .map(|header| {
                            (
                                header.field.to_string().to_lowercase(),
                                header.value.to_string(),
                            )
                        })
                        .collect(),
                });
                let response = Response::from_string(body).with_status_code(status);
                request.respond(response).expect("stub respond");
            }
            captured
        });
        Self {
            base_url,
            handle,
        }
    }

    /// Stops the stub and returns the captured requests.
    fn finish(self) -> Vec<Captured> {
        self.handle.join().expect("stub thread")
    }
}

/// Default request fixture.
fn request() -> CompletionRequest {
    CompletionRequest {
        input: "What is 2+2?".to_string(),
        system_prompt: None,
        temperature: 0.0,
        seed: Some(42),
    }
}

// ============================================================================
// SECTION: Anthropic
// ============================================================================

#[tokio::test]
async fn anthropic_parses_a_messages_response() {
    let stub = StubServer::start(vec![(
        200,
        r#"{"content":[{"type":"text","text":"4"}],"usage":{"input_tokens":10,"output_tokens":2}}"#
            .to_string(),
    )]);
    let provider = AnthropicProvider::with_base_url("claude-sonnet-4-5", "sk-test", &stub.base_url)
        .expect("provider");

    let completion = provider.complete(&request()).await.expect("complete");
    assert_eq!(completion.text, "4");
    assert_eq!(completion.token_count, 12);
    assert!(completion.enforcement.temperature);
    assert!(!completion.enforcement.seed);

    let captured = stub.finish();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].url, "/v1/messages");
    assert_eq!(captured[0].header("x-api-key"), Some("sk-test"));
    assert_eq!(captured[0].header("anthropic-version"), Some("2023-06-01"));
    let body = captured[0].json();
    assert_eq!(body["model"], "claude-sonnet-4-5");
    assert!((body["temperature"].as_f64().expect("temperature") - 0.0).abs() < f64::EPSILON);
    // The messages api has no seed parameter; it must not be sent.
    assert!(body.get("seed").is_none());
}

#[tokio::test]
async fn anthropic_classifies_rate_limit_responses() {
    let stub = StubServer::start(vec![(429, r#"{"error":"rate limited"}"#.to_string())]);
    let provider = AnthropicProvider::with_base_url("claude-sonnet-4-5", "sk-test", &stub.base_url)
        .expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::RateLimited(_))));
    stub.finish();
}

#[tokio::test]
async fn anthropic_classifies_auth_failures() {
    let stub = StubServer::start(vec![(401, r#"{"error":"bad key"}"#.to_string())]);
    let provider = AnthropicProvider::with_base_url("claude-sonnet-4-5", "sk-bad", &stub.base_url)
        .expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::Auth(_))));
    stub.finish();
}

#[tokio::test]
async fn anthropic_classifies_server_errors_as_transient() {
    let stub = StubServer::start(vec![(503, "upstream unavailable".to_string())]);
    let provider = AnthropicProvider::with_base_url("claude-sonnet-4-5", "sk-test", &stub.base_url)
        .expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::Transient(_))));
    stub.finish();
}

#[tokio::test]
async fn anthropic_rejects_unparseable_success_bodies() {
    let stub = StubServer::start(vec![(200, "not json".to_string())]);
    let provider = AnthropicProvider::with_base_url("claude-sonnet-4-5", "sk-test", &stub.base_url)
        .expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::MalformedResponse(_))));
    stub.finish();
}

// ============================================================================
// SECTION: OpenAI
// ============================================================================

#[tokio::test]
async fn openai_parses_a_chat_response() {
    let stub = StubServer::start(vec![(
        200,
        r#"{"choices":[{"message":{"content":"4"}}],"usage":{"total_tokens":15}}"#.to_string(),
    )]);
    let provider =
        OpenAiProvider::with_base_url("gpt-4o", "sk-test", &stub.base_url).expect("provider");

    let completion = provider.complete(&request()).await.expect("complete");
    assert_eq!(completion.text, "4");
    assert_eq!(completion.token_count, 15);
    assert!(completion.enforcement.temperature);
    assert!(completion.enforcement.seed);

    let captured = stub.finish();
    assert_eq!(captured[0].url, "/v1/chat/completions");
    assert_eq!(captured[0].header("authorization"), Some("Bearer sk-test"));
    let body = captured[0].json();
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["seed"], 42);
    assert_eq!(body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn openai_retries_without_rejected_parameters() {
    let stub = StubServer::start(vec![
        (
            400,
            r#"{"error":{"message":"Unsupported parameter: 'temperature' is not supported"}}"#
                .to_string(),
        ),
        (
            200,
            r#"{"choices":[{"message":{"content":"4"}}],"usage":{"total_tokens":9}}"#.to_string(),
        ),
    ]);
    let provider =
        OpenAiProvider::with_base_url("o3-mini", "sk-test", &stub.base_url).expect("provider");

    let completion = provider.complete(&request()).await.expect("complete");
    assert_eq!(completion.text, "4");
    assert!(!completion.enforcement.temperature);
    assert!(!completion.enforcement.seed);

    let captured = stub.finish();
    assert_eq!(captured.len(), 2);
    let first = captured[0].json();
    assert!(first.get("temperature").is_some());
    assert!(first.get("seed").is_some());
    let second = captured[1].json();
    assert!(second.get("temperature").is_none());
    assert!(second.get("seed").is_none());
}

#[tokio::test]
async fn openai_surfaces_unrelated_bad_requests_as_malformed() {
    let stub = StubServer::start(vec![(
        400,
        r#"{"error":{"message":"invalid request shape"}}"#.to_string(),
    )]);
    let provider =
        OpenAiProvider::with_base_url("gpt-4o", "sk-test", &stub.base_url).expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::MalformedResponse(_))));
    stub.finish();
}

#[tokio::test]
async fn openai_sends_the_system_prompt_as_a_system_turn() {
    let stub = StubServer::start(vec![(
        200,
        r#"{"choices":[{"message":{"content":"ok"}}]}"#.to_string(),
    )]);
    let provider =
        OpenAiProvider::with_base_url("gpt-4o", "sk-test", &stub.base_url).expect("provider");

    let mut req = request();
    req.system_prompt = Some("Answer tersely.".to_string());
    provider.complete(&req).await.expect("complete");

    let captured = stub.finish();
    let body = captured[0].json();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "Answer tersely.");
    assert_eq!(body["messages"][1]["role"], "user");
}

// ============================================================================
// SECTION: Google
// ============================================================================

#[tokio::test]
async fn google_parses_a_generate_response() {
    let stub = StubServer::start(vec![(
        200,
        r#"{"candidates":[{"content":{"parts":[{"text":"4"}]}}],"usageMetadata":{"totalTokenCount":9}}"#
            .to_string(),
    )]);
    let provider = GoogleProvider::with_base_url("gemini-2.5-flash", "gm-key", &stub.base_url)
        .expect("provider");

    let completion = provider.complete(&request()).await.expect("complete");
    assert_eq!(completion.text, "4");
    assert_eq!(completion.token_count, 9);
    assert!(completion.enforcement.temperature);
    assert!(completion.enforcement.seed);

    let captured = stub.finish();
    assert!(
        captured[0]
            .url
            .starts_with("/v1beta/models/gemini-2.5-flash:generateContent")
    );
    assert!(captured[0].url.contains("key=gm-key"));
    let body = captured[0].json();
    assert_eq!(body["generationConfig"]["seed"], 42);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
}

#[tokio::test]
async fn google_concatenates_candidate_parts() {
    let stub = StubServer::start(vec![(
        200,
        r#"{"candidates":[{"content":{"parts":[{"text":"4"},{"text":" exactly"}]}}]}"#.to_string(),
    )]);
    let provider = GoogleProvider::with_base_url("gemini-2.5-flash", "gm-key", &stub.base_url)
        .expect("provider");

    let completion = provider.complete(&request()).await.expect("complete");
    assert_eq!(completion.text, "4 exactly");
    stub.finish();
}

#[tokio::test]
async fn google_reports_missing_candidates_as_malformed() {
    let stub = StubServer::start(vec![(200, r#"{"candidates":[]}"#.to_string())]);
    let provider = GoogleProvider::with_base_url("gemini-2.5-flash", "gm-key", &stub.base_url)
        .expect("provider");

    let result = provider.complete(&request()).await;
    assert!(matches!(result, Err(CompletionError::MalformedResponse(_))));
    stub.finish();
}
