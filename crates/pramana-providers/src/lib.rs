// crates/pramana-providers/src/lib.rs
// ============================================================================
// Module: Pramana Providers Library
// Description: Concrete LLM providers, the static registry, and resolution.
// Purpose: Turn a model identifier into a ready provider instance.
// Dependencies: pramana-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! This crate hosts everything behind the core's provider interface: HTTP
//! providers for the Anthropic, OpenAI, and Google APIs, a subscription
//! provider that shells out to the locally-authenticated `claude` CLI, the
//! static registry mapping `(provider, mode)` pairs to constructors, and the
//! resolution policy that picks a provider for a model identifier based on
//! ambient credentials. Credentials never leave this crate: providers receive
//! keys at construction and core never sees them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod anthropic;
pub mod claude_code;
pub mod google;
mod http;
pub mod openai;
pub mod registry;
pub mod resolve;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use anthropic::AnthropicProvider;
pub use claude_code::ClaudeCodeProvider;
pub use google::GoogleProvider;
pub use http::ProviderInitError;
pub use openai::OpenAiProvider;
pub use registry::ProviderBuildContext;
pub use registry::ProviderName;
pub use registry::ProviderRegistry;
pub use registry::ProviderSpec;
pub use registry::RegistryError;
pub use resolve::AvailabilityProbe;
pub use resolve::EnvSnapshot;
pub use resolve::ExplicitKeyProbe;
pub use resolve::ModeSelection;
pub use resolve::ModelResolution;
pub use resolve::ResolutionError;
pub use resolve::SystemProbe;
pub use resolve::detect_provider;
pub use resolve::known_models;
pub use resolve::resolve_model;
