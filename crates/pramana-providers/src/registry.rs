// crates/pramana-providers/src/registry.rs
// ============================================================================
// Module: Provider Registry
// Description: Static registry of (provider, mode) entries and constructors.
// Purpose: Route model resolution to concrete provider builders.
// Dependencies: crate providers, pramana-core
// ============================================================================

//! ## Overview
//! The registry maps `(provider, mode)` pairs to a spec (credential
//! requirements, capabilities) and a constructor. It is populated once at
//! startup with the built-in entries and never mutated afterwards; resolution
//! reads it, the CLI lists it, and nothing else touches it. Duplicate
//! registration is a programming error and is rejected loudly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pramana_core::CompletionProvider;
use pramana_core::ProviderCapabilities;
use pramana_core::ProviderMode;
use thiserror::Error;

use crate::anthropic::AnthropicProvider;
use crate::claude_code::CLAUDE_CLI_BINARY;
use crate::claude_code::ClaudeCodeProvider;
use crate::google::GoogleProvider;
use crate::openai::OpenAiProvider;

// ============================================================================
// SECTION: Provider Name
// ============================================================================

/// Closed set of supported provider organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProviderName {
    /// Anthropic (claude-* models).
    Anthropic,
    /// Google (gemini-* models).
    Google,
    /// OpenAI (gpt-* and o-series models).
    OpenAi,
}

impl ProviderName {
    /// Returns the canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }

    /// Parses a provider label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "anthropic" => Some(Self::Anthropic),
            "google" => Some(Self::Google),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Spec and Entry
// ============================================================================

/// Declarative requirements and capabilities for one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Provider organization.
    pub name: ProviderName,
    /// Access mode this entry serves.
    pub mode: ProviderMode,
    /// Environment variables probed for an API key, in preference order.
    /// Empty for subscription entries.
    pub env_keys: Vec<String>,
    /// CLI binary probed on `PATH` for subscription entries.
    pub cli_binary: Option<String>,
    /// Reproducibility parameters this provider honors.
    pub capabilities: ProviderCapabilities,
}

impl ProviderSpec {
    /// Returns a human-readable hint for making this entry available.
    #[must_use]
    pub fn availability_hint(&self) -> String {
        match self.mode {
            ProviderMode::Api => format!(
                "set one of: {} (api mode)",
                self.env_keys.join(", ")
            ),
            ProviderMode::Subscription => {
                let binary = self.cli_binary.as_deref().unwrap_or("the provider cli");
                format!("install `{binary}` and sign in (subscription mode)")
            }
        }
    }
}

/// Inputs handed to a provider constructor.
#[derive(Debug, Clone)]
pub struct ProviderBuildContext {
    /// Model identifier the provider will serve.
    pub model_id: String,
    /// API key for api-mode entries; absent in subscription mode.
    pub api_key: Option<String>,
}

/// Constructor signature for registry entries.
type BuildFn =
    fn(&ProviderSpec, &ProviderBuildContext) -> Result<Arc<dyn CompletionProvider>, RegistryError>;

/// One registered provider entry.
#[derive(Clone)]
pub struct ProviderEntry {
    /// Declarative spec.
    pub spec: ProviderSpec,
    /// Constructor.
    build: BuildFn,
}

impl ProviderEntry {
    /// Builds a provider instance for the given context.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingApiKey`] when an api-mode entry
    /// receives no key and [`RegistryError::Build`] on construction failure.
    pub fn build(
        &self,
        context: &ProviderBuildContext,
    ) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
        (self.build)(&self.spec, context)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A `(provider, mode)` pair was registered twice.
    #[error("provider `{name}` already registered for {mode} mode")]
    Duplicate {
        /// Provider organization.
        name: ProviderName,
        /// Conflicting mode.
        mode: ProviderMode,
    },
    /// An api-mode entry was built without an API key.
    #[error("provider `{name}` requires an api key in api mode")]
    MissingApiKey {
        /// Provider organization.
        name: ProviderName,
    },
    /// Provider construction failed.
    #[error("failed to build provider `{name}`: {reason}")]
    Build {
        /// Provider organization.
        name: ProviderName,
        /// Construction failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Static registry of provider entries, keyed by `(provider, mode)`.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered entries.
    entries: BTreeMap<(ProviderName, ProviderMode), ProviderEntry>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] only if the built-in table is
    /// itself inconsistent.
    pub fn with_builtin_providers() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(ProviderEntry {
            spec: ProviderSpec {
                name: ProviderName::Anthropic,
                mode: ProviderMode::Api,
                env_keys: vec!["ANTHROPIC_API_KEY".to_string()],
                cli_binary: None,
                capabilities: ProviderCapabilities {
                    honors_temperature: true,
                    honors_seed: false,
                },
            },
            build: build_anthropic_api,
        })?;
        registry.register(ProviderEntry {
            spec: ProviderSpec {
                name: ProviderName::Anthropic,
                mode: ProviderMode::Subscription,
                env_keys: Vec::new(),
                cli_binary: Some(CLAUDE_CLI_BINARY.to_string()),
                capabilities: ProviderCapabilities {
                    honors_temperature: false,
                    honors_seed: false,
                },
            },
            build: build_anthropic_subscription,
        })?;
        registry.register(ProviderEntry {
            spec: ProviderSpec {
                name: ProviderName::OpenAi,
                mode: ProviderMode::Api,
                env_keys: vec!["OPENAI_API_KEY".to_string()],
                cli_binary: None,
                capabilities: ProviderCapabilities {
                    honors_temperature: true,
                    honors_seed: true,
                },
            },
            build: build_openai_api,
        })?;
        registry.register(ProviderEntry {
            spec: ProviderSpec {
                name: ProviderName::Google,
                mode: ProviderMode::Api,
                env_keys: vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()],
                cli_binary: None,
                capabilities: ProviderCapabilities {
                    honors_temperature: true,
                    honors_seed: true,
                },
            },
            build: build_google_api,
        })?;
        Ok(registry)
    }

    /// Registers an entry, rejecting duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the `(provider, mode)` pair
    /// is already registered.
    pub fn register(&mut self, entry: ProviderEntry) -> Result<(), RegistryError> {
        let key = (entry.spec.name, entry.spec.mode);
        if self.entries.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                name: key.0,
                mode: key.1,
            });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Returns the entry for a `(provider, mode)` pair, if registered.
    #[must_use]
    pub fn get(&self, name: ProviderName, mode: ProviderMode) -> Option<&ProviderEntry> {
        self.entries.get(&(name, mode))
    }

    /// Iterates all registered entries in deterministic order.
    pub fn entries(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.values()
    }

    /// Returns availability hints for every entry of one provider.
    #[must_use]
    pub fn hints_for(&self, name: ProviderName) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.spec.name == name)
            .map(|entry| entry.spec.availability_hint())
            .collect()
    }
}

// ============================================================================
// SECTION: Built-in Constructors
// ============================================================================

/// Extracts the required API key from a build context.
fn require_key(
    spec: &ProviderSpec,
    context: &ProviderBuildContext,
) -> Result<String, RegistryError> {
    context
        .api_key
        .clone()
        .ok_or(RegistryError::MissingApiKey {
            name: spec.name,
        })
}

/// Returns the endpoint override for a provider, if one is set.
///
/// Self-hosted gateways and proxies advertise themselves through the
/// conventional `*_BASE_URL` variables; an empty value counts as unset.
fn endpoint_override(name: ProviderName) -> Option<String> {
    let key = match name {
        ProviderName::Anthropic => "ANTHROPIC_BASE_URL",
        ProviderName::Google => "GEMINI_BASE_URL",
        ProviderName::OpenAi => "OPENAI_BASE_URL",
    };
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Builds the Anthropic api-mode provider.
fn build_anthropic_api(
    spec: &ProviderSpec,
    context: &ProviderBuildContext,
) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
    let key = require_key(spec, context)?;
    let provider = match endpoint_override(spec.name) {
        Some(base) => AnthropicProvider::with_base_url(context.model_id.clone(), key, base),
        None => AnthropicProvider::new(context.model_id.clone(), key),
    }
    .map_err(|err| RegistryError::Build {
        name: spec.name,
        reason: err.to_string(),
    })?;
    Ok(Arc::new(provider))
}

/// Builds the Anthropic subscription-mode provider.
fn build_anthropic_subscription(
    _spec: &ProviderSpec,
    context: &ProviderBuildContext,
) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
    Ok(Arc::new(ClaudeCodeProvider::new(context.model_id.clone())))
}

/// Builds the OpenAI api-mode provider.
fn build_openai_api(
    spec: &ProviderSpec,
    context: &ProviderBuildContext,
) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
    let key = require_key(spec, context)?;
    let provider = match endpoint_override(spec.name) {
        Some(base) => OpenAiProvider::with_base_url(context.model_id.clone(), key, base),
        None => OpenAiProvider::new(context.model_id.clone(), key),
    }
    .map_err(|err| RegistryError::Build {
        name: spec.name,
        reason: err.to_string(),
    })?;
    Ok(Arc::new(provider))
}

/// Builds the Google api-mode provider.
fn build_google_api(
    spec: &ProviderSpec,
    context: &ProviderBuildContext,
) -> Result<Arc<dyn CompletionProvider>, RegistryError> {
    let key = require_key(spec, context)?;
    let provider = match endpoint_override(spec.name) {
        Some(base) => GoogleProvider::with_base_url(context.model_id.clone(), key, base),
        None => GoogleProvider::new(context.model_id.clone(), key),
    }
    .map_err(|err| RegistryError::Build {
        name: spec.name,
        reason: err.to_string(),
    })?;
    Ok(Arc::new(provider))
}
