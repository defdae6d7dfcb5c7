// crates/pramana-providers/src/resolve.rs
// ============================================================================
// Module: Model Resolution
// Description: Provider detection and mode resolution for model identifiers.
// Purpose: Decide which registered provider serves a requested model.
// Dependencies: crate::registry, pramana-core
// ============================================================================

//! ## Overview
//! Resolution is a pure decision over `(model, flags, preferred mode,
//! ambient credentials)`. The model prefix selects the provider; the mode is
//! forced by a flag or chosen by trying the preferred mode first and falling
//! back to the other. Availability checks go through the
//! [`AvailabilityProbe`] seam so tests can script credentials without
//! touching the process environment. When nothing is available the error
//! carries actionable hints for every entry of the detected provider.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use pramana_core::ProviderCapabilities;
use pramana_core::ProviderMode;
use thiserror::Error;

use crate::registry::ProviderBuildContext;
use crate::registry::ProviderName;
use crate::registry::ProviderRegistry;
use crate::registry::ProviderSpec;

// ============================================================================
// SECTION: Mode Selection
// ============================================================================

/// How the caller constrained the access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelection {
    /// Try the preferred mode, then the other.
    Auto,
    /// Use api mode or fail.
    ForceApi,
    /// Use subscription mode or fail.
    ForceSubscription,
}

impl ModeSelection {
    /// Derives a selection from the two CLI flags.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::AmbiguousModeSelection`] when both flags
    /// are set.
    pub const fn from_flags(api: bool, subscription: bool) -> Result<Self, ResolutionError> {
        match (api, subscription) {
            (true, true) => Err(ResolutionError::AmbiguousModeSelection),
            (true, false) => Ok(Self::ForceApi),
            (false, true) => Ok(Self::ForceSubscription),
            (false, false) => Ok(Self::Auto),
        }
    }

    /// Returns candidate modes in resolution order.
    fn candidates(self, preferred: ProviderMode) -> Vec<ProviderMode> {
        match self {
            Self::ForceApi => vec![ProviderMode::Api],
            Self::ForceSubscription => vec![ProviderMode::Subscription],
            Self::Auto => match preferred {
                ProviderMode::Api => vec![ProviderMode::Api, ProviderMode::Subscription],
                ProviderMode::Subscription => {
                    vec![ProviderMode::Subscription, ProviderMode::Api]
                }
            },
        }
    }
}

// ============================================================================
// SECTION: Environment Snapshot
// ============================================================================

/// Immutable snapshot of environment variables taken at startup.
///
/// Resolution never reads the live environment, so a decision is stable for
/// the lifetime of a run.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    /// Captured variables.
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Builds a snapshot from explicit entries.
    #[must_use]
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Returns a variable's value, if set and non-empty.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

// ============================================================================
// SECTION: Availability Probe
// ============================================================================

/// Seam for checking whether a registry entry is usable right now.
pub trait AvailabilityProbe {
    /// Returns the API key satisfying an api-mode spec, if any.
    fn api_key(&self, spec: &ProviderSpec) -> Option<String>;

    /// Returns whether a subscription-mode spec's CLI session is usable.
    fn subscription_ready(&self, spec: &ProviderSpec) -> bool;
}

/// Probe backed by an environment snapshot and `PATH` lookup.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    /// Environment snapshot consulted for keys and `PATH`.
    env: EnvSnapshot,
}

impl SystemProbe {
    /// Creates a probe over the given snapshot.
    #[must_use]
    pub const fn new(env: EnvSnapshot) -> Self {
        Self {
            env,
        }
    }

    /// Returns whether a binary name resolves through the snapshot's `PATH`.
    fn binary_on_path(&self, binary: &str) -> bool {
        let Some(path) = self.env.get("PATH") else {
            return false;
        };
        env::split_paths(path).any(|dir| is_executable_file(&dir.join(binary)))
    }
}

impl AvailabilityProbe for SystemProbe {
    fn api_key(&self, spec: &ProviderSpec) -> Option<String> {
        spec.env_keys
            .iter()
            .find_map(|key| self.env.get(key))
            .map(str::to_string)
    }

    fn subscription_ready(&self, spec: &ProviderSpec) -> bool {
        spec.cli_binary
            .as_deref()
            .is_some_and(|binary| self.binary_on_path(binary))
    }
}

/// Returns whether the path points at an existing regular file.
fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

/// Probe layering an operator-supplied API key over another probe.
///
/// Answers every api-key lookup with the given key; subscription readiness
/// still defers to the inner probe.
pub struct ExplicitKeyProbe<'a> {
    /// Key handed to every api-mode spec.
    key: String,
    /// Probe answering subscription readiness.
    inner: &'a dyn AvailabilityProbe,
}

impl<'a> ExplicitKeyProbe<'a> {
    /// Creates a probe that resolves api-mode entries with the given key.
    #[must_use]
    pub const fn new(key: String, inner: &'a dyn AvailabilityProbe) -> Self {
        Self {
            key,
            inner,
        }
    }
}

impl AvailabilityProbe for ExplicitKeyProbe<'_> {
    fn api_key(&self, _spec: &ProviderSpec) -> Option<String> {
        Some(self.key.clone())
    }

    fn subscription_ready(&self, spec: &ProviderSpec) -> bool {
        self.inner.subscription_ready(spec)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during model resolution.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The model identifier matched no known provider prefix.
    #[error("unknown model `{model}`: no provider prefix matched")]
    UnknownModel {
        /// The unmatched model identifier.
        model: String,
    },
    /// A provider was detected but no mode is currently usable.
    #[error("no usable provider for `{model}` ({provider}); {}", hints.join("; "))]
    NoProviderAvailable {
        /// The requested model identifier.
        model: String,
        /// The detected provider.
        provider: ProviderName,
        /// Actionable availability hints.
        hints: Vec<String>,
    },
    /// Both mode-forcing flags were set at once.
    #[error("--api and --subscription are mutually exclusive")]
    AmbiguousModeSelection,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Outcome of resolving a model identifier.
#[derive(Debug, Clone)]
pub struct ModelResolution {
    /// The requested model identifier.
    pub model: String,
    /// Detected provider organization.
    pub provider: ProviderName,
    /// Mode that will serve the run.
    pub mode: ProviderMode,
    /// Capabilities of the selected entry.
    pub capabilities: ProviderCapabilities,
    /// API key for api mode; absent in subscription mode.
    pub api_key: Option<String>,
}

impl ModelResolution {
    /// Converts the resolution into a provider build context.
    #[must_use]
    pub fn build_context(&self) -> ProviderBuildContext {
        ProviderBuildContext {
            model_id: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// Known model prefixes mapped to providers. Exact-match entries cover the
/// o-series identifiers that carry no trailing dash.
const MODEL_PREFIXES: &[(&str, ProviderName)] = &[
    ("gpt-", ProviderName::OpenAi),
    ("chatgpt-", ProviderName::OpenAi),
    ("o1", ProviderName::OpenAi),
    ("o3", ProviderName::OpenAi),
    ("o4", ProviderName::OpenAi),
    ("claude-", ProviderName::Anthropic),
    ("gemini-", ProviderName::Google),
];

/// Detects the provider for a model identifier by prefix.
#[must_use]
pub fn detect_provider(model: &str) -> Option<ProviderName> {
    MODEL_PREFIXES.iter().find_map(|(prefix, provider)| {
        let matched = if prefix.ends_with('-') {
            model.starts_with(prefix)
        } else {
            // Bare prefixes match exactly or followed by a dash (`o3`,
            // `o3-mini`) so `openai-compatible` names cannot collide.
            model == *prefix
                || model
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
        };
        matched.then_some(*provider)
    })
}

/// Example model identifiers surfaced by the CLI `models` listing.
#[must_use]
pub const fn known_models() -> &'static [(&'static str, &'static str)] {
    &[
        ("claude-opus-4-1", "anthropic"),
        ("claude-sonnet-4-5", "anthropic"),
        ("claude-haiku-4-5", "anthropic"),
        ("gpt-4o", "openai"),
        ("gpt-4o-mini", "openai"),
        ("o3-mini", "openai"),
        ("gemini-2.5-pro", "google"),
        ("gemini-2.5-flash", "google"),
    ]
}

/// Resolves a model identifier to a concrete provider entry.
///
/// The provider comes from the model prefix. Candidate modes come from the
/// selection (forced mode, or preferred-then-other for auto); the first
/// candidate that is both registered and available wins.
///
/// # Errors
///
/// Returns [`ResolutionError::UnknownModel`] when no prefix matches and
/// [`ResolutionError::NoProviderAvailable`] when no candidate mode is
/// usable.
pub fn resolve_model(
    registry: &ProviderRegistry,
    model: &str,
    selection: ModeSelection,
    preferred: ProviderMode,
    probe: &dyn AvailabilityProbe,
) -> Result<ModelResolution, ResolutionError> {
    let provider = detect_provider(model).ok_or_else(|| ResolutionError::UnknownModel {
        model: model.to_string(),
    })?;

    for mode in selection.candidates(preferred) {
        let Some(entry) = registry.get(provider, mode) else {
            continue;
        };
        match mode {
            ProviderMode::Api => {
                if let Some(key) = probe.api_key(&entry.spec) {
                    return Ok(ModelResolution {
                        model: model.to_string(),
                        provider,
                        mode,
                        capabilities: entry.spec.capabilities,
                        api_key: Some(key),
                    });
                }
            }
            ProviderMode::Subscription => {
                if probe.subscription_ready(&entry.spec) {
                    return Ok(ModelResolution {
                        model: model.to_string(),
                        provider,
                        mode,
                        capabilities: entry.spec.capabilities,
                        api_key: None,
                    });
                }
            }
        }
    }

    Err(ResolutionError::NoProviderAvailable {
        model: model.to_string(),
        provider,
        hints: registry.hints_for(provider),
    })
}
