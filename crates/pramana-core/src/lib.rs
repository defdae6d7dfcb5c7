// crates/pramana-core/src/lib.rs
// ============================================================================
// Module: Pramana Core Library
// Description: Public API surface for the Pramana evaluation core.
// Purpose: Expose suite loading, assertion evaluation, provider interfaces,
// and the run orchestrator.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Pramana core executes immutable, content-hashed eval suites against a
//! resolved LLM provider and aggregates per-case outcomes into a hashable
//! result record. It enforces reproducibility parameters where providers
//! honor them and records where they do not. Network I/O is confined to
//! provider implementations behind the [`CompletionProvider`] interface;
//! the core itself never talks to the submission backend.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Completion;
pub use interfaces::CompletionError;
pub use interfaces::CompletionProvider;
pub use interfaces::CompletionRequest;
pub use interfaces::ParameterEnforcement;
pub use interfaces::ProviderCapabilities;
pub use interfaces::ProviderMode;
pub use runtime::CancelToken;
pub use runtime::EvalRunner;
pub use runtime::RunError;
pub use runtime::RunPhase;
pub use runtime::RunnerConfig;
