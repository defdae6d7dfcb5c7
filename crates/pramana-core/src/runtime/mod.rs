// crates/pramana-core/src/runtime/mod.rs
// ============================================================================
// Module: Pramana Runtime
// Description: Run orchestration and cancellation primitives.
// Purpose: Group the executable side of the core behind one module.
// Dependencies: crate::runtime submodules
// ============================================================================

//! ## Overview
//! The runtime executes a loaded suite against a resolved provider under
//! bounded concurrency, reassembles outcomes in suite order, and seals the
//! aggregate into a [`crate::core::RunResult`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cancel;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelToken;
pub use runner::EvalRunner;
pub use runner::RunError;
pub use runner::RunPhase;
pub use runner::RunnerConfig;
