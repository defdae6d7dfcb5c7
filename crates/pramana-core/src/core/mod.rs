// crates/pramana-core/src/core/mod.rs
// ============================================================================
// Module: Pramana Core Data Model
// Description: Suite, test case, assertion, hashing, and result record types.
// Purpose: Group the immutable data model shared across the runtime.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core data model is immutable after construction: test cases are fixed
//! at suite-load time, suites are identified by content hash rather than file
//! path, and result records are sealed with a deterministic fingerprint once
//! a run completes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod case;
pub mod hashing;
pub mod record;
pub mod suite;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assertions::AssertionError;
pub use assertions::AssertionOutcome;
pub use assertions::evaluate;
pub use case::Assertion;
pub use case::AssertionKind;
pub use case::CaseMetadata;
pub use case::Category;
pub use case::Difficulty;
pub use case::TestCase;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use record::CaseError;
pub use record::CaseErrorKind;
pub use record::CaseOutcome;
pub use record::RunResult;
pub use suite::Suite;
pub use suite::SuiteError;
pub use suite::SuiteManifest;
pub use suite::SuiteStore;
pub use suite::SuiteTier;
pub use time::Timestamp;
