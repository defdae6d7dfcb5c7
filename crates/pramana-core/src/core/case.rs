// crates/pramana-core/src/core/case.rs
// ============================================================================
// Module: Pramana Test Case Model
// Description: Test case, category, assertion, and metadata types.
// Purpose: Define the immutable per-case unit consumed by the runner.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TestCase`] is created once at suite-load time and never mutated.
//! Categories and assertion kinds are closed sets: values outside them are
//! rejected during loading so malformed suites fail before any provider call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Category
// ============================================================================

/// Closed set of test case categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Multi-step reasoning tasks.
    Reasoning,
    /// Factual recall tasks.
    Factual,
    /// Instruction-following tasks.
    InstructionFollowing,
    /// Code generation and comprehension tasks.
    Coding,
    /// Safety and refusal behavior tasks.
    Safety,
    /// Open-ended creative tasks.
    Creative,
}

impl Category {
    /// Returns the canonical wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Factual => "factual",
            Self::InstructionFollowing => "instruction_following",
            Self::Coding => "coding",
            Self::Safety => "safety",
            Self::Creative => "creative",
        }
    }

    /// Parses a wire label into a category.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "reasoning" => Some(Self::Reasoning),
            "factual" => Some(Self::Factual),
            "instruction_following" => Some(Self::InstructionFollowing),
            "coding" => Some(Self::Coding),
            "safety" => Some(Self::Safety),
            "creative" => Some(Self::Creative),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Difficulty
// ============================================================================

/// Declared difficulty of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy cases.
    Easy,
    /// Medium cases.
    Medium,
    /// Hard cases.
    Hard,
}

impl Difficulty {
    /// Returns the canonical wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parses a wire label into a difficulty.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Assertion
// ============================================================================

/// Closed set of assertion kinds used to grade case output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// Output must equal one of the ideal entries.
    ExactMatch,
    /// Output must contain the first ideal entry as a substring.
    Contains,
    /// Output must contain at least one ideal entry as a substring.
    ContainsAny,
    /// Output must parse as JSON, optionally equal to a reference structure.
    IsJson,
}

impl AssertionKind {
    /// Returns the canonical wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::Contains => "contains",
            Self::ContainsAny => "contains_any",
            Self::IsJson => "is_json",
        }
    }

    /// Parses a wire label into an assertion kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exact_match" => Some(Self::ExactMatch),
            "contains" => Some(Self::Contains),
            "contains_any" => Some(Self::ContainsAny),
            "is_json" => Some(Self::IsJson),
            _ => None,
        }
    }

    /// Returns true when the kind requires at least one ideal entry.
    #[must_use]
    pub const fn requires_ideal(self) -> bool {
        match self {
            Self::ExactMatch | Self::Contains | Self::ContainsAny => true,
            Self::IsJson => false,
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assertion rule attached to a test case.
///
/// # Invariants
/// - `kind` is always within the closed [`AssertionKind`] set; suites with
///   other kinds are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Comparison rule deciding pass/fail.
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Whether string comparisons are case-sensitive (default true).
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

/// Default case sensitivity for assertions.
const fn default_case_sensitive() -> bool {
    true
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Free-form metadata attached to a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Declared difficulty.
    pub difficulty: Difficulty,
    /// Estimated token cost (prompt plus completion).
    pub tokens_est: u64,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// SECTION: Test Case
// ============================================================================

/// A single immutable test case within a suite.
///
/// # Invariants
/// - `id` is unique within its suite.
/// - `ideal` is non-empty for assertion kinds that require it.
/// - Never mutated after suite load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier within the suite.
    pub id: String,
    /// Category from the closed set.
    pub category: Category,
    /// Prompt text sent to the provider.
    pub input: String,
    /// Ordered acceptable answer strings.
    pub ideal: Vec<String>,
    /// Assertion rule grading the output.
    pub assertion: Assertion,
    /// Case metadata.
    pub metadata: CaseMetadata,
}
