// crates/pramana-core/src/core/suite.rs
// ============================================================================
// Module: Pramana Suite Store
// Description: Versioned suite loading, validation, and content hashing.
// Purpose: Load immutable line-delimited suites and expose their identity hash.
// Dependencies: crate::core::{case, hashing}, serde, serde_json
// ============================================================================

//! ## Overview
//! Suites are line-delimited JSON files published under a version directory
//! alongside a manifest. The store validates every line against the closed
//! category and assertion sets, rejects duplicate case identifiers, and
//! cross-checks the manifest's declared counts. It performs no mutation and
//! exposes no update operation: a published suite version never changes, and
//! any edit requires a new version identifier.
//!
//! The suite hash is a pure function of content: each line's parsed JSON is
//! re-serialized canonically (RFC 8785) and concatenated with `\n` in file
//! order, so formatting whitespace is irrelevant while whitespace inside
//! values is preserved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::case::Assertion;
use crate::core::case::AssertionKind;
use crate::core::case::CaseMetadata;
use crate::core::case::Category;
use crate::core::case::Difficulty;
use crate::core::case::TestCase;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;

// ============================================================================
// SECTION: Suite Tier
// ============================================================================

/// Difficulty/cost tier of a published suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteTier {
    /// Small, low-cost smoke suite.
    Cheap,
    /// Mid-sized suite.
    Moderate,
    /// Full coverage suite.
    Comprehensive,
}

impl SuiteTier {
    /// Returns the canonical tier label (also the suite file stem).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cheap => "cheap",
            Self::Moderate => "moderate",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Parses a tier label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cheap" => Some(Self::Cheap),
            "moderate" => Some(Self::Moderate),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }
}

impl fmt::Display for SuiteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Per-tier manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Declared case count for the tier.
    pub cases: usize,
    /// Optional estimated token cost for the tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_est: Option<u64>,
}

/// Suite manifest published alongside the suite files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// Suite version identifier.
    pub version: String,
    /// Tier label to declared counts.
    pub suites: BTreeMap<String, ManifestEntry>,
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// An immutable, content-hashed suite of test cases.
///
/// # Invariants
/// - `hash` is a pure function of the suite file content (order-sensitive).
/// - Case identifiers are unique.
/// - Cases are never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    /// Tier this suite was published under.
    pub tier: SuiteTier,
    /// Version identifier (directory name under the store root).
    pub version: String,
    /// Content hash identifying this suite.
    pub hash: HashDigest,
    /// Ordered test cases.
    pub cases: Vec<TestCase>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading a suite. All variants are fatal to the run.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// No suite or manifest file matched the requested tier and version.
    #[error("suite not found: {path}")]
    SuiteNotFound {
        /// Path that was probed.
        path: PathBuf,
    },
    /// A suite line failed validation.
    #[error("suite malformed at {path}:{line}: {reason}")]
    SuiteMalformed {
        /// Suite file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Validation failure description.
        reason: String,
    },
    /// A case used an assertion kind outside the closed set.
    #[error("unsupported assertion kind `{kind}` at {path}:{line}")]
    UnsupportedAssertion {
        /// Suite file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The unrecognized kind label.
        kind: String,
    },
    /// Manifest declared a different case count than the suite file holds.
    #[error("manifest mismatch for tier {tier}: declared {declared} cases, found {actual}")]
    ManifestMismatch {
        /// Tier whose counts diverged.
        tier: SuiteTier,
        /// Count declared by the manifest.
        declared: usize,
        /// Count found in the suite file.
        actual: usize,
    },
    /// Manifest file could not be parsed or lacks the requested tier.
    #[error("manifest malformed at {path}: {reason}")]
    ManifestMalformed {
        /// Manifest file path.
        path: PathBuf,
        /// Parse failure description.
        reason: String,
    },
    /// Filesystem error other than a missing file.
    #[error("io error reading {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Canonical hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Suite Store
// ============================================================================

/// Read-only store for published suites.
///
/// Layout: `<root>/<version>/<tier>.jsonl` plus `<root>/<version>/manifest.json`.
#[derive(Debug, Clone)]
pub struct SuiteStore {
    /// Root directory holding version directories.
    root: PathBuf,
}

impl SuiteStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads and validates a suite for the given tier and version.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::SuiteNotFound`] when no file matches,
    /// [`SuiteError::SuiteMalformed`] on invalid lines or duplicate ids,
    /// [`SuiteError::UnsupportedAssertion`] on assertion kinds outside the
    /// closed set, and [`SuiteError::ManifestMismatch`] when the manifest
    /// disagrees with the actual case count.
    pub fn load(&self, tier: SuiteTier, version: &str) -> Result<Suite, SuiteError> {
        let suite_path = self.root.join(version).join(format!("{tier}.jsonl"));
        let text = read_required(&suite_path)?;
        let manifest = self.load_manifest(version)?;

        let mut raw_lines = Vec::new();
        let mut cases = Vec::new();
        let mut seen_ids = BTreeSet::new();
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|err| {
                SuiteError::SuiteMalformed {
                    path: suite_path.clone(),
                    line: line_no,
                    reason: format!("invalid json: {err}"),
                }
            })?;
            let case = parse_case(&value, &suite_path, line_no)?;
            if !seen_ids.insert(case.id.clone()) {
                return Err(SuiteError::SuiteMalformed {
                    path: suite_path,
                    line: line_no,
                    reason: format!("duplicate case id `{}`", case.id),
                });
            }
            raw_lines.push(value);
            cases.push(case);
        }

        let declared = manifest_count(&manifest, tier, &self.manifest_path(version))?;
        if declared != cases.len() {
            return Err(SuiteError::ManifestMismatch {
                tier,
                declared,
                actual: cases.len(),
            });
        }

        let hash = hash_suite_lines(&raw_lines)?;
        Ok(Suite {
            tier,
            version: version.to_string(),
            hash,
            cases,
        })
    }

    /// Returns the manifest path for a version.
    fn manifest_path(&self, version: &str) -> PathBuf {
        self.root.join(version).join("manifest.json")
    }

    /// Loads and parses the manifest for a version.
    fn load_manifest(&self, version: &str) -> Result<SuiteManifest, SuiteError> {
        let path = self.manifest_path(version);
        let text = read_required(&path)?;
        serde_json::from_str(&text).map_err(|err| SuiteError::ManifestMalformed {
            path,
            reason: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Hashes parsed suite lines: canonical JSON per case, one per line, file order.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn hash_suite_lines(lines: &[Value]) -> Result<HashDigest, HashError> {
    let mut content = Vec::new();
    for value in lines {
        content.extend_from_slice(&canonical_json_bytes(value)?);
        content.push(b'\n');
    }
    Ok(hash_bytes(DEFAULT_HASH_ALGORITHM, &content))
}

// ============================================================================
// SECTION: Line Parsing
// ============================================================================

/// Reads a file, mapping a missing file to [`SuiteError::SuiteNotFound`].
fn read_required(path: &Path) -> Result<String, SuiteError> {
    fs::read_to_string(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            SuiteError::SuiteNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SuiteError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    })
}

/// Returns the manifest's declared count for a tier.
fn manifest_count(
    manifest: &SuiteManifest,
    tier: SuiteTier,
    path: &Path,
) -> Result<usize, SuiteError> {
    manifest
        .suites
        .get(tier.as_str())
        .map(|entry| entry.cases)
        .ok_or_else(|| SuiteError::ManifestMalformed {
            path: path.to_path_buf(),
            reason: format!("missing entry for tier `{tier}`"),
        })
}

/// Validates one suite line into a typed test case.
fn parse_case(value: &Value, path: &Path, line: usize) -> Result<TestCase, SuiteError> {
    let malformed = |reason: String| SuiteError::SuiteMalformed {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let object = value
        .as_object()
        .ok_or_else(|| malformed("line is not a json object".to_string()))?;

    let id = required_str(object, "id").map_err(&malformed)?;
    let category_label = required_str(object, "category").map_err(&malformed)?;
    let category = Category::parse(category_label)
        .ok_or_else(|| malformed(format!("unknown category `{category_label}`")))?;
    let input = required_str(object, "input").map_err(&malformed)?;
    let ideal = parse_ideal(object.get("ideal")).map_err(&malformed)?;

    let assertion_value = object
        .get("assertion")
        .ok_or_else(|| malformed("missing required field `assertion`".to_string()))?;
    let assertion = parse_assertion(assertion_value, path, line)?;
    if assertion.kind.requires_ideal() && ideal.is_empty() {
        return Err(malformed(format!(
            "assertion `{}` requires at least one ideal entry",
            assertion.kind
        )));
    }
    if assertion.kind == AssertionKind::IsJson {
        if let Some(reference) = ideal.first() {
            serde_json::from_str::<Value>(reference.trim()).map_err(|err| {
                malformed(format!("is_json reference structure is not valid json: {err}"))
            })?;
        }
    }

    let metadata_value = object
        .get("metadata")
        .ok_or_else(|| malformed("missing required field `metadata`".to_string()))?;
    let metadata = parse_metadata(metadata_value).map_err(&malformed)?;

    Ok(TestCase {
        id: id.to_string(),
        category,
        input: input.to_string(),
        ideal,
        assertion,
        metadata,
    })
}

/// Extracts a required string field from a JSON object.
fn required_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a str, String> {
    object
        .get(field)
        .ok_or_else(|| format!("missing required field `{field}`"))?
        .as_str()
        .ok_or_else(|| format!("field `{field}` must be a string"))
}

/// Normalizes the `ideal` field: string, array of strings, or absent.
fn parse_ideal(value: Option<&Value>) -> Result<Vec<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(single)) => Ok(vec![single.clone()]),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "field `ideal` entries must be strings".to_string())
            })
            .collect(),
        Some(_) => Err("field `ideal` must be a string or array of strings".to_string()),
    }
}

/// Validates the assertion object, rejecting kinds outside the closed set.
fn parse_assertion(value: &Value, path: &Path, line: usize) -> Result<Assertion, SuiteError> {
    let malformed = |reason: String| SuiteError::SuiteMalformed {
        path: path.to_path_buf(),
        line,
        reason,
    };
    let object = value
        .as_object()
        .ok_or_else(|| malformed("field `assertion` must be an object".to_string()))?;
    let kind_label = required_str(object, "type").map_err(&malformed)?;
    let kind = AssertionKind::parse(kind_label).ok_or_else(|| SuiteError::UnsupportedAssertion {
        path: path.to_path_buf(),
        line,
        kind: kind_label.to_string(),
    })?;
    let case_sensitive = match object.get("case_sensitive") {
        None => true,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(malformed("field `case_sensitive` must be a boolean".to_string()));
        }
    };
    Ok(Assertion {
        kind,
        case_sensitive,
    })
}

/// Validates the metadata object.
fn parse_metadata(value: &Value) -> Result<CaseMetadata, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "field `metadata` must be an object".to_string())?;
    let difficulty_label = required_str(object, "difficulty")?;
    let difficulty = Difficulty::parse(difficulty_label)
        .ok_or_else(|| format!("unknown difficulty `{difficulty_label}`"))?;
    let tokens_est = object
        .get("tokens_est")
        .ok_or_else(|| "missing required field `tokens_est`".to_string())?
        .as_u64()
        .ok_or_else(|| "field `tokens_est` must be a non-negative integer".to_string())?;
    let tags = match object.get("tags") {
        None => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "field `tags` entries must be strings".to_string())
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err("field `tags` must be an array of strings".to_string()),
    };
    Ok(CaseMetadata {
        difficulty,
        tokens_est,
        tags,
    })
}
