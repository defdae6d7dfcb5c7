// crates/pramana-core/src/core/time.rs
// ============================================================================
// Module: Pramana Time Model
// Description: Canonical timestamp representation for run records.
// Purpose: Provide explicit wall-clock markers that stay out of result hashes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Run records carry start and finish timestamps for operator visibility.
//! Timestamps are deliberately excluded from result fingerprints: two runs
//! with identical provider behavior must hash identically regardless of when
//! they executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix-epoch millisecond timestamp.
///
/// # Invariants
/// - Serializes as a plain integer on the wire.
/// - Never included in result fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Captures the current wall-clock time.
    ///
    /// Clocks before the unix epoch collapse to zero rather than failing.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Self(millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
