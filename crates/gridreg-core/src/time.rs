// crates/gridreg-core/src/time.rs
// ============================================================================
// Module: Gridreg Time Model
// Description: Unix-second timestamps shared across entities and records.
// Purpose: Provide one storage representation with an RFC 3339 display edge.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Entities store creation and update times as unix seconds. The store stamps
//! rows at mutation time; the core never decides what "now" is. RFC 3339
//! rendering exists only for the presentation edge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix-second timestamp attached to entity rows and records.
///
/// # Invariants
/// - Values are unix seconds as supplied by the caller; no validation applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// Renders the timestamp as an RFC 3339 string, or the raw seconds when
    /// the value is outside the representable datetime range.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|datetime| datetime.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn renders_rfc3339() {
        let stamp = Timestamp::from_unix_seconds(0);
        assert_eq!(stamp.to_rfc3339(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn out_of_range_falls_back_to_seconds() {
        let stamp = Timestamp::from_unix_seconds(i64::MAX);
        assert_eq!(stamp.to_rfc3339(), i64::MAX.to_string());
    }
}
