// crates/gridreg-core/src/version.rs
// ============================================================================
// Module: Gridreg Version Ordering
// Description: Dotted application version parsing and comparison.
// Purpose: Decide whether a fetched descriptor is strictly newer.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Application versions are dotted numeric strings such as `1.1.8`. Ordering
//! compares segment-wise with missing segments treated as zero, so `1.2` and
//! `1.2.0` are equal. Parsing is strict: every segment must be an unsigned
//! integer, and malformed input fails rather than guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of dotted segments accepted.
const MAX_SEGMENTS: usize = 8;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error raised for malformed version strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// Input was empty.
    #[error("version string is empty")]
    Empty,
    /// A segment was not an unsigned integer.
    #[error("invalid version segment: {0}")]
    Segment(String),
    /// Too many dotted segments.
    #[error("version has more than {MAX_SEGMENTS} segments")]
    TooManySegments,
}

// ============================================================================
// SECTION: Version
// ============================================================================

/// Parsed dotted application version.
///
/// # Invariants
/// - At least one segment; at most [`MAX_SEGMENTS`].
/// - Ordering pads the shorter side with zero segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppVersion {
    /// Numeric segments in order of significance.
    segments: Vec<u64>,
}

impl AppVersion {
    /// Returns the numeric segments.
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// True when `self` is strictly newer than `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl FromStr for AppVersion {
    type Err = VersionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            if segments.len() == MAX_SEGMENTS {
                return Err(VersionParseError::TooManySegments);
            }
            let segment = part
                .parse::<u64>()
                .map_err(|_| VersionParseError::Segment(part.to_string()))?;
            segments.push(segment);
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for AppVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AppVersion> for String {
    fn from(version: AppVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&rendered)
    }
}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.segments.len().max(other.segments.len());
        for index in 0..width {
            let left = self.segments.get(index).copied().unwrap_or(0);
            let right = other.segments.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::AppVersion;
    use super::VersionParseError;

    fn version(text: &str) -> AppVersion {
        text.parse().unwrap_or_else(|_| unreachable!("test version parses"))
    }

    #[test]
    fn strictly_newer_ordering() {
        assert!(version("1.1.5").is_newer_than(&version("1.1.4")));
        assert!(!version("1.1.4").is_newer_than(&version("1.1.4")));
        assert!(!version("1.0.9").is_newer_than(&version("1.1.4")));
    }

    #[test]
    fn missing_segments_compare_as_zero() {
        assert!(!version("1.2").is_newer_than(&version("1.2.0")));
        assert!(version("1.2.1").is_newer_than(&version("1.2")));
    }

    #[test]
    fn malformed_segments_fail() {
        assert!(matches!(
            "1.beta.0".parse::<AppVersion>(),
            Err(VersionParseError::Segment(_))
        ));
        assert_eq!("".parse::<AppVersion>(), Err(VersionParseError::Empty));
    }
}
