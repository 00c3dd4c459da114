// crates/gridreg-core/src/identifiers.rs
// ============================================================================
// Module: Gridreg Identifiers
// Description: Canonical opaque identifiers for Gridreg entities.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout Gridreg. Every entity
//! row is addressed by a positive 64-bit identifier assigned by the store.
//! Identifiers enforce the non-zero, 1-based invariant at construction
//! boundaries and serialize as plain numbers on the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroI64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a non-zero, 1-based entity identifier newtype.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based, store-assigned).
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(NonZeroI64);

        impl $name {
            /// Creates a new identifier from a non-zero value.
            #[must_use]
            pub const fn new(id: NonZeroI64) -> Self {
                Self(id)
            }

            /// Creates an identifier from a raw row id (returns `None` if not positive).
            #[must_use]
            pub fn from_raw(raw: i64) -> Option<Self> {
                if raw < 1 {
                    return None;
                }
                NonZeroI64::new(raw).map(Self)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

entity_id!(
    /// User row identifier.
    UserId
);

entity_id!(
    /// Regulation row identifier.
    RegulationId
);

entity_id!(
    /// Regulation document row identifier.
    DocumentId
);

entity_id!(
    /// Code file row identifier.
    CodeFileId
);

entity_id!(
    /// Tag row identifier.
    TagId
);

entity_id!(
    /// Regulation parameter row identifier.
    ParameterId
);

entity_id!(
    /// Change history row identifier.
    HistoryId
);

entity_id!(
    /// Update notification row identifier.
    NotificationId
);

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::RegulationId;

    #[test]
    fn from_raw_rejects_zero_and_negative() {
        assert!(RegulationId::from_raw(0).is_none());
        assert!(RegulationId::from_raw(-3).is_none());
        assert_eq!(RegulationId::from_raw(7).map(RegulationId::get), Some(7));
    }
}
