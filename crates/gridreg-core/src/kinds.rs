// crates/gridreg-core/src/kinds.rs
// ============================================================================
// Module: Gridreg Kind Enums
// Description: Closed enum kinds persisted as strings at the storage edge.
// Purpose: Provide validated tagged variants with stable storage labels.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Roles, statuses, and record kinds are closed tagged-variant types inside
//! the application. The relational store persists them as plain strings;
//! conversion happens only at the data-access edge via [`as_str`] and
//! [`FromStr`], which reject unknown labels.
//!
//! [`as_str`]: Role::as_str
//! [`FromStr`]: std::str::FromStr

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error raised when a storage label does not match any variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} label: {label}")]
pub struct KindParseError {
    /// Enum kind the label was parsed against.
    pub kind: &'static str,
    /// Offending label.
    pub label: String,
}

/// Declares the storage-string codec for a kind enum.
macro_rules! kind_codec {
    ($name:ident, $kind_label:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the stable storage label.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = KindParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok(Self::$variant),)+
                    other => Err(KindParseError {
                        kind: $kind_label,
                        label: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// SECTION: User Role
// ============================================================================

/// User role controlling role-based capabilities.
///
/// # Invariants
/// - Storage labels are stable; see [`Role::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control including user management.
    Admin,
    /// Read and write, no delete or user management.
    Editor,
    /// Read-only access.
    Viewer,
}

kind_codec!(Role, "role", {
    Admin => "admin",
    Editor => "editor",
    Viewer => "viewer",
});

// ============================================================================
// SECTION: Regulation Status
// ============================================================================

/// Regulation lifecycle status.
///
/// # Invariants
/// - Storage labels are stable; see [`RegulationStatus::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationStatus {
    /// Regulation is being drafted.
    Draft,
    /// Regulation is in force.
    Active,
    /// Regulation has been archived.
    Archived,
    /// Regulation has been superseded.
    Deprecated,
}

kind_codec!(RegulationStatus, "regulation status", {
    Draft => "draft",
    Active => "active",
    Archived => "archived",
    Deprecated => "deprecated",
});

// ============================================================================
// SECTION: Document Type
// ============================================================================

/// Uploaded regulation document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// PDF document.
    Pdf,
    /// Office Open XML document.
    Docx,
    /// Legacy Word document.
    Doc,
}

kind_codec!(DocumentType, "document type", {
    Pdf => "pdf",
    Docx => "docx",
    Doc => "doc",
});

// ============================================================================
// SECTION: Change Record Kinds
// ============================================================================

/// Kind of entity a change history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Regulation row.
    Regulation,
    /// Regulation document row.
    Document,
    /// Code file row.
    Code,
    /// User row.
    User,
}

kind_codec!(EntityType, "entity type", {
    Regulation => "regulation",
    Document => "document",
    Code => "code",
    User => "user",
});

/// Kind of mutation a change history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Entity was created.
    Create,
    /// Entity was updated.
    Update,
    /// Entity was deleted.
    Delete,
}

kind_codec!(ChangeType, "change type", {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

// ============================================================================
// SECTION: Notification Type
// ============================================================================

/// Kind of update notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Software version update.
    Software,
    /// Regulation content update.
    Regulation,
}

kind_codec!(NotificationType, "notification type", {
    Software => "software",
    Regulation => "regulation",
});

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::RegulationStatus;
    use super::Role;

    #[test]
    fn role_labels_round_trip() {
        for role in [Role::Admin, Role::Editor, Role::Viewer] {
            assert_eq!(Role::from_str(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = RegulationStatus::from_str("retired");
        assert!(err.is_err());
    }
}
