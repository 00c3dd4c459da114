// crates/gridreg-core/src/entities.rs
// ============================================================================
// Module: Gridreg Entities
// Description: Domain entity records mirrored by the relational store.
// Purpose: Carry entity state between store, services, and callers.
// Dependencies: serde, crate::{identifiers, kinds, time}
// ============================================================================

//! ## Overview
//! Plain data records for the entity families: users, regulations with their
//! owned documents, code files and parameters, tags, append-only change
//! history, and update notifications. Serialization exists for change-history
//! snapshots and wire output; password hashes and image blobs are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::CodeFileId;
use crate::identifiers::DocumentId;
use crate::identifiers::HistoryId;
use crate::identifiers::NotificationId;
use crate::identifiers::ParameterId;
use crate::identifiers::RegulationId;
use crate::identifiers::TagId;
use crate::identifiers::UserId;
use crate::kinds::ChangeType;
use crate::kinds::DocumentType;
use crate::kinds::EntityType;
use crate::kinds::NotificationType;
use crate::kinds::RegulationStatus;
use crate::kinds::Role;
use crate::time::Timestamp;

// ============================================================================
// SECTION: User
// ============================================================================

/// User account row.
///
/// # Invariants
/// - `username` is globally unique.
/// - `password_hash` never serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Row identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Salted password hash in its storage encoding.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Optional contact address.
    pub email: Option<String>,
    /// Role controlling capabilities.
    pub role: Role,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Regulation
// ============================================================================

/// Central regulation row.
///
/// # Invariants
/// - `code` is globally unique and stable.
/// - `tags` carries the resolved tag names in load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regulation {
    /// Row identifier.
    pub id: RegulationId,
    /// Unique external regulation code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Issuing country or region.
    pub country: Option<String>,
    /// Regulation category.
    pub category: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: RegulationStatus,
    /// Regulation document version.
    pub version: Option<String>,
    /// Creating user, when known.
    pub created_by: Option<UserId>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
    /// Resolved tag names.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Uploaded regulation document row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationDocument {
    /// Row identifier.
    pub id: DocumentId,
    /// Owning regulation.
    pub regulation_id: RegulationId,
    /// Document format.
    pub doc_type: DocumentType,
    /// Original file name.
    pub file_name: String,
    /// Managed-storage copy path.
    pub file_path: String,
    /// Size of the source file in bytes, when known.
    pub file_size: Option<i64>,
    /// Uploading user, when known.
    pub upload_by: Option<UserId>,
    /// Upload time.
    pub upload_at: Timestamp,
}

/// Reference code file row attached to a regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    /// Row identifier.
    pub id: CodeFileId,
    /// Owning regulation.
    pub regulation_id: RegulationId,
    /// Original file name.
    pub file_name: String,
    /// Managed-storage copy path.
    pub file_path: String,
    /// What the file implements.
    pub description: Option<String>,
    /// How to apply the file.
    pub usage_guide: Option<String>,
    /// Code file version.
    pub version: Option<String>,
    /// Creating user, when known.
    pub created_by: Option<UserId>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

/// Tag row, many-to-many with regulations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Row identifier.
    pub id: TagId,
    /// Unique tag name (case-sensitive).
    pub name: String,
    /// Creation time.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Regulation Parameter
// ============================================================================

/// One parameter table row owned by a regulation.
///
/// # Invariants
/// - Values are free-form strings; `-` is the conventional placeholder.
/// - `row_order` is contiguous per regulation and defines display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationParameter {
    /// Row identifier.
    pub id: ParameterId,
    /// Owning regulation.
    pub regulation_id: RegulationId,
    /// Category (merged display column).
    pub category: String,
    /// Parameter name.
    pub parameter_name: String,
    /// Default value.
    pub default_value: String,
    /// Upper limit.
    pub upper_limit: String,
    /// Lower limit.
    pub lower_limit: String,
    /// Measurement unit.
    pub unit: String,
    /// Scaling divisor for code generation.
    pub coefficient: String,
    /// Protocol bit identifier for code generation.
    pub protocol_bit: String,
    /// Free-text remark.
    pub remark: String,
    /// Optional remark image blob; never serialized.
    #[serde(skip_serializing, default)]
    pub remark_image: Option<Vec<u8>>,
    /// Display and import/export order.
    pub row_order: i64,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

// ============================================================================
// SECTION: Change History
// ============================================================================

/// Append-only change history record.
///
/// # Invariants
/// - Rows are never updated or deleted.
/// - `change_data` holds a JSON document serialized at record time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeHistory {
    /// Row identifier.
    pub id: HistoryId,
    /// Kind of entity described.
    pub entity_type: EntityType,
    /// Identifier of the described entity.
    pub entity_id: i64,
    /// Kind of mutation described.
    pub change_type: ChangeType,
    /// JSON snapshot payload.
    pub change_data: Option<String>,
    /// Human-readable summary.
    pub change_summary: Option<String>,
    /// Acting user, when known.
    pub changed_by: Option<UserId>,
    /// Record time.
    pub changed_at: Timestamp,
}

// ============================================================================
// SECTION: Update Notification
// ============================================================================

/// Update notification row surfaced as a badge and list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotification {
    /// Row identifier.
    pub id: NotificationId,
    /// Notification kind.
    pub notification_type: NotificationType,
    /// Short title.
    pub title: String,
    /// Longer message body.
    pub message: Option<String>,
    /// Software version, for software notifications.
    pub version: Option<String>,
    /// Related regulation, for regulation notifications.
    pub regulation_id: Option<RegulationId>,
    /// Read marker.
    pub is_read: bool,
    /// Creation time.
    pub created_at: Timestamp,
}
