// crates/gridreg-core/src/lib.rs
// ============================================================================
// Module: Gridreg Core Library
// Description: Public API surface for the Gridreg domain core.
// Purpose: Expose entities, enums, errors, and pure table models.
// Dependencies: crate::{entities, error, identifiers, kinds, params, permissions, time, version}
// ============================================================================

//! ## Overview
//! Gridreg core defines the domain model for the grid-interconnection
//! regulation manager: entities, closed enum kinds, the shared error
//! taxonomy, the parameter table model, and dotted-version ordering. It is
//! storage-agnostic; persistence and services build on these types through
//! explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entities;
pub mod error;
pub mod identifiers;
pub mod kinds;
pub mod params;
pub mod permissions;
pub mod time;
pub mod version;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entities::ChangeHistory;
pub use entities::CodeFile;
pub use entities::Regulation;
pub use entities::RegulationDocument;
pub use entities::RegulationParameter;
pub use entities::Tag;
pub use entities::UpdateNotification;
pub use entities::User;
pub use error::ServiceError;
pub use error::ServiceResult;
pub use identifiers::CodeFileId;
pub use identifiers::DocumentId;
pub use identifiers::HistoryId;
pub use identifiers::NotificationId;
pub use identifiers::ParameterId;
pub use identifiers::RegulationId;
pub use identifiers::TagId;
pub use identifiers::UserId;
pub use kinds::ChangeType;
pub use kinds::DocumentType;
pub use kinds::EntityType;
pub use kinds::KindParseError;
pub use kinds::NotificationType;
pub use kinds::RegulationStatus;
pub use kinds::Role;
pub use params::CategorySpan;
pub use params::Field;
pub use params::IMAGE_PLACEHOLDER;
pub use params::ImageRef;
pub use params::ParamCell;
pub use params::ParameterGrid;
pub use params::ParameterRow;
pub use params::RowWidthError;
pub use params::SchemaWidth;
pub use params::UNRESOLVED_IMAGE_PLACEHOLDER;
pub use params::VALUE_PLACEHOLDER;
pub use params::merge_category_spans;
pub use permissions::Capability;
pub use time::Timestamp;
pub use version::AppVersion;
pub use version::VersionParseError;
