// crates/gridreg-core/src/error.rs
// ============================================================================
// Module: Gridreg Error Taxonomy
// Description: Shared service-level error classification.
// Purpose: Keep low-level persistence and tool failures out of callers.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every service method classifies failures into this taxonomy before they
//! reach a caller. Data-layer failures roll back their enclosing transaction
//! and surface as [`ServiceError::Storage`]; raw driver errors never escape
//! the store boundary. External tool and network failures are always
//! retryable from the caller's perspective.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Service-level result alias.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classified service failures.
///
/// # Invariants
/// - Variant meanings are stable for callers and tests.
/// - Messages never embed raw driver error chains beyond their display text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Referenced entity id does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Unique constraint violation, e.g. a duplicate regulation code.
    #[error("duplicate: {0}")]
    Duplicate(String),
    /// Missing required field or invalid enum value.
    #[error("validation: {0}")]
    Validation(String),
    /// Upload source file missing or unreadable.
    #[error("source file: {0}")]
    SourceFile(String),
    /// Subprocess or network call failed, timed out, or returned non-success.
    #[error("external tool: {0}")]
    ExternalTool(String),
    /// Actor lacks the role-based capability for the requested mutation.
    #[error("permission denied: {0}")]
    Permission(String),
    /// Database or filesystem failure below the service layer.
    #[error("storage: {0}")]
    Storage(String),
}

impl ServiceError {
    /// True when retrying the same call may succeed without operator action.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalTool(_) | Self::Storage(_))
    }
}
