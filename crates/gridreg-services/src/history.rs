// crates/gridreg-services/src/history.rs
// ============================================================================
// Module: Change History Recorder
// Description: Fire-and-forget recording of entity mutations.
// Purpose: Append audit records without ever failing the primary mutation.
// Dependencies: gridreg-core, gridreg-store-sqlite, serde_json, tracing
// ============================================================================

//! ## Overview
//! The recorder serializes a payload to JSON and appends one history row,
//! committing immediately. Failures here are logged and swallowed: a history
//! write must never cause the mutation it describes to be reported as
//! failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gridreg_core::ChangeType;
use gridreg_core::EntityType;
use gridreg_core::UserId;
use gridreg_store_sqlite::Store;
use serde::Serialize;
use tracing::warn;

// ============================================================================
// SECTION: Recorder
// ============================================================================

/// Append-only history recorder bound to the store.
#[derive(Clone, Copy)]
pub struct HistoryRecorder<'a> {
    /// Backing store.
    store: &'a Store,
}

impl<'a> HistoryRecorder<'a> {
    /// Creates a recorder over the store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Records one mutation; never fails the caller.
    pub fn record<P: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        change_type: ChangeType,
        payload: &P,
        summary: &str,
        actor: Option<UserId>,
    ) {
        let change_data = match serde_json::to_string(payload) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!(%entity_type, entity_id, "history payload serialization failed: {err}");
                None
            }
        };
        if let Err(err) = self.store.insert_history(
            entity_type,
            entity_id,
            change_type,
            change_data.as_deref(),
            Some(summary),
            actor,
        ) {
            warn!(%entity_type, entity_id, "history record failed: {err}");
        }
    }
}
