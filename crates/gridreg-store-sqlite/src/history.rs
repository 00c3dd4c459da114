// crates/gridreg-store-sqlite/src/history.rs
// ============================================================================
// Module: Change History Repository
// Description: Append-only change history rows.
// Purpose: Persist mutation records without ever mutating them.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! Change history is append-only: rows are inserted and read, never updated
//! or deleted. Retrieval is ordered per entity or globally recent-first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use gridreg_core::ChangeHistory;
use gridreg_core::ChangeType;
use gridreg_core::EntityType;
use gridreg_core::HistoryId;
use gridreg_core::Timestamp;
use gridreg_core::UserId;
use rusqlite::Row;
use rusqlite::params;

use crate::store::Store;
use crate::store::StoreError;
use crate::store::now_unix;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Columns selected for every history query.
const HISTORY_COLUMNS: &str =
    "id, entity_type, entity_id, change_type, change_data, change_summary, changed_by, changed_at";

/// Maps a history row in column order.
fn map_history(row: &Row<'_>) -> Result<ChangeHistory, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let entity_label: String = row.get(1).map_err(|err| StoreError::Db(err.to_string()))?;
    let change_label: String = row.get(3).map_err(|err| StoreError::Db(err.to_string()))?;
    let changed_by: Option<i64> = row.get(6).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(ChangeHistory {
        id: HistoryId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive history id: {id}")))?,
        entity_type: EntityType::from_str(&entity_label)?,
        entity_id: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        change_type: ChangeType::from_str(&change_label)?,
        change_data: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        change_summary: row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        changed_by: changed_by.and_then(UserId::from_raw),
        changed_at: Timestamp::from_unix_seconds(
            row.get(7).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

// ============================================================================
// SECTION: Repository
// ============================================================================

impl Store {
    /// Appends one change history row; commits immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn insert_history(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        change_type: ChangeType,
        change_data: Option<&str>,
        change_summary: Option<&str>,
        changed_by: Option<UserId>,
    ) -> Result<(), StoreError> {
        let guard = self.lock();
        guard
            .execute(
                "INSERT INTO change_history
                     (entity_type, entity_id, change_type, change_data, change_summary,
                      changed_by, changed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entity_type.as_str(),
                    entity_id,
                    change_type.as_str(),
                    change_data,
                    change_summary,
                    changed_by.map(UserId::get),
                    now_unix(),
                ],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(())
    }

    /// Lists history rows for one entity in record order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn history_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Result<Vec<ChangeHistory>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM change_history
                 WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id"
            ))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![entity_type.as_str(), entity_id])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            records.push(map_history(row)?);
        }
        Ok(records)
    }

    /// Lists the most recent history rows across all entities.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<ChangeHistory>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM change_history ORDER BY id DESC LIMIT ?1"
            ))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![i64::try_from(limit).unwrap_or(i64::MAX)])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            records.push(map_history(row)?);
        }
        Ok(records)
    }
}
