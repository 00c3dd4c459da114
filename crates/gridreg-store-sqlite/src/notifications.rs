// crates/gridreg-store-sqlite/src/notifications.rs
// ============================================================================
// Module: Notification Repository
// Description: Update notification rows and read markers.
// Purpose: Back the notification list and the unread-count badge.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! Notifications are simple rows with a read marker. The unread count is a
//! straight count query; there is no dedupe or rate limiting here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use gridreg_core::NotificationId;
use gridreg_core::NotificationType;
use gridreg_core::RegulationId;
use gridreg_core::Timestamp;
use gridreg_core::UpdateNotification;
use rusqlite::Row;
use rusqlite::params;

use crate::store::Store;
use crate::store::StoreError;
use crate::store::now_unix;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Columns selected for every notification query.
const NOTIFICATION_COLUMNS: &str =
    "id, type, title, message, version, regulation_id, is_read, created_at";

/// Maps a notification row in column order.
fn map_notification(row: &Row<'_>) -> Result<UpdateNotification, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let type_label: String = row.get(1).map_err(|err| StoreError::Db(err.to_string()))?;
    let regulation_id: Option<i64> = row.get(5).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(UpdateNotification {
        id: NotificationId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive notification id: {id}")))?,
        notification_type: NotificationType::from_str(&type_label)?,
        title: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        message: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        version: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        regulation_id: regulation_id.and_then(RegulationId::from_raw),
        is_read: row.get(6).map_err(|err| StoreError::Db(err.to_string()))?,
        created_at: Timestamp::from_unix_seconds(
            row.get(7).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

// ============================================================================
// SECTION: Repository
// ============================================================================

impl Store {
    /// Inserts a notification row and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn insert_notification(
        &self,
        notification_type: NotificationType,
        title: &str,
        message: Option<&str>,
        version: Option<&str>,
        regulation_id: Option<RegulationId>,
    ) -> Result<UpdateNotification, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        tx.execute(
            "INSERT INTO update_notifications
                 (type, title, message, version, regulation_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                notification_type.as_str(),
                title,
                message,
                version,
                regulation_id.map(RegulationId::get),
                now_unix(),
            ],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let id = tx.last_insert_rowid();
        let notification = tx
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM update_notifications WHERE id = ?1"),
                params![id],
                |row| Ok(map_notification(row)),
            )
            .map_err(|err| StoreError::from_sqlite(&err))??;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(notification)
    }

    /// Lists notifications, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn list_notifications(
        &self,
        limit: usize,
    ) -> Result<Vec<UpdateNotification>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM update_notifications
                 ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![i64::try_from(limit).unwrap_or(i64::MAX)])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            notifications.push(map_notification(row)?);
        }
        Ok(notifications)
    }

    /// Counts unread notifications.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn unread_notification_count(&self) -> Result<i64, StoreError> {
        let guard = self.lock();
        guard
            .query_row(
                "SELECT COUNT(*) FROM update_notifications WHERE is_read = 0",
                params![],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::from_sqlite(&err))
    }

    /// Marks one notification as read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the notification does not exist.
    pub fn mark_notification_read(&self, id: NotificationId) -> Result<(), StoreError> {
        let guard = self.lock();
        let updated = guard
            .execute(
                "UPDATE update_notifications SET is_read = 1 WHERE id = ?1",
                params![id.get()],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    /// Marks every unread notification as read; returns the count updated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn mark_all_notifications_read(&self) -> Result<usize, StoreError> {
        let guard = self.lock();
        guard
            .execute("UPDATE update_notifications SET is_read = 1 WHERE is_read = 0", params![])
            .map_err(|err| StoreError::from_sqlite(&err))
    }

    /// Deletes every notification row; returns the count removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn clear_notifications(&self) -> Result<usize, StoreError> {
        let guard = self.lock();
        guard
            .execute("DELETE FROM update_notifications", params![])
            .map_err(|err| StoreError::from_sqlite(&err))
    }
}
