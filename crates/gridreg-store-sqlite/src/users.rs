// crates/gridreg-store-sqlite/src/users.rs
// ============================================================================
// Module: User Repository
// Description: User account rows and role updates.
// Purpose: Persist accounts with unique usernames and role labels.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! User rows carry the salted password hash opaquely; hashing and
//! verification live in the service layer. Roles persist as their storage
//! labels and are validated back into the closed enum on load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use gridreg_core::Role;
use gridreg_core::Timestamp;
use gridreg_core::User;
use gridreg_core::UserId;
use rusqlite::Row;
use rusqlite::params;

use crate::store::Store;
use crate::store::StoreError;
use crate::store::now_unix;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Maps a user row in column order.
fn map_user(row: &Row<'_>) -> Result<User, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let role_label: String = row.get(4).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(User {
        id: UserId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive user id: {id}")))?,
        username: row.get(1).map_err(|err| StoreError::Db(err.to_string()))?,
        password_hash: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        email: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        role: Role::from_str(&role_label)?,
        created_at: Timestamp::from_unix_seconds(
            row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
        updated_at: Timestamp::from_unix_seconds(
            row.get(6).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

/// Columns selected for every user query.
const USER_COLUMNS: &str =
    "id, username, password_hash, email, role, created_at, updated_at";

// ============================================================================
// SECTION: Repository
// ============================================================================

impl Store {
    /// Inserts a user and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] on a duplicate username.
    pub fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        role: Role,
    ) -> Result<User, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        let now = now_unix();
        tx.execute(
            "INSERT INTO users (username, password_hash, email, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![username, password_hash, email, role.as_str(), now],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let id = tx.last_insert_rowid();
        let user = tx
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                |row| Ok(map_user(row)),
            )
            .map_err(|err| StoreError::from_sqlite(&err))??;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(user)
    }

    /// Fetches a user by username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure; `Ok(None)` when absent.
    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![username])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        match rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            Some(row) => Ok(Some(map_user(row)?)),
            None => Ok(None),
        }
    }

    /// Fetches a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure; `Ok(None)` when absent.
    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        match rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            Some(row) => Ok(Some(map_user(row)?)),
            None => Ok(None),
        }
    }

    /// Lists all users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows =
            statement.query(params![]).map_err(|err| StoreError::from_sqlite(&err))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            users.push(map_user(row)?);
        }
        Ok(users)
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the user does not exist.
    pub fn update_user_password(&self, id: UserId, password_hash: &str) -> Result<(), StoreError> {
        let guard = self.lock();
        let updated = guard
            .execute(
                "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
                params![password_hash, now_unix(), id.get()],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    /// Replaces a user's role.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the user does not exist.
    pub fn update_user_role(&self, id: UserId, role: Role) -> Result<(), StoreError> {
        let guard = self.lock();
        let updated = guard
            .execute(
                "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
                params![role.as_str(), now_unix(), id.get()],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        if updated == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    /// Deletes a user row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the user does not exist.
    pub fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let guard = self.lock();
        let deleted = guard
            .execute("DELETE FROM users WHERE id = ?1", params![id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }
}
