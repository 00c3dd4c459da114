// crates/gridreg-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Store Core
// Description: Connection lifecycle, schema migration, and error mapping.
// Purpose: Own the guarded SQLite connection every repository builds on.
// Dependencies: gridreg-core, rusqlite, thiserror
// ============================================================================

//! ## Overview
//! The store opens one `SQLite` connection in WAL mode with foreign keys
//! enforced, migrates the schema through a versioned `store_meta` table, and
//! serializes access behind a mutex. Writes happen on whichever thread holds
//! the guard; the application sequences mutations, so the mutex is a safety
//! net rather than a throughput mechanism.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use gridreg_core::kinds::KindParseError;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding row payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Unique or foreign-key constraint violation.
    #[error("store constraint violation: {0}")]
    Constraint(String),
    /// Referenced row does not exist.
    #[error("store row not found: {0}")]
    NotFound(String),
    /// Stored data failed validation on load.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Classifies a driver error, separating constraint violations.
    pub(crate) fn from_sqlite(error: &rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = error
            && inner.code == ErrorCode::ConstraintViolation
        {
            return Self::Constraint(error.to_string());
        }
        Self::Db(error.to_string())
    }
}

impl From<KindParseError> for StoreError {
    fn from(error: KindParseError) -> Self {
        Self::Invalid(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed store shared across services.
///
/// # Invariants
/// - Foreign keys are enforced on the connection.
/// - Connection access is serialized through a mutex.
#[derive(Clone)]
pub struct Store {
    /// Guarded connection shared by all repositories.
    connection: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if needed) the database and migrates the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be opened or migrated.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        let mut connection =
            Connection::open(&config.path).map_err(|err| StoreError::from_sqlite(&err))?;
        configure_connection(&connection, config.busy_timeout_ms)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store, for tests and ephemeral tooling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|err| StoreError::from_sqlite(&err))?;
        configure_connection(&connection, DEFAULT_BUSY_TIMEOUT_MS)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Acquires the guarded connection, recovering a poisoned mutex.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.connection.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Applies connection pragmas: foreign keys, WAL journal, busy timeout.
fn configure_connection(connection: &Connection, busy_timeout_ms: u64) -> Result<(), StoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::from_sqlite(&err))?;
    connection
        .execute_batch("PRAGMA journal_mode = wal;")
        .map_err(|err| StoreError::from_sqlite(&err))?;
    connection
        .execute_batch("PRAGMA synchronous = full;")
        .map_err(|err| StoreError::from_sqlite(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(busy_timeout_ms))
        .map_err(|err| StoreError::from_sqlite(&err))?;
    Ok(())
}

/// Creates or migrates the schema inside one transaction.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| StoreError::from_sqlite(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| StoreError::from_sqlite(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| StoreError::from_sqlite(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    email TEXT,
                    role TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS regulations (
                    id INTEGER PRIMARY KEY,
                    code TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    country TEXT,
                    category TEXT,
                    description TEXT,
                    status TEXT NOT NULL,
                    version TEXT,
                    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_regulations_created_at
                    ON regulations (created_at);
                CREATE INDEX IF NOT EXISTS idx_regulations_country
                    ON regulations (country);
                CREATE INDEX IF NOT EXISTS idx_regulations_category
                    ON regulations (category);
                CREATE TABLE IF NOT EXISTS regulation_documents (
                    id INTEGER PRIMARY KEY,
                    regulation_id INTEGER NOT NULL
                        REFERENCES regulations(id) ON DELETE CASCADE,
                    doc_type TEXT NOT NULL,
                    file_name TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    file_size INTEGER,
                    upload_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    upload_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_documents_regulation
                    ON regulation_documents (regulation_id);
                CREATE TABLE IF NOT EXISTS code_files (
                    id INTEGER PRIMARY KEY,
                    regulation_id INTEGER NOT NULL
                        REFERENCES regulations(id) ON DELETE CASCADE,
                    file_name TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    description TEXT,
                    usage_guide TEXT,
                    version TEXT,
                    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_code_files_regulation
                    ON code_files (regulation_id);
                CREATE TABLE IF NOT EXISTS tags (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    created_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS regulation_tags (
                    regulation_id INTEGER NOT NULL
                        REFERENCES regulations(id) ON DELETE CASCADE,
                    tag_id INTEGER NOT NULL
                        REFERENCES tags(id) ON DELETE CASCADE,
                    PRIMARY KEY (regulation_id, tag_id)
                );
                CREATE TABLE IF NOT EXISTS regulation_parameters (
                    id INTEGER PRIMARY KEY,
                    regulation_id INTEGER NOT NULL
                        REFERENCES regulations(id) ON DELETE CASCADE,
                    category TEXT NOT NULL DEFAULT '',
                    parameter_name TEXT NOT NULL DEFAULT '',
                    default_value TEXT NOT NULL DEFAULT '',
                    upper_limit TEXT NOT NULL DEFAULT '',
                    lower_limit TEXT NOT NULL DEFAULT '',
                    unit TEXT NOT NULL DEFAULT '',
                    coefficient TEXT NOT NULL DEFAULT '',
                    protocol_bit TEXT NOT NULL DEFAULT '',
                    remark TEXT NOT NULL DEFAULT '',
                    remark_image BLOB,
                    row_order INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_parameters_regulation
                    ON regulation_parameters (regulation_id, row_order);
                CREATE TABLE IF NOT EXISTS change_history (
                    id INTEGER PRIMARY KEY,
                    entity_type TEXT NOT NULL,
                    entity_id INTEGER NOT NULL,
                    change_type TEXT NOT NULL,
                    change_data TEXT,
                    change_summary TEXT,
                    changed_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
                    changed_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_history_entity
                    ON change_history (entity_type, entity_id);
                CREATE TABLE IF NOT EXISTS update_notifications (
                    id INTEGER PRIMARY KEY,
                    type TEXT NOT NULL,
                    title TEXT NOT NULL,
                    message TEXT,
                    version TEXT,
                    regulation_id INTEGER,
                    is_read INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL
                );",
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(StoreError::Invalid(format!(
                "unsupported store schema version: {other}"
            )));
        }
    }
    tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Returns the current wall-clock time as unix seconds.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Store;

    #[test]
    fn schema_initializes_in_memory() {
        let store = Store::open_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn reopening_is_idempotent() {
        // Schema creation runs once; a second migration is a no-op.
        let store = Store::open_in_memory();
        assert!(store.is_ok());
        let again = Store::open_in_memory();
        assert!(again.is_ok());
    }
}
