// crates/gridreg-config/src/config.rs
// ============================================================================
// Module: Gridreg Configuration
// Description: Configuration loading and validation for Gridreg.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: gridreg-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! A missing file yields the documented defaults; a present but malformed
//! file fails closed. The managed-storage layout (documents, codes, database)
//! is derived from the configured data directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use gridreg_core::AppVersion;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "gridreg.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "GRIDREG_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed network timeout in milliseconds.
const MIN_NETWORK_TIMEOUT_MS: u64 = 100;
/// Maximum allowed network timeout in milliseconds.
const MAX_NETWORK_TIMEOUT_MS: u64 = 120_000;
/// Minimum allowed password hash iteration count.
const MIN_HASH_ITERATIONS: u32 = 1_000;
/// Maximum allowed update descriptor size in bytes.
const MAX_DESCRIPTOR_BYTES: usize = 1024 * 1024;
/// Application version compiled into the binary.
pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// IO failure while reading the config file.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parse failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Value failed validation.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Database section.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file; relative paths resolve under the
    /// data directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Returns the default database file path.
fn default_database_path() -> PathBuf {
    PathBuf::from("databases/regulations.db")
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Update-check section.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfig {
    /// URL of the version descriptor JSON.
    #[serde(default = "default_update_url")]
    pub check_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum descriptor size accepted, in bytes.
    #[serde(default = "default_descriptor_bytes")]
    pub max_response_bytes: usize,
    /// User agent sent with update requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Returns the default update descriptor URL.
fn default_update_url() -> String {
    "https://example.invalid/version.json".to_string()
}

/// Returns the default network timeout.
const fn default_network_timeout_ms() -> u64 {
    10_000
}

/// Returns the default descriptor size cap.
const fn default_descriptor_bytes() -> usize {
    64 * 1024
}

/// Returns the default user agent.
fn default_user_agent() -> String {
    format!("gridreg/{APP_VERSION}")
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_url: default_update_url(),
            timeout_ms: default_network_timeout_ms(),
            max_response_bytes: default_descriptor_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// Authentication section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret seeding the session token signing key. Must be overridden in
    /// any shared deployment.
    #[serde(default = "default_auth_secret")]
    pub secret: String,
    /// Session token lifetime in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,
    /// Password hash iteration count.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

/// Returns the default development-only secret.
fn default_auth_secret() -> String {
    "insecure-dev-secret-change-me".to_string()
}

/// Returns the default token lifetime (24 hours).
const fn default_token_ttl_minutes() -> u64 {
    60 * 24
}

/// Returns the default hash iteration count.
const fn default_hash_iterations() -> u32 {
    100_000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_auth_secret(),
            token_ttl_minutes: default_token_ttl_minutes(),
            hash_iterations: default_hash_iterations(),
        }
    }
}

/// Data synchronization section (version-control client).
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Repository working directory; defaults to the data directory parent.
    #[serde(default)]
    pub repo_path: Option<PathBuf>,
    /// Remote name used for fetch and pull.
    #[serde(default = "default_sync_remote")]
    pub remote: String,
    /// Branch compared against the remote.
    #[serde(default = "default_sync_branch")]
    pub branch: String,
    /// Subprocess timeout in milliseconds.
    #[serde(default = "default_subprocess_timeout_ms")]
    pub timeout_ms: u64,
}

/// Returns the default remote name.
fn default_sync_remote() -> String {
    "origin".to_string()
}

/// Returns the default branch name.
fn default_sync_branch() -> String {
    "main".to_string()
}

/// Returns the default subprocess timeout.
const fn default_subprocess_timeout_ms() -> u64 {
    30_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repo_path: None,
            remote: default_sync_remote(),
            branch: default_sync_branch(),
            timeout_ms: default_subprocess_timeout_ms(),
        }
    }
}

/// Release publishing section (Git-hosting REST API).
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseConfig {
    /// Repository owner.
    #[serde(default)]
    pub owner: Option<String>,
    /// Repository name.
    #[serde(default)]
    pub repo: Option<String>,
    /// Access token; empty disables publishing.
    #[serde(default)]
    pub token: Option<String>,
    /// API base URL override, for tests and self-hosted deployments.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Upload endpoint base URL override.
    #[serde(default)]
    pub uploads_base: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            api_base: None,
            uploads_base: None,
            timeout_ms: default_network_timeout_ms(),
        }
    }
}

// ============================================================================
// SECTION: App Config
// ============================================================================

/// Top-level application configuration.
///
/// # Invariants
/// - `data_dir` is the root of all managed storage.
/// - Validation has run on every loaded instance.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Root data directory for managed storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Database section.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Update-check section.
    #[serde(default)]
    pub update: UpdateConfig,
    /// Authentication section.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Data synchronization section.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Release publishing section.
    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Returns the default data directory.
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: DatabaseConfig::default(),
            update: UpdateConfig::default(),
            auth: AuthConfig::default(),
            sync: SyncConfig::default(),
            release: ReleaseConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path` argument, then the `GRIDREG_CONFIG`
    /// environment variable, then `gridreg.toml` in the working directory. A
    /// missing default file yields [`AppConfig::default`]; an explicitly
    /// named missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let (resolved, explicit) = match (path, env_path) {
            (Some(value), _) => (value.to_path_buf(), true),
            (None, Some(value)) => (value, true),
            (None, None) => (PathBuf::from(DEFAULT_CONFIG_NAME), false),
        };
        if !resolved.exists() {
            if explicit {
                return Err(ConfigError::Io(format!(
                    "config file not found: {}",
                    resolved.display()
                )));
            }
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("data_dir", &self.data_dir.to_string_lossy())?;
        validate_path_string("database.path", &self.database.path.to_string_lossy())?;
        validate_timeout("update.timeout_ms", self.update.timeout_ms)?;
        validate_timeout("sync.timeout_ms", self.sync.timeout_ms)?;
        validate_timeout("release.timeout_ms", self.release.timeout_ms)?;
        if self.update.check_url.trim().is_empty() {
            return Err(ConfigError::Invalid("update.check_url must be non-empty".to_string()));
        }
        if self.update.max_response_bytes == 0
            || self.update.max_response_bytes > MAX_DESCRIPTOR_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "update.max_response_bytes out of range (max {MAX_DESCRIPTOR_BYTES})"
            )));
        }
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.secret must be non-empty".to_string()));
        }
        if self.auth.hash_iterations < MIN_HASH_ITERATIONS {
            return Err(ConfigError::Invalid(format!(
                "auth.hash_iterations must be at least {MIN_HASH_ITERATIONS}"
            )));
        }
        if self.auth.token_ttl_minutes == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_minutes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the managed storage layout derived from the data directory.
    #[must_use]
    pub fn storage(&self) -> StorageLayout {
        StorageLayout {
            root: self.data_dir.clone(),
        }
    }

    /// Returns the resolved database file path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            self.data_dir.join(&self.database.path)
        }
    }

    /// Returns the running application version.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the compiled version string is malformed.
    pub fn app_version(&self) -> Result<AppVersion, ConfigError> {
        APP_VERSION
            .parse()
            .map_err(|_| ConfigError::Invalid("compiled version string malformed".to_string()))
    }
}

// ============================================================================
// SECTION: Storage Layout
// ============================================================================

/// Managed-storage directory layout keyed by regulation id.
///
/// # Invariants
/// - Documents live under `documents/<regulation_id>/`.
/// - Code files live under `codes/<regulation_id>/`.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Root data directory.
    root: PathBuf,
}

impl StorageLayout {
    /// Returns the root data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the document directory for a regulation.
    #[must_use]
    pub fn documents_dir(&self, regulation_id: i64) -> PathBuf {
        self.root.join("documents").join(regulation_id.to_string())
    }

    /// Returns the code-file directory for a regulation.
    #[must_use]
    pub fn codes_dir(&self, regulation_id: i64) -> PathBuf {
        self.root.join("codes").join(regulation_id.to_string())
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Validates a path-bearing string field.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a network or subprocess timeout field.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_NETWORK_TIMEOUT_MS..=MAX_NETWORK_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} out of range ({MIN_NETWORK_TIMEOUT_MS}..={MAX_NETWORK_TIMEOUT_MS})"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use super::ConfigError;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn storage_layout_is_keyed_by_regulation_id() {
        let config = AppConfig::default();
        let storage = config.storage();
        assert!(storage.documents_dir(7).ends_with("documents/7"));
        assert!(storage.codes_dir(7).ends_with("codes/7"));
    }

    #[test]
    fn relative_database_path_resolves_under_data_dir() {
        let config = AppConfig::default();
        assert!(config.database_path().starts_with(&config.data_dir));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = AppConfig {
            update: super::UpdateConfig {
                timeout_ms: 0,
                ..super::UpdateConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = AppConfig {
            auth: super::AuthConfig {
                secret: "  ".to_string(),
                ..super::AuthConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
