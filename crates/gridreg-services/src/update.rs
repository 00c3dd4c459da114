// crates/gridreg-services/src/update.rs
// ============================================================================
// Module: Update Service
// Description: Remote version checks and update notifications.
// Purpose: Detect newer releases and manage the notification badge rows.
// Dependencies: gridreg-config, gridreg-core, gridreg-store-sqlite, reqwest, serde
// ============================================================================

//! ## Overview
//! The update check fetches a JSON version descriptor over HTTP with a
//! bounded timeout and response size, compares its version against the
//! running version, and reports an update only when strictly newer. Network
//! failures and malformed responses degrade to "no update"; they never raise
//! to the caller. Notification rows are plain CRUD with an unread count.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use gridreg_config::UpdateConfig;
use gridreg_core::AppVersion;
use gridreg_core::NotificationId;
use gridreg_core::NotificationType;
use gridreg_core::RegulationId;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::UpdateNotification;
use gridreg_store_sqlite::Store;
use gridreg_store_sqlite::StoreError;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// Remote version descriptor consumed read-only by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Published version string.
    pub version: String,
    /// Release date, free-form.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Download location for the release artifact.
    #[serde(default)]
    pub download_url: Option<String>,
    /// Human-readable change list.
    #[serde(default)]
    pub changelog: Vec<String>,
    /// True when the update is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Oldest version the release supports upgrading from.
    #[serde(default)]
    pub min_version: Option<String>,
}

/// Outcome of one update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    /// Running version is current (or the check failed soft).
    UpToDate,
    /// A strictly newer version is published.
    Available(VersionDescriptor),
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Update checking and notification service.
pub struct UpdateService<'a> {
    /// Backing store for notification rows.
    store: &'a Store,
    /// Update configuration.
    config: &'a UpdateConfig,
    /// Running application version.
    current_version: AppVersion,
}

impl<'a> UpdateService<'a> {
    /// Creates the service for the running version.
    #[must_use]
    pub const fn new(
        store: &'a Store,
        config: &'a UpdateConfig,
        current_version: AppVersion,
    ) -> Self {
        Self {
            store,
            config,
            current_version,
        }
    }

    /// Checks the configured URL for a strictly newer version.
    ///
    /// Every failure path degrades to [`UpdateCheck::UpToDate`] with a log
    /// line; callers never observe network errors.
    #[must_use]
    pub fn check_for_updates(&self) -> UpdateCheck {
        match self.fetch_descriptor() {
            Ok(descriptor) => {
                let Ok(remote) = descriptor.version.parse::<AppVersion>() else {
                    warn!(version = %descriptor.version, "descriptor version malformed");
                    return UpdateCheck::UpToDate;
                };
                if remote.is_newer_than(&self.current_version) {
                    info!(%remote, current = %self.current_version, "update available");
                    UpdateCheck::Available(descriptor)
                } else {
                    info!(current = %self.current_version, "already current");
                    UpdateCheck::UpToDate
                }
            }
            Err(message) => {
                warn!("update check failed: {message}");
                UpdateCheck::UpToDate
            }
        }
    }

    /// Fetches and parses the version descriptor.
    fn fetch_descriptor(&self) -> Result<VersionDescriptor, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|err| err.to_string())?;
        let response =
            client.get(&self.config.check_url).send().map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("descriptor fetch returned {}", response.status()));
        }
        let body = read_limited(response, self.config.max_response_bytes)?;
        serde_json::from_slice(&body).map_err(|err| err.to_string())
    }

    /// Downloads a release artifact to the destination path.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] on any network or write
    /// failure; retrying is always safe.
    pub fn download_update(&self, url: &str, destination: &std::path::Path) -> ServiceResult<u64> {
        let client = Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        let mut response = client
            .get(url)
            .send()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalTool(format!(
                "download returned {}",
                response.status()
            )));
        }
        let mut file = std::fs::File::create(destination)
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        let written = std::io::copy(&mut response, &mut file)
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        info!(url, bytes = written, "update downloaded");
        Ok(written)
    }

    /// Creates a notification row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn notify(
        &self,
        notification_type: NotificationType,
        title: &str,
        message: Option<&str>,
        version: Option<&str>,
        regulation_id: Option<RegulationId>,
    ) -> ServiceResult<UpdateNotification> {
        self.store
            .insert_notification(notification_type, title, message, version, regulation_id)
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }

    /// Lists notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn notifications(&self, limit: usize) -> ServiceResult<Vec<UpdateNotification>> {
        self.store
            .list_notifications(limit)
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }

    /// Returns the unread-count badge value.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn unread_count(&self) -> ServiceResult<i64> {
        self.store
            .unread_notification_count()
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }

    /// Marks one notification as read.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an absent notification.
    pub fn mark_read(&self, id: NotificationId) -> ServiceResult<()> {
        self.store.mark_notification_read(id).map_err(|err| match err {
            StoreError::NotFound(message) => ServiceError::NotFound(message),
            other => ServiceError::Storage(other.to_string()),
        })
    }

    /// Marks every notification as read; returns the count updated.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn mark_all_read(&self) -> ServiceResult<usize> {
        self.store
            .mark_all_notifications_read()
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }

    /// Deletes every notification row; returns the count removed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn clear_all(&self) -> ServiceResult<usize> {
        self.store
            .clear_notifications()
            .map_err(|err| ServiceError::Storage(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a response body up to the cap; larger bodies are an error.
fn read_limited(
    response: reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, String> {
    let cap = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    let mut body = Vec::new();
    let mut limited = response.take(cap.saturating_add(1));
    limited.read_to_end(&mut body).map_err(|err| err.to_string())?;
    if body.len() > max_bytes {
        return Err(format!("descriptor exceeds {max_bytes} bytes"));
    }
    Ok(body)
}
