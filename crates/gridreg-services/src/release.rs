// crates/gridreg-services/src/release.rs
// ============================================================================
// Module: Release Service
// Description: Release publishing over the Git-hosting REST API.
// Purpose: Create releases, upload assets, and rewrite the descriptor file.
// Dependencies: gridreg-config, gridreg-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Publishing talks to the hosting provider's REST API as a black box:
//! create a release, then upload the binary asset against the release id.
//! Requests carry a bearer token and a bounded timeout; every failure is an
//! [`ServiceError::ExternalTool`] and retryable. The version descriptor
//! file (`version.json`) is rewritten locally before the data sync pushes
//! it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use gridreg_config::ReleaseConfig;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use reqwest::blocking::Client;
use serde_json::Value;
use serde_json::json;
use tracing::info;

use crate::update::VersionDescriptor;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default API base when none is configured.
const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Default uploads base when none is configured.
const DEFAULT_UPLOADS_BASE: &str = "https://uploads.github.com";

// ============================================================================
// SECTION: Model
// ============================================================================

/// Created release handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Provider-assigned release id.
    pub id: i64,
    /// Web page of the release, when reported.
    pub html_url: Option<String>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Release publishing service.
pub struct ReleaseService<'a> {
    /// Release configuration.
    config: &'a ReleaseConfig,
}

impl<'a> ReleaseService<'a> {
    /// Creates the service.
    #[must_use]
    pub const fn new(config: &'a ReleaseConfig) -> Self {
        Self { config }
    }

    /// Creates a release for the tag.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when owner, repo, or token are
    /// missing and [`ServiceError::ExternalTool`] on request failure.
    pub fn create_release(
        &self,
        tag: &str,
        name: &str,
        body: &str,
    ) -> ServiceResult<ReleaseInfo> {
        let (owner, repo, token) = self.credentials()?;
        let api_base =
            self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let url = format!("{api_base}/repos/{owner}/{repo}/releases");
        let response = self
            .client()?
            .post(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .json(&json!({ "tag_name": tag, "name": name, "body": body }))
            .send()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalTool(format!(
                "release create returned {}",
                response.status()
            )));
        }
        let payload: Value = response
            .json()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        let id = payload
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ServiceError::ExternalTool("release id missing".to_string()))?;
        let html_url = payload
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string);
        info!(tag, id, "release created");
        Ok(ReleaseInfo { id, html_url })
    }

    /// Uploads a binary asset against a created release.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] for an unreadable asset and
    /// [`ServiceError::ExternalTool`] on request failure.
    pub fn upload_asset(&self, release_id: i64, asset: &Path) -> ServiceResult<()> {
        let (owner, repo, token) = self.credentials()?;
        let file_name = asset
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ServiceError::SourceFile(format!("{} has no file name", asset.display()))
            })?;
        let bytes = fs::read(asset)
            .map_err(|_| ServiceError::SourceFile(format!("{} not found", asset.display())))?;
        let uploads_base =
            self.config.uploads_base.as_deref().unwrap_or(DEFAULT_UPLOADS_BASE);
        let url = format!(
            "{uploads_base}/repos/{owner}/{repo}/releases/{release_id}/assets?name={file_name}"
        );
        let response = self
            .client()?
            .post(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalTool(format!(
                "asset upload returned {}",
                response.status()
            )));
        }
        info!(release_id, %file_name, "asset uploaded");
        Ok(())
    }

    /// Rewrites the local version descriptor file.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] when the file cannot be written.
    pub fn write_version_descriptor(
        &self,
        path: &Path,
        descriptor: &VersionDescriptor,
    ) -> ServiceResult<()> {
        let rendered = serde_json::to_string_pretty(descriptor)
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        fs::write(path, rendered).map_err(|err| ServiceError::Storage(err.to_string()))?;
        info!(path = %path.display(), version = %descriptor.version, "descriptor written");
        Ok(())
    }

    /// Resolves owner, repo, and token or fails with a validation error.
    fn credentials(&self) -> ServiceResult<(&str, &str, &str)> {
        let owner = self
            .config
            .owner
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ServiceError::Validation("release.owner is not set".to_string()))?;
        let repo = self
            .config
            .repo
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ServiceError::Validation("release.repo is not set".to_string()))?;
        let token = self
            .config
            .token
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ServiceError::Validation("release.token is not set".to_string()))?;
        Ok((owner, repo, token))
    }

    /// Builds the bounded HTTP client.
    fn client(&self) -> ServiceResult<Client> {
        Client::builder()
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .user_agent("gridreg-release")
            .build()
            .map_err(|err| ServiceError::ExternalTool(err.to_string()))
    }
}
