// crates/gridreg-services/src/sync.rs
// ============================================================================
// Module: Data Sync Service
// Description: Version-control client orchestration for shared data.
// Purpose: Fetch, inspect, and pull remote data updates via subprocess.
// Dependencies: gridreg-config, gridreg-core, std::process
// ============================================================================

//! ## Overview
//! The sync service shells out to the `git` client with a fixed timeout per
//! call. The client is a black box: a non-zero exit status, a timeout, or a
//! spawn failure all classify as [`ServiceError::ExternalTool`], which is
//! retryable from the caller's perspective. Long calls are expected to run
//! on a worker thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use gridreg_config::SyncConfig;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Poll interval while waiting for a subprocess.
const WAIT_POLL: Duration = Duration::from_millis(25);

// ============================================================================
// SECTION: Status Model
// ============================================================================

/// Divergence between the local branch and its remote counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteDivergence {
    /// Commits the local branch is ahead by.
    pub ahead: u64,
    /// Commits the local branch is behind by.
    pub behind: u64,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Version-control data synchronization service.
pub struct SyncService<'a> {
    /// Sync configuration.
    config: &'a SyncConfig,
    /// Resolved repository working directory.
    repo_path: PathBuf,
}

impl<'a> SyncService<'a> {
    /// Creates the service; `fallback_repo` is used when the config names no
    /// repository path.
    #[must_use]
    pub fn new(config: &'a SyncConfig, fallback_repo: &Path) -> Self {
        let repo_path =
            config.repo_path.clone().unwrap_or_else(|| fallback_repo.to_path_buf());
        Self { config, repo_path }
    }

    /// Checks that the `git` client is available; returns its version line.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when the client is missing.
    pub fn check_git_available(&self) -> ServiceResult<String> {
        let output = self.run_git(&["--version"])?;
        Ok(output.trim().to_string())
    }

    /// Checks that the working directory is a repository with a remote.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when either check fails.
    pub fn check_repo_status(&self) -> ServiceResult<()> {
        self.run_git(&["rev-parse", "--git-dir"]).map_err(|_| {
            ServiceError::ExternalTool(format!(
                "{} is not a git repository",
                self.repo_path.display()
            ))
        })?;
        let remotes = self.run_git(&["remote", "-v"])?;
        if remotes.trim().is_empty() {
            return Err(ServiceError::ExternalTool("no remote configured".to_string()));
        }
        Ok(())
    }

    /// Fetches the configured remote.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] on fetch failure or timeout.
    pub fn fetch_remote(&self) -> ServiceResult<()> {
        self.run_git(&["fetch", &self.config.remote])?;
        info!(remote = %self.config.remote, "remote fetched");
        Ok(())
    }

    /// Reports how far the local branch diverges from the remote branch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when the comparison fails.
    pub fn divergence(&self) -> ServiceResult<RemoteDivergence> {
        let range =
            format!("HEAD...{}/{}", self.config.remote, self.config.branch);
        let output = self.run_git(&["rev-list", "--left-right", "--count", &range])?;
        let mut parts = output.split_whitespace();
        let ahead = parts.next().and_then(|value| value.parse().ok()).unwrap_or(0);
        let behind = parts.next().and_then(|value| value.parse().ok()).unwrap_or(0);
        Ok(RemoteDivergence { ahead, behind })
    }

    /// Pulls the configured remote branch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] on pull failure or timeout.
    pub fn pull_updates(&self) -> ServiceResult<String> {
        let output =
            self.run_git(&["pull", &self.config.remote, &self.config.branch])?;
        info!(branch = %self.config.branch, "remote pulled");
        Ok(output)
    }

    /// Lists locally modified paths (porcelain status lines).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when status fails.
    pub fn local_changes(&self) -> ServiceResult<Vec<String>> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Ok(output.lines().map(str::to_string).collect())
    }

    /// Returns the current branch name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when resolution fails.
    pub fn current_branch(&self) -> ServiceResult<String> {
        let output = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(output.trim().to_string())
    }

    /// Stages paths, commits with the message, and pushes the branch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExternalTool`] when any step fails.
    pub fn commit_and_push(&self, paths: &[String], message: &str) -> ServiceResult<()> {
        let mut add_args = vec!["add"];
        add_args.extend(paths.iter().map(String::as_str));
        self.run_git(&add_args)?;
        self.run_git(&["commit", "-m", message])?;
        self.run_git(&["push", &self.config.remote, &self.config.branch])?;
        info!(branch = %self.config.branch, "changes pushed");
        Ok(())
    }

    /// Runs one git invocation with the configured timeout.
    fn run_git(&self, args: &[&str]) -> ServiceResult<String> {
        run_with_timeout(
            Command::new("git").args(args).current_dir(&self.repo_path),
            Duration::from_millis(self.config.timeout_ms),
            &format!("git {}", args.join(" ")),
        )
    }
}

// ============================================================================
// SECTION: Subprocess Helper
// ============================================================================

/// Runs a command with a hard deadline, returning its stdout.
///
/// The child is killed at the deadline; a timeout is a failure, never a
/// retry.
pub(crate) fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
    label: &str,
) -> ServiceResult<String> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()
        .map_err(|err| ServiceError::ExternalTool(format!("{label}: spawn failed: {err}")))?;
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let output = child
                    .wait_with_output()
                    .map_err(|err| ServiceError::ExternalTool(format!("{label}: {err}")))?;
                if status.success() {
                    return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
                }
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(ServiceError::ExternalTool(format!(
                    "{label}: exited with {status}: {}",
                    stderr.trim()
                )));
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ServiceError::ExternalTool(format!(
                        "{label}: timed out after {} ms",
                        timeout.as_millis()
                    )));
                }
                thread::sleep(WAIT_POLL);
            }
            Err(err) => {
                return Err(ServiceError::ExternalTool(format!("{label}: {err}")));
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
