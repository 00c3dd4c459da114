// crates/gridreg-services/src/worker.rs
// ============================================================================
// Module: Background Workers
// Description: Worker threads with channel-delivered results.
// Purpose: Keep the orchestrating thread responsive during long operations.
// Dependencies: std::{sync::mpsc, thread}
// ============================================================================

//! ## Overview
//! Long-running network and subprocess operations run on a dedicated worker
//! thread. The caller receives a [`TaskHandle`] and waits for the terminal
//! success or failure value over a channel; there is no cancellation. No
//! shared mutable state crosses the thread boundary: the job owns its
//! inputs and the result moves back over the channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Background task failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Worker thread terminated without delivering a result.
    #[error("worker terminated without a result")]
    Terminated,
    /// Result did not arrive inside the wait window.
    #[error("worker did not finish within {waited_ms} ms")]
    Timeout {
        /// Milliseconds waited.
        waited_ms: u64,
    },
}

// ============================================================================
// SECTION: Task Handle
// ============================================================================

/// Handle to a running background task.
///
/// # Invariants
/// - Exactly one result is sent per task; dropping the handle detaches the
///   worker, which finishes on its own.
pub struct TaskHandle<T> {
    /// Result channel.
    receiver: mpsc::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task delivers its result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Terminated`] when the worker died first.
    pub fn wait(self) -> Result<T, TaskError> {
        self.receiver.recv().map_err(|_| TaskError::Terminated)
    }

    /// Waits up to the timeout for the result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Timeout`] when the window elapses and
    /// [`TaskError::Terminated`] when the worker died first.
    pub fn wait_timeout(self, timeout: Duration) -> Result<T, TaskError> {
        self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => TaskError::Timeout {
                waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => TaskError::Terminated,
        })
    }

    /// Non-blocking poll; `None` while the task is still running.
    pub fn poll(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

/// Spawns a job on a named worker thread and returns its handle.
pub fn spawn_task<T, F>(name: &str, job: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(1);
    let builder = thread::Builder::new().name(format!("gridreg-{name}"));
    let spawned = builder.spawn(move || {
        let result = job();
        let _ = sender.send(result);
    });
    if let Err(err) = spawned {
        tracing::warn!("worker spawn failed: {err}");
    }
    TaskHandle { receiver }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::TaskError;
    use super::spawn_task;

    #[test]
    fn delivers_result_over_channel() {
        let handle = spawn_task("test", || 41 + 1);
        assert_eq!(handle.wait(), Ok(42));
    }

    #[test]
    fn timeout_surfaces_as_failure() {
        let handle = spawn_task("sleepy", || {
            std::thread::sleep(Duration::from_millis(250));
            1
        });
        let result = handle.wait_timeout(Duration::from_millis(10));
        assert!(matches!(result, Err(TaskError::Timeout { .. })));
    }
}
