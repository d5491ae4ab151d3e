//! Platform shims (§4.1) — capability interfaces over the file system,
//! subprocess execution, and an in-memory result cache.
//!
//! Checkers and analyzers never touch `std::fs`/`std::process::Command`
//! directly; they receive these as trait objects so that the engine's
//! recovery boundary (§4.7) is the only place that has to reason about a
//! missing tool or a slow filesystem.

mod cache;
mod fs;
mod process;

pub use cache::{Cache, InMemoryCache};
pub use fs::{FileSystem, RealFileSystem, EXCLUDED_DIR_NAMES};
pub use process::{CommandExecutor, CommandOutcome, RealCommandExecutor};

use std::time::Duration;

/// Per-call execution context threaded through every platform call.
///
/// Carries the timeout budget for this specific call and a cancellation
/// flag the caller may have already tripped (parent context canceled).
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub timeout: Duration,
    pub canceled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl ExecContext {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            canceled: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(std::sync::atomic::Ordering::Relaxed)
    }
}
