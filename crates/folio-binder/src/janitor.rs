//! Cleanup of temporary files bound into command objects.

use std::collections::HashMap;

use folio_core::UploadedFile;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::command::CommandKey;
use crate::error::CleanupFailure;

#[derive(Debug)]
struct TrackedFile {
    field: String,
    file: UploadedFile,
}

/// Outcome of one cleanup sweep.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Files deleted (or already gone).
    pub deleted: usize,
    /// Files that could not be deleted.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Check whether every tracked file was removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tracks temporary files per command object and releases them.
#[derive(Debug, Default)]
pub struct ResourceJanitor {
    tracked: Mutex<HashMap<CommandKey, Vec<TrackedFile>>>,
}

impl ResourceJanitor {
    /// Create an empty janitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a temporary file bound into a command object field.
    pub fn register_temp_file(&self, key: CommandKey, field: &str, file: UploadedFile) {
        debug!(command = %key, field, path = %file.path().display(), "tracking temporary file");
        self.tracked
            .lock()
            .entry(key)
            .or_default()
            .push(TrackedFile {
                field: field.to_string(),
                file,
            });
    }

    /// Number of files tracked for a command object.
    pub fn tracked_count(&self, key: CommandKey) -> usize {
        self.tracked.lock().get(&key).map_or(0, Vec::len)
    }

    /// Delete every file tracked for a command object.
    ///
    /// Every file is attempted; failures are logged and reported but do not
    /// stop the sweep. Calling this again for the same key is a no-op.
    pub fn cleanup(&self, key: CommandKey) -> CleanupReport {
        let files = self.tracked.lock().remove(&key).unwrap_or_default();
        let mut report = CleanupReport::default();

        for tracked in files {
            match tracked.file.delete() {
                Ok(()) => report.deleted += 1,
                Err(source) => {
                    let failure = CleanupFailure {
                        field: tracked.field,
                        path: tracked.file.path().to_path_buf(),
                        source,
                    };
                    warn!(command = %key, error = %failure, "temporary file cleanup failed");
                    report.failures.push(failure);
                }
            }
        }

        if report.deleted > 0 {
            debug!(command = %key, deleted = report.deleted, "temporary files removed");
        }
        report
    }
}
