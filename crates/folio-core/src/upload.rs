//! Temporary files produced by multipart parsing.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A temporary file uploaded with a request.
///
/// The file on disk is transient: the resource janitor deletes it once the
/// page execution that bound it completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    path: PathBuf,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl UploadedFile {
    /// Create a descriptor for a temporary file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
            file_name: None,
        }
    }

    /// Set the content type reported by the client.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the original file name reported by the client.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Path of the temporary file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content type reported by the client.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Original file name reported by the client.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Check whether the temporary file still exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Delete the temporary file.
    ///
    /// A file that is already gone counts as deleted.
    pub fn delete(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
