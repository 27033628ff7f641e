//! Disk Blob Storage
//!
//! Stores uploaded files under a kind-partitioned directory tree:
//! `{root}/{kind}/{timestamp}_{original_name}`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;

use crate::domain::FileKind;
use crate::shared::error::AppError;

/// Local filesystem blob store.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a blob to disk and return its path.
    ///
    /// The original filename is sanitized to its final path component so a
    /// crafted name cannot escape the storage root.
    pub async fn store(
        &self,
        kind: FileKind,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        let safe_name = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        let dir = self.root.join(kind.as_str());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let filename = format!("{}_{}", Utc::now().timestamp_millis(), safe_name);
        let path = dir.join(filename);

        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        Ok(path)
    }

    /// Remove a blob. A missing file is not an error; the metadata row is
    /// authoritative.
    pub async fn remove(&self, path: &str) -> Result<(), AppError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to remove upload: {}", e))),
        }
    }
}
