//! Stored file entity and repository trait.
//!
//! Maps to the `files` table. The binary blob lives on disk under a
//! kind-partitioned directory; this row tracks its metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// File kind, derived from the upload's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    #[default]
    Other,
}

impl FileKind {
    /// Derive the kind from a MIME type string.
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or("") {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// Convert to database string representation; also the name of the
    /// storage subdirectory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for an uploaded file.
///
/// Maps to the `files` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - owner_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - original_name: VARCHAR(255) NOT NULL
/// - path: TEXT NOT NULL
/// - kind: VARCHAR(20) NOT NULL
/// - extension: VARCHAR(16) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Uploading user
    pub owner_id: i64,

    /// Filename as sent by the client
    pub original_name: String,

    /// Path of the blob on disk
    pub path: String,

    /// MIME-derived kind
    pub kind: FileKind,

    /// File extension without the dot
    pub extension: String,

    /// Upload timestamp
    pub created_at: DateTime<Utc>,
}

/// Repository trait for stored-file metadata operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Find a file row by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<StoredFile>, AppError>;

    /// Files owned by a user, optionally filtered by kind, newest first.
    async fn find_by_owner(
        &self,
        owner_id: i64,
        kind: Option<FileKind>,
    ) -> Result<Vec<StoredFile>, AppError>;

    /// Persist a new file row.
    async fn create(&self, file: &StoredFile) -> Result<StoredFile, AppError>;

    /// Delete a file row.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_mime() {
        assert_eq!(FileKind::from_mime("image/png"), FileKind::Image);
        assert_eq!(FileKind::from_mime("video/mp4"), FileKind::Video);
        assert_eq!(FileKind::from_mime("audio/mpeg"), FileKind::Audio);
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Other);
        assert_eq!(FileKind::from_mime(""), FileKind::Other);
    }

    #[test]
    fn test_file_kind_roundtrip() {
        for kind in [FileKind::Image, FileKind::Video, FileKind::Audio, FileKind::Other] {
            assert_eq!(FileKind::from_str(kind.as_str()), kind);
        }
    }
}
