//! Upload Service
//!
//! Stores uploaded blobs on disk and tracks their metadata rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{FileKind, FileRepository, StoredFile, User};
use crate::infrastructure::storage::DiskStorage;
use crate::shared::snowflake::SnowflakeGenerator;

/// Upload service trait
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Store a blob and its metadata row
    async fn store(
        &self,
        owner_id: i64,
        original_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<FileDto, UploadError>;

    /// List the caller's files, optionally filtered by kind
    async fn list(&self, owner_id: i64, kind: Option<FileKind>) -> Result<Vec<FileDto>, UploadError>;

    /// Delete a file (owner only): blob first, then the row
    async fn delete(&self, file_id: i64, actor: &User) -> Result<(), UploadError>;
}

/// File data transfer object
#[derive(Debug, Clone)]
pub struct FileDto {
    pub id: String,
    pub original_name: String,
    pub kind: String,
    pub extension: String,
    pub created_at: String,
}

impl From<StoredFile> for FileDto {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id.to_string(),
            original_name: file.original_name,
            kind: file.kind.as_str().to_string(),
            extension: file.extension,
            created_at: file.created_at.to_rfc3339(),
        }
    }
}

/// Upload service errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File not found")]
    NotFound,

    #[error("Not the owner of this file")]
    Forbidden,

    #[error("File too large")]
    TooLarge,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// UploadService implementation
pub struct UploadServiceImpl<F>
where
    F: FileRepository,
{
    file_repo: Arc<F>,
    storage: DiskStorage,
    id_generator: Arc<SnowflakeGenerator>,
    max_size: usize,
}

impl<F> UploadServiceImpl<F>
where
    F: FileRepository,
{
    pub fn new(
        file_repo: Arc<F>,
        storage: DiskStorage,
        id_generator: Arc<SnowflakeGenerator>,
        max_size: usize,
    ) -> Self {
        Self {
            file_repo,
            storage,
            id_generator,
            max_size,
        }
    }
}

#[async_trait]
impl<F> UploadService for UploadServiceImpl<F>
where
    F: FileRepository + 'static,
{
    async fn store(
        &self,
        owner_id: i64,
        original_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<FileDto, UploadError> {
        if bytes.len() > self.max_size {
            return Err(UploadError::TooLarge);
        }

        let kind = FileKind::from_mime(mime);
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let path = self
            .storage
            .store(kind, original_name, bytes)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        let file = StoredFile {
            id: self.id_generator.generate(),
            owner_id,
            original_name: original_name.to_string(),
            path: path.to_string_lossy().into_owned(),
            kind,
            extension,
            created_at: Utc::now(),
        };

        let created = self
            .file_repo
            .create(&file)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        tracing::info!(file_id = created.id, owner_id = owner_id, kind = %kind, "File stored");

        Ok(FileDto::from(created))
    }

    async fn list(
        &self,
        owner_id: i64,
        kind: Option<FileKind>,
    ) -> Result<Vec<FileDto>, UploadError> {
        let files = self
            .file_repo
            .find_by_owner(owner_id, kind)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        Ok(files.into_iter().map(FileDto::from).collect())
    }

    async fn delete(&self, file_id: i64, actor: &User) -> Result<(), UploadError> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?
            .ok_or(UploadError::NotFound)?;

        if file.owner_id != actor.id && !actor.is_admin() {
            return Err(UploadError::Forbidden);
        }

        self.storage
            .remove(&file.path)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        self.file_repo
            .delete(file_id)
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::upload::MockFileRepository;

    fn service_with(
        file_repo: MockFileRepository,
        root: &std::path::Path,
        max_size: usize,
    ) -> UploadServiceImpl<MockFileRepository> {
        UploadServiceImpl::new(
            Arc::new(file_repo),
            DiskStorage::new(root),
            Arc::new(SnowflakeGenerator::new(1, 0)),
            max_size,
        )
    }

    #[tokio::test]
    async fn test_store_derives_kind_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut file_repo = MockFileRepository::new();
        file_repo
            .expect_create()
            .withf(|f: &StoredFile| f.kind == FileKind::Image && f.extension == "png")
            .times(1)
            .returning(|f| Ok(f.clone()));

        let service = service_with(file_repo, dir.path(), 1024);
        let dto = service.store(1, "Cat.PNG", "image/png", b"bytes").await.unwrap();

        assert_eq!(dto.kind, "image");
        assert_eq!(dto.extension, "png");
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(MockFileRepository::new(), dir.path(), 4);

        let result = service.store(1, "big.bin", "application/octet-stream", b"12345").await;
        assert!(matches!(result, Err(UploadError::TooLarge)));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let mut file_repo = MockFileRepository::new();
        file_repo.expect_find_by_id().returning(|id| {
            Ok(Some(StoredFile {
                id,
                owner_id: 1,
                original_name: "cat.png".into(),
                path: "/nowhere/cat.png".into(),
                kind: FileKind::Image,
                extension: "png".into(),
                created_at: Utc::now(),
            }))
        });

        let service = service_with(file_repo, dir.path(), 1024);
        let stranger = User { id: 99, ..Default::default() };

        assert!(matches!(
            service.delete(5, &stranger).await,
            Err(UploadError::Forbidden)
        ));
    }
}
