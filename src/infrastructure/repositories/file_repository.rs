//! File Repository Implementation
//!
//! PostgreSQL implementation of the FileRepository trait for uploaded
//! file metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{FileKind, FileRepository, StoredFile};
use crate::shared::error::AppError;

/// Database row representation matching the files table schema.
#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: i64,
    owner_id: i64,
    original_name: String,
    path: String,
    kind: String,
    extension: String,
    created_at: DateTime<Utc>,
}

impl FileRow {
    fn into_file(self) -> StoredFile {
        StoredFile {
            id: self.id,
            owner_id: self.owner_id,
            original_name: self.original_name,
            path: self.path,
            kind: FileKind::from_str(&self.kind),
            extension: self.extension,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL file repository implementation.
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    /// Create a new PgFileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<StoredFile>, AppError> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT id, owner_id, original_name, path, kind, extension, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_file()))
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        kind: Option<FileKind>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query_as::<_, FileRow>(
                    r#"
                    SELECT id, owner_id, original_name, path, kind, extension, created_at
                    FROM files
                    WHERE owner_id = $1 AND kind = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner_id)
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, FileRow>(
                    r#"
                    SELECT id, owner_id, original_name, path, kind, extension, created_at
                    FROM files
                    WHERE owner_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into_file()).collect())
    }

    async fn create(&self, file: &StoredFile) -> Result<StoredFile, AppError> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            INSERT INTO files (id, owner_id, original_name, path, kind, extension)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, original_name, path, kind, extension, created_at
            "#,
        )
        .bind(file.id)
        .bind(file.owner_id)
        .bind(&file.original_name)
        .bind(&file.path)
        .bind(file.kind.as_str())
        .bind(&file.extension)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_file())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("File with id {} not found", id)));
        }

        Ok(())
    }
}
