//! File Upload Handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::application::dto::request::FileListParams;
use crate::application::dto::response::{ApiResponse, FileResponse};
use crate::application::services::{UploadError, UploadService, UploadServiceImpl};
use crate::domain::FileKind;
use crate::infrastructure::repositories::PgFileRepository;
use crate::infrastructure::storage::DiskStorage;
use crate::presentation::middleware::Principal;
use crate::shared::error::AppError;
use crate::startup::AppState;

use super::parse_id;

fn upload_service(state: &AppState) -> UploadServiceImpl<PgFileRepository> {
    UploadServiceImpl::new(
        Arc::new(PgFileRepository::new(state.db.clone())),
        DiskStorage::new(state.settings.upload.dir.clone()),
        state.snowflake.clone(),
        state.settings.upload.max_size,
    )
}

fn map_upload_error(error: UploadError) -> AppError {
    match error {
        UploadError::NotFound => AppError::NotFound("File not found".into()),
        UploadError::Forbidden => AppError::Forbidden("Not the owner of this file".into()),
        UploadError::TooLarge => AppError::BadRequest("File too large".into()),
        UploadError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Accept a multipart upload; the blob lands under a kind-partitioned
/// directory derived from its MIME type
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), AppError> {
    let user = principal.require()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let dto = upload_service(&state)
            .store(user.id, &original_name, &mime, &bytes)
            .await
            .map_err(map_upload_error)?;

        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(FileResponse::from(dto))),
        ));
    }

    Err(AppError::BadRequest("Missing file field".into()))
}

/// List the caller's uploads, optionally filtered by kind
pub async fn list_files(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<FileListParams>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, AppError> {
    let user = principal.require()?;
    let kind = params.kind.as_deref().map(FileKind::from_str);

    let files = upload_service(&state)
        .list(user.id, kind)
        .await
        .map_err(map_upload_error)?;

    let response = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}

/// Delete one of the caller's uploads
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = principal.require()?;
    let file_id = parse_id(&file_id)?;

    upload_service(&state)
        .delete(file_id, user)
        .await
        .map_err(map_upload_error)?;

    Ok(StatusCode::NO_CONTENT)
}
