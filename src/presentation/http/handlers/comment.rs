//! Comment Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::application::dto::request::{CreateCommentRequest, UpdateCommentRequest};
use crate::application::dto::response::{ApiResponse, CommentResponse};
use crate::application::services::{
    CommentError, CommentService, CommentServiceImpl, CreateCommentDto,
};
use crate::infrastructure::repositories::{
    PgCommentRepository, PgTweetRepository, PgUserRepository,
};
use crate::presentation::middleware::Principal;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

fn comment_service(
    state: &AppState,
) -> CommentServiceImpl<PgCommentRepository, PgTweetRepository, PgUserRepository> {
    CommentServiceImpl::new(
        Arc::new(PgCommentRepository::new(state.db.clone())),
        Arc::new(PgTweetRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub(crate) fn map_comment_error(error: CommentError) -> AppError {
    match error {
        CommentError::NotFound => AppError::NotFound("Comment not found".into()),
        CommentError::TweetNotFound => AppError::NotFound("Tweet not found".into()),
        CommentError::MissingTarget => {
            AppError::BadRequest("Comment needs a tweet or a parent comment".into())
        }
        CommentError::Forbidden => AppError::Forbidden("Not the author of this comment".into()),
        CommentError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Post a comment on a tweet, or a reply to another comment
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;

    let tweet_id = body.tweet_id.as_deref().map(parse_id).transpose()?;
    let reply_to = body.reply_to.as_deref().map(parse_id).transpose()?;

    let dto = comment_service(&state)
        .create_comment(
            user.id,
            CreateCommentDto {
                text: body.text,
                tweet_id,
                reply_to,
            },
        )
        .await
        .map_err(map_comment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CommentResponse::from(dto))),
    ))
}

/// Fetch a single comment
pub async fn get_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<CommentResponse>>, AppError> {
    let comment_id = parse_id(&comment_id)?;

    let dto = comment_service(&state)
        .get_comment(comment_id, principal.user_id())
        .await
        .map_err(map_comment_error)?;

    Ok(Json(ApiResponse::success(CommentResponse::from(dto))))
}

/// Edit a comment's text
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;
    let comment_id = parse_id(&comment_id)?;

    let dto = comment_service(&state)
        .update_comment(comment_id, user, &body.text)
        .await
        .map_err(map_comment_error)?;

    Ok(Json(ApiResponse::success(CommentResponse::from(dto))))
}

/// Delete a comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = principal.require()?;
    let comment_id = parse_id(&comment_id)?;

    comment_service(&state)
        .delete_comment(comment_id, user)
        .await
        .map_err(map_comment_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Like a comment
pub async fn like_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<CommentResponse>>, AppError> {
    let user = principal.require()?;
    let comment_id = parse_id(&comment_id)?;

    let dto = comment_service(&state)
        .like(comment_id, user.id)
        .await
        .map_err(map_comment_error)?;

    Ok(Json(ApiResponse::success(CommentResponse::from(dto))))
}

/// Remove a like from a comment
pub async fn unlike_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<CommentResponse>>, AppError> {
    let user = principal.require()?;
    let comment_id = parse_id(&comment_id)?;

    let dto = comment_service(&state)
        .unlike(comment_id, user.id)
        .await
        .map_err(map_comment_error)?;

    Ok(Json(ApiResponse::success(CommentResponse::from(dto))))
}

/// Replies to a comment
pub async fn get_replies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, AppError> {
    let comment_id = parse_id(&comment_id)?;

    let replies = comment_service(&state)
        .replies(comment_id, principal.user_id())
        .await
        .map_err(map_comment_error)?;

    let response = replies.into_iter().map(CommentResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}
