//! User Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::application::dto::request::{UpdateUserRequest, UserSearchParams};
use crate::application::dto::response::{ApiResponse, UserResponse};
use crate::application::services::{
    UpdateProfileDto, UserError, UserService, UserServiceImpl,
};
use crate::infrastructure::repositories::PgUserRepository;
use crate::presentation::middleware::Principal;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

const DEFAULT_SEARCH_LIMIT: i64 = 20;

fn user_service(state: &AppState) -> UserServiceImpl<PgUserRepository> {
    UserServiceImpl::new(Arc::new(PgUserRepository::new(state.db.clone())))
}

fn map_user_error(error: UserError) -> AppError {
    match error {
        UserError::NotFound => AppError::NotFound("User not found".into()),
        UserError::SelfFollow => AppError::BadRequest("Cannot follow yourself".into()),
        UserError::UsernameTaken => AppError::Conflict("Username already taken".into()),
        UserError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Search the user directory
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<UserSearchParams>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let query = params.q.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 100);

    let users = user_service(&state)
        .search(&query, limit)
        .await
        .map_err(map_user_error)?;

    let response = users
        .into_iter()
        .map(|dto| UserResponse::from_dto(dto, false))
        .collect();

    Ok(Json(ApiResponse::success(response)))
}

/// Current user's own profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = principal.require()?;

    let dto = user_service(&state)
        .get_user(user.id, Some(user.id))
        .await
        .map_err(map_user_error)?;

    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, true))))
}

/// Update the current user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;

    let dto = user_service(&state)
        .update_profile(
            user.id,
            UpdateProfileDto {
                first_name: body.first_name,
                last_name: body.last_name,
                username: body.username,
                avatar_url: body.avatar_url,
            },
        )
        .await
        .map_err(map_user_error)?;

    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, true))))
}

/// Delete the current user's account
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, AppError> {
    let user = principal.require()?;

    user_service(&state)
        .delete_account(user.id)
        .await
        .map_err(map_user_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Fetch another user's profile
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user_id = parse_id(&user_id)?;

    let dto = user_service(&state)
        .get_user(user_id, principal.user_id())
        .await
        .map_err(map_user_error)?;

    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, false))))
}

/// Follow a user
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let follower = principal.require()?;
    let target_id = parse_id(&user_id)?;

    let dto = user_service(&state)
        .follow(target_id, follower.id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, false))))
}

/// Unfollow a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let follower = principal.require()?;
    let target_id = parse_id(&user_id)?;

    let dto = user_service(&state)
        .unfollow(target_id, follower.id)
        .await
        .map_err(map_user_error)?;

    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, false))))
}

/// List a user's followers
pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let user_id = parse_id(&user_id)?;

    let followers = user_service(&state)
        .followers(user_id)
        .await
        .map_err(map_user_error)?;

    let response = followers
        .into_iter()
        .map(|dto| UserResponse::from_dto(dto, false))
        .collect();

    Ok(Json(ApiResponse::success(response)))
}
