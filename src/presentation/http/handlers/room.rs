//! Room Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::application::dto::request::{CreateRoomRequest, MessagesParams, SubscribeRequest};
use crate::application::dto::response::{ApiResponse, RoomMessageResponse, RoomResponse};
use crate::application::services::{
    CreateRoomDto, RoomError, RoomService, RoomServiceImpl,
};
use crate::infrastructure::repositories::{
    PgMessageRepository, PgRoomRepository, PgUserRepository,
};
use crate::presentation::middleware::Principal;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

const DEFAULT_HISTORY_LIMIT: i64 = 100;

fn room_service(
    state: &AppState,
) -> RoomServiceImpl<PgRoomRepository, PgMessageRepository, PgUserRepository> {
    RoomServiceImpl::new(
        Arc::new(PgRoomRepository::new(state.db.clone())),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

fn map_room_error(error: RoomError) -> AppError {
    match error {
        RoomError::NotFound => AppError::NotFound("Room not found".into()),
        RoomError::UserNotFound => AppError::NotFound("User not found".into()),
        RoomError::Forbidden => AppError::Forbidden("Not allowed to manage this room".into()),
        RoomError::NotSubscriber => AppError::Forbidden("Not a subscriber of this room".into()),
        RoomError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Create a room; private rooms may name an invitee to add immediately
pub async fn create_room(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomResponse>>), AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;

    let user_to_add = body.user_to_add.as_deref().map(parse_id).transpose()?;

    let dto = room_service(&state)
        .create_room(
            user,
            CreateRoomDto {
                name: body.name,
                is_public: body.is_public,
                user_to_add,
            },
        )
        .await
        .map_err(map_room_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RoomResponse::from(dto))),
    ))
}

/// Rooms visible to the caller
pub async fn list_rooms(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<RoomResponse>>>, AppError> {
    let user = principal.require()?;

    let rooms = room_service(&state)
        .list_rooms(user.id)
        .await
        .map_err(map_room_error)?;

    let response = rooms.into_iter().map(RoomResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}

/// Fetch a single room
pub async fn get_room(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(room_id): Path<String>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let user = principal.require()?;
    let room_id = parse_id(&room_id)?;

    let dto = room_service(&state)
        .get_room(room_id, user.id)
        .await
        .map_err(map_room_error)?;

    Ok(Json(ApiResponse::success(RoomResponse::from(dto))))
}

/// Delete a room (creator only)
pub async fn delete_room(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = principal.require()?;
    let room_id = parse_id(&room_id)?;

    room_service(&state)
        .delete_room(room_id, user)
        .await
        .map_err(map_room_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Join a public room, or add a user to a private room (creator only)
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(room_id): Path<String>,
    body: Option<Json<SubscribeRequest>>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let user = principal.require()?;
    let room_id = parse_id(&room_id)?;

    let user_to_add = body
        .as_ref()
        .and_then(|b| b.user_id.as_deref())
        .map(parse_id)
        .transpose()?;

    let dto = room_service(&state)
        .subscribe(room_id, user, user_to_add)
        .await
        .map_err(map_room_error)?;

    Ok(Json(ApiResponse::success(RoomResponse::from(dto))))
}

/// Leave a room; a no-op when not subscribed
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(room_id): Path<String>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let user = principal.require()?;
    let room_id = parse_id(&room_id)?;

    let dto = room_service(&state)
        .unsubscribe(room_id, user.id)
        .await
        .map_err(map_room_error)?;

    Ok(Json(ApiResponse::success(RoomResponse::from(dto))))
}

/// Message history of a room
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(room_id): Path<String>,
    Query(params): Query<MessagesParams>,
) -> Result<Json<ApiResponse<Vec<RoomMessageResponse>>>, AppError> {
    let user = principal.require()?;
    let room_id = parse_id(&room_id)?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);

    let messages = room_service(&state)
        .messages(room_id, user.id, limit)
        .await
        .map_err(map_room_error)?;

    let response = messages.into_iter().map(RoomMessageResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}
