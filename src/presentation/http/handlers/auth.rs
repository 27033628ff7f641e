//! Authentication Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use crate::application::dto::request::{SignInRequest, SignUpRequest};
use crate::application::dto::response::{ApiResponse, TokenResponse, UserResponse};
use crate::application::services::{
    AuthError, AuthService, AuthServiceImpl, SignUpDto, UserDto,
};
use crate::infrastructure::email::SmtpMailer;
use crate::infrastructure::repositories::{
    PgSessionRepository, PgTokenRepository, PgUserRepository,
};
use crate::presentation::middleware::REFRESH_TOKEN_HEADER;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

fn auth_service(
    state: &AppState,
) -> AuthServiceImpl<PgUserRepository, PgSessionRepository, PgTokenRepository, SmtpMailer> {
    AuthServiceImpl::new(
        Arc::new(PgUserRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
        Arc::new(PgTokenRepository::new(state.db.clone())),
        state.mailer.clone(),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
        state.settings.frontend_url.clone(),
    )
}

fn map_auth_error(error: AuthError) -> AppError {
    match error {
        AuthError::InvalidCredentials => AppError::Unauthorized("Invalid login or password".into()),
        AuthError::NotActivated => AppError::NotActivated("Confirm your email first".into()),
        AuthError::EmailExists => AppError::Conflict("Email already exists".into()),
        AuthError::UsernameExists => AppError::Conflict("Username already exists".into()),
        AuthError::TokenExpired => AppError::Unauthorized("Token expired".into()),
        AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
        AuthError::TokenNotFound => AppError::NotFound("Token not found".into()),
        AuthError::UserNotFound => AppError::NotFound("User not found".into()),
        AuthError::SessionNotFound => {
            AppError::Unauthorized("Invalid or expired refresh token".into())
        }
        AuthError::Internal(msg) => AppError::Internal(msg),
    }
}

fn refresh_token_from(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token header".into()))
}

/// Register a new user; the account stays inactive until the mailed
/// confirmation token is redeemed
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    body.validate().map_err(validation_error)?;

    let service = auth_service(&state);
    let user = service
        .sign_up(SignUpDto {
            first_name: body.first_name,
            last_name: body.last_name,
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(map_auth_error)?;

    let dto = UserDto::from_user(user, None);
    Ok(Json(ApiResponse::success(UserResponse::from_dto(dto, true))))
}

/// Redeem a confirm-email token
pub async fn confirm_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    let service = auth_service(&state);
    service
        .confirm_email(&token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ApiResponse::success("Email confirmed")))
}

/// Sign in with email-or-username and password
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    body.validate().map_err(validation_error)?;

    let service = auth_service(&state);
    let tokens = service
        .sign_in(&body.login, &body.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ApiResponse::success(TokenResponse::from(tokens))))
}

/// Exchange the refresh-token header for a new access/refresh pair
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let refresh_token = refresh_token_from(&headers)?;

    let service = auth_service(&state);
    let tokens = service
        .refresh_token(&refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ApiResponse::success(TokenResponse::from(tokens))))
}

/// Revoke the refresh session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let refresh_token = refresh_token_from(&headers)?;

    let service = auth_service(&state);
    // Revoking an already-dead session is not an error worth surfacing
    let _ = service.revoke_token(&refresh_token).await;

    Ok(StatusCode::NO_CONTENT)
}
