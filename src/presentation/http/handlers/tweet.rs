//! Tweet Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CreateTweetRequest, FeedParams, RetweetRequest, UpdateTweetRequest,
};
use crate::application::dto::response::{ApiResponse, CommentResponse, TweetResponse};
use crate::application::services::{
    CommentService, CommentServiceImpl, TweetError, TweetService, TweetServiceImpl,
};
use crate::infrastructure::repositories::{
    PgCommentRepository, PgTweetRepository, PgUserRepository,
};
use crate::presentation::middleware::Principal;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

use super::parse_id;

const DEFAULT_FEED_LIMIT: i64 = 50;

fn tweet_service(
    state: &AppState,
) -> TweetServiceImpl<PgTweetRepository, PgCommentRepository, PgUserRepository> {
    TweetServiceImpl::new(
        Arc::new(PgTweetRepository::new(state.db.clone())),
        Arc::new(PgCommentRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

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

fn map_tweet_error(error: TweetError) -> AppError {
    match error {
        TweetError::NotFound => AppError::NotFound("Tweet not found".into()),
        TweetError::Forbidden => AppError::Forbidden("Not the author of this tweet".into()),
        TweetError::Internal(msg) => AppError::Internal(msg),
    }
}

/// Post a new tweet
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateTweetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TweetResponse>>), AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;

    let dto = tweet_service(&state)
        .create_tweet(user.id, &body.text)
        .await
        .map_err(map_tweet_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TweetResponse::from(dto))),
    ))
}

/// Latest tweets, with viewer flags when authenticated
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<Vec<TweetResponse>>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, 100);

    let tweets = tweet_service(&state)
        .get_feed(principal.user_id(), limit)
        .await
        .map_err(map_tweet_error)?;

    let response = tweets.into_iter().map(TweetResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}

/// Fetch a single tweet
pub async fn get_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiResponse<TweetResponse>>, AppError> {
    let tweet_id = parse_id(&tweet_id)?;

    let dto = tweet_service(&state)
        .get_tweet(tweet_id, principal.user_id())
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(ApiResponse::success(TweetResponse::from(dto))))
}

/// Edit a tweet's text
pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
    Json(body): Json<UpdateTweetRequest>,
) -> Result<Json<ApiResponse<TweetResponse>>, AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;
    let tweet_id = parse_id(&tweet_id)?;

    let dto = tweet_service(&state)
        .update_tweet(tweet_id, user, &body.text)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(ApiResponse::success(TweetResponse::from(dto))))
}

/// Delete a tweet
pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = principal.require()?;
    let tweet_id = parse_id(&tweet_id)?;

    tweet_service(&state)
        .delete_tweet(tweet_id, user)
        .await
        .map_err(map_tweet_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Like a tweet
pub async fn like_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiResponse<TweetResponse>>, AppError> {
    let user = principal.require()?;
    let tweet_id = parse_id(&tweet_id)?;

    let dto = tweet_service(&state)
        .like(tweet_id, user.id)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(ApiResponse::success(TweetResponse::from(dto))))
}

/// Remove a like from a tweet
pub async fn unlike_tweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiResponse<TweetResponse>>, AppError> {
    let user = principal.require()?;
    let tweet_id = parse_id(&tweet_id)?;

    let dto = tweet_service(&state)
        .unlike(tweet_id, user.id)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(ApiResponse::success(TweetResponse::from(dto))))
}

/// Retweet a tweet, optionally with quote text
pub async fn retweet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
    Json(body): Json<RetweetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TweetResponse>>), AppError> {
    let user = principal.require()?;
    body.validate().map_err(validation_error)?;
    let tweet_id = parse_id(&tweet_id)?;

    let dto = tweet_service(&state)
        .retweet(tweet_id, user.id, &body.text)
        .await
        .map_err(map_tweet_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TweetResponse::from(dto))),
    ))
}

/// Top-level comments of a tweet
pub async fn get_tweet_comments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tweet_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, AppError> {
    let tweet_id = parse_id(&tweet_id)?;

    let comments = comment_service(&state)
        .comments_for_tweet(tweet_id, principal.user_id())
        .await
        .map_err(super::comment::map_comment_error)?;

    let response = comments.into_iter().map(CommentResponse::from).collect();
    Ok(Json(ApiResponse::success(response)))
}
