//! Route Configuration
//!
//! The explicit route table for the API: every route under `/api/v1`
//! resolves a principal first; mutating routes additionally require an
//! activated account.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    create_security_headers_layer, create_security_headers_layer_no_hsts, logging, require_active,
    resolve_principal,
};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let security_layer = if state.settings.is_production() {
        create_security_headers_layer()
    } else {
        create_security_headers_layer_no_hsts()
    };

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(logging::record_metrics))
        .layer(logging::create_trace_layer())
        .layer(security_layer)
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes; principal resolution wraps everything
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/tweets", tweet_routes())
        .nest("/comments", comment_routes())
        .nest("/rooms", room_routes())
        .nest("/files", file_routes())
        .route_layer(middleware::from_fn_with_state(state, resolve_principal))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(handlers::auth::sign_up))
        .route("/sign-in", post(handlers::auth::sign_in))
        .route("/confirm-email/{token}", get(handlers::auth::confirm_email))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout))
}

/// User directory routes
fn user_routes() -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/me",
            get(handlers::user::get_me)
                .patch(handlers::user::update_me)
                .delete(handlers::user::delete_me),
        )
        .route(
            "/{user_id}/follow",
            post(handlers::user::follow_user).delete(handlers::user::unfollow_user),
        )
        .route_layer(middleware::from_fn(require_active));

    Router::new()
        .route("/", get(handlers::user::search_users))
        .route("/{user_id}", get(handlers::user::get_user))
        .route("/{user_id}/followers", get(handlers::user::get_followers))
        .merge(protected)
}

/// Tweet routes; reads are open, writes need an activated account
fn tweet_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(handlers::tweet::create_tweet))
        .route(
            "/{tweet_id}",
            axum::routing::patch(handlers::tweet::update_tweet)
                .delete(handlers::tweet::delete_tweet),
        )
        .route(
            "/{tweet_id}/like",
            post(handlers::tweet::like_tweet).delete(handlers::tweet::unlike_tweet),
        )
        .route("/{tweet_id}/retweet", post(handlers::tweet::retweet))
        .route_layer(middleware::from_fn(require_active));

    Router::new()
        .route("/", get(handlers::tweet::get_feed))
        .route("/{tweet_id}", get(handlers::tweet::get_tweet))
        .route("/{tweet_id}/comments", get(handlers::tweet::get_tweet_comments))
        .merge(protected)
}

/// Comment routes
fn comment_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(handlers::comment::create_comment))
        .route(
            "/{comment_id}",
            axum::routing::patch(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route(
            "/{comment_id}/like",
            post(handlers::comment::like_comment).delete(handlers::comment::unlike_comment),
        )
        .route_layer(middleware::from_fn(require_active));

    Router::new()
        .route("/{comment_id}", get(handlers::comment::get_comment))
        .route("/{comment_id}/replies", get(handlers::comment::get_replies))
        .merge(protected)
}

/// Room routes (all require an activated account)
fn room_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::room::list_rooms).post(handlers::room::create_room),
        )
        .route(
            "/{room_id}",
            get(handlers::room::get_room).delete(handlers::room::delete_room),
        )
        .route("/{room_id}/subscribe", post(handlers::room::subscribe))
        .route("/{room_id}/unsubscribe", post(handlers::room::unsubscribe))
        .route("/{room_id}/messages", get(handlers::room::get_messages))
        .route_layer(middleware::from_fn(require_active))
}

/// File routes (all require an activated account)
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::upload::list_files).post(handlers::upload::upload_file),
        )
        .route("/{file_id}", delete(handlers::upload::delete_file))
        .route_layer(middleware::from_fn(require_active))
}
