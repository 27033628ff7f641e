//! HTTP Handlers
//!
//! One module per API surface. Handlers construct their services
//! explicitly per request, validate input, and translate service errors
//! into the response envelope.

pub mod auth;
pub mod comment;
pub mod health;
pub mod room;
pub mod tweet;
pub mod upload;
pub mod user;

use crate::shared::error::AppError;

/// Parse a path/body id that travels as a string
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid id: {}", raw)))
}
