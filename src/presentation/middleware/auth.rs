//! Authentication Middleware
//!
//! Principal resolution and the account-activation gate. The principal
//! gate itself never rejects a request; handlers that need an identity
//! fail when the principal is anonymous.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::application::services::decode_access_token;
use crate::domain::{User, UserRepository};
use crate::infrastructure::repositories::PgUserRepository;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Header carrying the access token (raw, no Bearer prefix)
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Header carrying the refresh token
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// The resolved identity of the actor making a request
#[derive(Debug, Clone)]
pub enum Principal {
    Authenticated(User),
    Anonymous,
}

impl Principal {
    /// The authenticated user, or an unauthorized error
    pub fn require(&self) -> Result<&User, AppError> {
        match self {
            Principal::Authenticated(user) => Ok(user),
            Principal::Anonymous => Err(AppError::Unauthorized("Authentication required".into())),
        }
    }

    /// The authenticated user id, if any
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Principal::Authenticated(user) => Some(user.id),
            Principal::Anonymous => None,
        }
    }
}

/// Resolve the request's principal from the access-token header.
///
/// A missing, malformed, or expired token resolves to `Anonymous` rather
/// than failing the request here; downstream checks decide.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match token_from_headers(&request) {
        Some(token) => match decode_access_token(&token, &state.settings.jwt.secret) {
            Ok(user_id) => {
                let user_repo = PgUserRepository::new(state.db.clone());
                match user_repo.find_by_id(user_id).await {
                    Ok(Some(user)) => Principal::Authenticated(user),
                    Ok(None) => Principal::Anonymous,
                    Err(e) => {
                        tracing::error!("Principal lookup failed: {}", e);
                        Principal::Anonymous
                    }
                }
            }
            Err(_) => Principal::Anonymous,
        },
        None => Principal::Anonymous,
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Reject requests whose principal is missing or not yet activated.
pub async fn require_active(request: Request, next: Next) -> Result<Response, AppError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or(Principal::Anonymous);

    let user = principal.require()?;
    if !user.active {
        return Err(AppError::NotActivated("Confirm your email first".into()));
    }

    Ok(next.run(request).await)
}

fn token_from_headers(request: &Request) -> Option<String> {
    request
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_principal_has_no_user() {
        let principal = Principal::Anonymous;
        assert!(principal.require().is_err());
        assert!(principal.user_id().is_none());
    }

    #[test]
    fn test_authenticated_principal_exposes_user() {
        let principal = Principal::Authenticated(User { id: 7, ..Default::default() });
        assert_eq!(principal.require().unwrap().id, 7);
        assert_eq!(principal.user_id(), Some(7));
    }
}
