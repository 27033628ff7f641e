//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod security;

pub use auth::{
    require_active, resolve_principal, Principal, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER,
};
pub use security::{
    create_security_headers_layer, create_security_headers_layer_no_hsts, SecurityHeadersConfig,
    SecurityHeadersLayer,
};
