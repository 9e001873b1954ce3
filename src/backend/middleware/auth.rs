//! Authentication Middleware
//!
//! Extracts and verifies the bearer token from the `Authorization` header
//! and attaches the authenticated identity to the request. Routes behind
//! this middleware reject unauthenticated requests with 401; what the
//! identity may *do* is decided later by the authorization gate.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::backend::auth::token::verify_token;
use crate::backend::auth::Actor;
use crate::backend::error::ApiError;
use crate::backend::server::state::AppState;

/// Identity extracted from a verified token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub name: String,
}

impl AuthenticatedUser {
    /// The actor collection operations run as
    pub fn actor(&self) -> Actor {
        Actor::user(&self.user_id)
    }
}

/// Bearer-token authentication middleware
///
/// 1. Reads `Authorization: Bearer <token>`
/// 2. Verifies the signature and expiry
/// 3. Attaches [`AuthenticatedUser`] to request extensions
pub async fn auth_middleware(
    State(app): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!("[Auth] missing Authorization header");
            ApiError::Unauthorized
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!("[Auth] malformed Authorization header");
        ApiError::Unauthorized
    })?;

    let claims = verify_token(token, &app.config.auth_secret).map_err(|e| {
        tracing::debug!("[Auth] invalid token: {}", e);
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        name: claims.name,
    });

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user set by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}
