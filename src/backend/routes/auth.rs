//! Identity Routes
//!
//! `POST /api/auth/token` binds a name (and optional email) to a user
//! document and answers with a signed bearer token, standing in for the
//! external identity providers, which are out of scope. Known emails map
//! back to their existing user document; everything else gets a fresh one.
//!
//! `GET /api/auth/me` echoes the authenticated caller's user document.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::backend::auth::token::create_token;
use crate::backend::auth::Actor;
use crate::backend::error::ApiError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::api::{ApiResponse, TokenGrant, TokenRequest};
use crate::shared::document::Document;
use crate::shared::error::SharedError;
use crate::shared::schemas::UserSchema;

/// Issue a token, creating the user document on first sight
pub async fn issue_token(
    State(app): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<ApiResponse<TokenGrant>>, ApiError> {
    if request.name.trim().is_empty() {
        return Err(SharedError::validation("name", "must not be empty").into());
    }

    let server = Actor::server();
    let existing = match &request.email {
        Some(email) if !email.is_empty() => app
            .collections
            .users
            .query("email", email)
            .await?
            .into_iter()
            .next(),
        _ => None,
    };

    let user: Document<UserSchema> = match existing {
        Some(user) => user,
        None => {
            let role = if request.guest { "guest" } else { "user" };
            app.collections
                .users
                .add(
                    json!({
                        "name": request.name,
                        "email": request.email.clone().unwrap_or_default(),
                        "userRole": role,
                    }),
                    &server,
                )
                .await?
        }
    };

    let token = create_token(
        &user.id,
        &user.data.name,
        &app.config.auth_secret,
        app.config.token_ttl_secs,
    )?;
    tracing::info!("[Auth] token issued for '{}' ({})", user.data.name, user.id);

    Ok(Json(ApiResponse::ok(TokenGrant { token, user })))
}

/// The authenticated caller's user document
pub async fn me(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Document<UserSchema>>>, ApiError> {
    let doc = app
        .collections
        .users
        .get(&user.user_id)
        .await?
        .ok_or_else(|| SharedError::not_found("USERS", &user.user_id))?;
    Ok(Json(ApiResponse::ok(doc)))
}
