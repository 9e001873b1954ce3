//! Router Assembly
//!
//! Route groups, in order:
//!
//! 1. Authenticated API: the collection CRUD surface, `/auth/me`, and the
//!    compute proxy, all behind the bearer-token middleware.
//! 2. Public API: `/auth/token` (token issue) and `/info`.
//! 3. `/ws`: the subscription socket, which authenticates its own upgrade
//!    via `?token=…` (browsers cannot set headers on WebSocket requests).
//!
//! CORS and request tracing wrap everything; unknown paths answer 404 with
//! the standard `{success:false}` body.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{any, get, post};
use axum::{middleware, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth_middleware;
use crate::backend::proxy::compute_proxy;
use crate::backend::realtime::ws::ws_handler;
use crate::backend::routes::{auth, collections};
use crate::backend::server::state::AppState;
use crate::shared::api::{ApiResponse, ServerInfo};

async fn server_info(State(app): State<AppState>) -> Json<ApiResponse<ServerInfo>> {
    Json(ApiResponse::ok(ServerInfo {
        server_name: app.config.server_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::fail()))
}

/// Build the complete application router
pub fn create_router(app_state: AppState) -> Router<()> {
    let api = Router::new()
        .merge(collections::collection_routes())
        .route("/auth/me", get(auth::me))
        .route("/compute/{*path}", any(compute_proxy))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ))
        // Public routes: token issue, server info, and the socket upgrade
        .route("/auth/token", post(auth::issue_token))
        .route("/info", get(server_info))
        .route("/ws", get(ws_handler));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
