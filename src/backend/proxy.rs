//! Compute Proxy
//!
//! Opaque forwarding of `/api/compute/{*path}` to the external
//! execution/kernel backend configured via `COMPUTE_URL`. The sync core
//! does not interpret these requests: method, query, body and content type
//! pass through; the backend's status and body come straight back.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::backend::error::ApiError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// `ANY /api/compute/{*path}`
pub async fn compute_proxy(
    State(app): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Some(base) = app.config.compute_url.as_deref() else {
        return Err(ApiError::ComputeUnavailable);
    };

    let url = format!("{}/{}", base.trim_end_matches('/'), path);
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|_| ApiError::ComputeUnavailable)?;

    let mut upstream = app.http.request(method, &url).body(body);
    if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        upstream = upstream.header(CONTENT_TYPE, content_type);
    }

    let reply = upstream.send().await.map_err(|e| {
        tracing::warn!("[Compute] forward to {} failed: {}", url, e);
        ApiError::ComputeUnavailable
    })?;

    let status =
        StatusCode::from_u16(reply.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = reply
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let bytes = reply.bytes().await.map_err(|_| ApiError::ComputeUnavailable)?;

    let mut response = (status, bytes).into_response();
    if let Some(content_type) = content_type {
        if let Ok(value) = content_type.parse() {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
    }
    Ok(response)
}
