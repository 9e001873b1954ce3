//! Backend Error Types
//!
//! [`ApiError`] wraps the shared taxonomy for the HTTP layer and maps each
//! failure to a status code and a `{success:false}` body. Internal store
//! errors never leak into response payloads; they are logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::shared::api::ApiResponse;
use crate::shared::error::SharedError;

/// Error type returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// A core failure from the collection layer
    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Missing or invalid identity
    #[error("unauthorized")]
    Unauthorized,

    /// The compute backend is not configured or unreachable
    #[error("compute backend unavailable")]
    ComputeUnavailable,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Shared(err) => match err {
                SharedError::Validation { .. } => StatusCode::BAD_REQUEST,
                SharedError::NotFound { .. } => StatusCode::NOT_FOUND,
                SharedError::Forbidden { .. } => StatusCode::FORBIDDEN,
                SharedError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ComputeUnavailable => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Api] {}: {}", status, self);
        } else {
            tracing::debug!("[Api] {}: {}", status, self);
        }
        (status, Json(ApiResponse::<()>::fail())).into_response()
    }
}
