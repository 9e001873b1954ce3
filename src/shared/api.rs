//! HTTP response envelope
//!
//! Every REST route answers `{success, data?}`. Failures carry
//! `success: false` and never leak internal store errors into the body.

use serde::{Deserialize, Serialize};

/// The `{success, data?}` body shared by all REST routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying data
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data) }
    }

    /// A successful response with no payload
    pub fn ok_empty() -> Self {
        Self { success: true, data: None }
    }

    /// A failed response
    pub fn fail() -> Self {
        Self { success: false, data: None }
    }
}

/// Body of `POST /api/auth/token`
///
/// External identity providers are out of scope; this route binds a name
/// (and optional email) to a user document and issues a signed token for
/// it. `guest: true` requests a read-mostly guest identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub guest: bool,
}

/// Reply of `POST /api/auth/token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub user: crate::shared::document::Document<crate::shared::schemas::UserSchema>,
}

/// Reply of `GET /api/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub server_name: String,
    pub version: String,
}
