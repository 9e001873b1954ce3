//! HTTP API Client
//!
//! Thin typed wrapper over the REST surface. Server-side failures map back
//! into the shared error taxonomy from the response status; transport
//! failures surface as `StoreUnavailable`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::shared::api::{ApiResponse, TokenGrant, TokenRequest};
use crate::shared::document::Document;
use crate::shared::error::SharedError;
use crate::shared::schemas::{CollectionSchema, UserSchema};

fn net_err(err: reqwest::Error) -> SharedError {
    SharedError::store_unavailable(err.to_string())
}

/// Authenticated HTTP client for one server; cheap to clone
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Wrap an existing token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Log in: request a token for an identity and wrap it
    pub async fn acquire(
        base_url: &str,
        request: &TokenRequest,
    ) -> Result<(Self, Document<UserSchema>), SharedError> {
        let base_url = base_url.trim_end_matches('/');
        let http = reqwest::Client::new();
        let response = http
            .post(format!("{}/api/auth/token", base_url))
            .json(request)
            .send()
            .await
            .map_err(net_err)?;
        let grant: TokenGrant = parse_body(response, "AUTH", "token").await?;
        Ok((Self::new(base_url, grant.token), grant.user))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn collection_url<T: CollectionSchema>(&self) -> String {
        format!("{}/api/{}", self.base_url, T::KEY.route())
    }

    /// `POST /api/<collection>`
    pub async fn create<T: CollectionSchema>(
        &self,
        partial: Value,
    ) -> Result<Document<T>, SharedError> {
        let response = self
            .http
            .post(self.collection_url::<T>())
            .bearer_auth(&self.token)
            .json(&partial)
            .send()
            .await
            .map_err(net_err)?;
        parse_body(response, T::KEY.as_str(), "new").await
    }

    /// `GET /api/<collection>`
    pub async fn get_all<T: CollectionSchema>(&self) -> Result<Vec<Document<T>>, SharedError> {
        let response = self
            .http
            .get(self.collection_url::<T>())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(net_err)?;
        parse_body(response, T::KEY.as_str(), "*").await
    }

    /// `GET /api/<collection>/{id}`
    pub async fn get<T: CollectionSchema>(&self, id: &str) -> Result<Document<T>, SharedError> {
        let response = self
            .http
            .get(format!("{}/{}", self.collection_url::<T>(), id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(net_err)?;
        parse_body(response, T::KEY.as_str(), id).await
    }

    /// `GET /api/<collection>/{field}/{value}`
    pub async fn query<T: CollectionSchema>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document<T>>, SharedError> {
        let response = self
            .http
            .get(format!("{}/{}/{}", self.collection_url::<T>(), field, value))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(net_err)?;
        parse_body(response, T::KEY.as_str(), value).await
    }

    /// `PUT /api/<collection>/{id}`
    pub async fn update<T: CollectionSchema>(
        &self,
        id: &str,
        patch: Value,
    ) -> Result<Document<T>, SharedError> {
        let response = self
            .http
            .put(format!("{}/{}", self.collection_url::<T>(), id))
            .bearer_auth(&self.token)
            .json(&patch)
            .send()
            .await
            .map_err(net_err)?;
        parse_body(response, T::KEY.as_str(), id).await
    }

    /// `DELETE /api/<collection>/{id}`
    pub async fn delete<T: CollectionSchema>(&self, id: &str) -> Result<(), SharedError> {
        let response = self
            .http
            .delete(format!("{}/{}", self.collection_url::<T>(), id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(net_err)?;
        expect_success(response, T::KEY.as_str(), id).await
    }
}

fn status_error(status: reqwest::StatusCode, collection: &str, id: &str) -> SharedError {
    match status.as_u16() {
        400 => SharedError::validation("data", "rejected by server"),
        401 | 403 => SharedError::forbidden("request", collection),
        404 => SharedError::not_found(collection, id),
        _ => SharedError::store_unavailable(format!("server answered {}", status)),
    }
}

/// Check the status and unwrap the `data` of a `{success, data}` body
async fn parse_body<T: DeserializeOwned>(
    response: reqwest::Response,
    collection: &str,
    id: &str,
) -> Result<T, SharedError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, collection, id));
    }
    let body: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| SharedError::serialization(e.to_string()))?;
    match body.data {
        Some(data) if body.success => Ok(data),
        _ => Err(SharedError::serialization("response carried no data")),
    }
}

/// Check the status of a data-less `{success}` body
async fn expect_success(
    response: reqwest::Response,
    collection: &str,
    id: &str,
) -> Result<(), SharedError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, collection, id));
    }
    let body: ApiResponse<Value> = response
        .json()
        .await
        .map_err(|e| SharedError::serialization(e.to_string()))?;
    if body.success {
        Ok(())
    } else {
        Err(SharedError::store_unavailable("server reported failure"))
    }
}
