//! Bearer Tokens
//!
//! Signed JWTs carried by HTTP requests (`Authorization: Bearer …`) and by
//! the WebSocket upgrade (`?token=…`). Tokens only bind an identity; what
//! that identity may do is the gate's business.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Display name, informational
    pub name: String,
    /// Expiry, epoch seconds
    pub exp: usize,
}

/// Issue a token for a user id
pub fn create_token(
    user_id: &str,
    name: &str,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, SharedError> {
    let exp = chrono::Utc::now().timestamp() as usize + ttl_secs as usize;
    let claims = Claims { sub: user_id.to_string(), name: name.to_string(), exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| SharedError::serialization(format!("token encode: {}", e)))
}

/// Verify a token and return its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, SharedError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| SharedError::validation("token", e.to_string()))
}
