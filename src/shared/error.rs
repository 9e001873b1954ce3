//! Shared Error Types
//!
//! This module defines the error taxonomy shared between the server-side
//! collections and the client-side store mirrors.
//!
//! # Error Categories
//!
//! - `Validation` - malformed or incomplete input data, rejected before any write
//! - `NotFound` - the operation targets a nonexistent document id
//! - `Forbidden` - the authorization gate denied the operation
//! - `StoreUnavailable` - the underlying store is unreachable
//! - `Serialization` - JSON encoding/decoding failures
//!
//! Concurrent last-write-wins overwrites are *not* an error; they are logged
//! by the collection layer and otherwise invisible.
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread boundaries.
use thiserror::Error;

/// Error type shared between the sync core and the client mirrors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// The targeted document does not exist
    #[error("document '{id}' not found in {collection}")]
    NotFound {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
    },

    /// The authorization gate denied the operation
    #[error("forbidden: {action} on {collection}")]
    Forbidden {
        /// The attempted action
        action: String,
        /// Collection name
        collection: String,
    },

    /// The underlying document store is unreachable
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a new forbidden error
    pub fn forbidden(action: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
            collection: collection.into(),
        }
    }

    /// Create a new store-unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
