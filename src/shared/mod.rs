//! Shared Types
//!
//! Types used on both sides of the wire: the document envelope, the
//! collection schemas, change events, the HTTP response envelope, and the
//! shared error taxonomy.

pub mod api;
pub mod document;
pub mod error;
pub mod event;
pub mod schemas;

// Re-export commonly used types
pub use api::{ApiResponse, ServerInfo, TokenGrant, TokenRequest};
pub use document::{merge_data, merge_typed, now_millis, Document};
pub use error::SharedError;
pub use event::{ChangeEvent, ChangeKind, SocketReply, SocketRequest, SubscribeTarget};
pub use schemas::{CollectionKey, CollectionSchema, DocumentPayload};
