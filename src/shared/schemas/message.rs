//! Message schema
//!
//! Transient notifications between clients (toasts, pings). Messages carry a
//! TTL like presence and evaporate from the store shortly after delivery.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// A transient typed notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSchema {
    /// Message kind, interpreted by clients
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Free-form payload text
    pub payload: String,
}

impl CollectionSchema for MessageSchema {
    const KEY: CollectionKey = CollectionKey::Messages;

    fn template() -> Self {
        Self {
            msg_type: "info".to_string(),
            payload: String::new(),
        }
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::Message(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Message(message) => Some(message),
            _ => None,
        }
    }
}
