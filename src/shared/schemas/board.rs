//! Board schema
//!
//! A board is the shared canvas users collaborate on. Boards belong to a
//! room (`room_id`) and are the scope for app placement and presence.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// A board: one collaborative canvas inside a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSchema {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Accent color name used by clients
    pub color: String,
    /// Id of the owning room
    pub room_id: String,
    /// Id of the owning user
    pub owner_id: String,
    /// Private boards require the pin to enter
    pub is_private: bool,
    /// Entry pin for private boards (empty when public)
    pub private_pin: String,
    /// Locked boards reject app mutations from non-owners
    pub is_locked: bool,
}

impl CollectionSchema for BoardSchema {
    const KEY: CollectionKey = CollectionKey::Boards;

    fn template() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            color: "gray".to_string(),
            room_id: String::new(),
            owner_id: String::new(),
            is_private: false,
            private_pin: String::new(),
            is_locked: false,
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["roomId", "ownerId"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "roomId" => Some(self.room_id.clone()),
            "ownerId" => Some(self.owner_id.clone()),
            _ => None,
        }
    }

    fn room_scope(&self) -> Option<&str> {
        Some(&self.room_id)
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::Board(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Board(board) => Some(board),
            _ => None,
        }
    }
}
