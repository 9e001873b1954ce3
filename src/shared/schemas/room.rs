//! Room schema
//!
//! A room is the top-level container of the board hierarchy: it owns boards,
//! which in turn own apps. Membership and per-room roles live in the
//! separate `ROOM_MEMBERS` collection, one document per room.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// A room: a named container of boards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSchema {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Accent color name used by clients
    pub color: String,
    /// Id of the owning user
    pub owner_id: String,
    /// Private rooms require the pin to enter
    pub is_private: bool,
    /// Entry pin for private rooms (empty when public)
    pub private_pin: String,
    /// Whether the room appears in public listings
    pub is_listed: bool,
}

impl CollectionSchema for RoomSchema {
    const KEY: CollectionKey = CollectionKey::Rooms;

    fn template() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            color: "gray".to_string(),
            owner_id: String::new(),
            is_private: false,
            private_pin: String::new(),
            is_listed: true,
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["ownerId"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "ownerId" => Some(self.owner_id.clone()),
            _ => None,
        }
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::Room(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Room(room) => Some(room),
            _ => None,
        }
    }
}
