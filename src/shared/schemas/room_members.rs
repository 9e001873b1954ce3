//! Room membership schema
//!
//! Exactly one `ROOM_MEMBERS` document exists per room for the room's
//! lifetime, enumerating `{userId, role}` pairs. The authorization gate
//! consults this collection for room-scoped permissions.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// Role a user holds inside one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomRole {
    Owner,
    Member,
}

/// One membership entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub user_id: String,
    pub role: RoomRole,
}

/// The membership roster of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMembersSchema {
    /// Id of the room this roster belongs to
    pub room_id: String,
    pub members: Vec<RoomMember>,
}

impl RoomMembersSchema {
    /// Role of `user_id` in this room, if a member
    pub fn role_of(&self, user_id: &str) -> Option<RoomRole> {
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
    }
}

impl CollectionSchema for RoomMembersSchema {
    const KEY: CollectionKey = CollectionKey::RoomMembers;

    fn template() -> Self {
        Self {
            room_id: String::new(),
            members: Vec::new(),
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["roomId"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "roomId" => Some(self.room_id.clone()),
            _ => None,
        }
    }

    fn room_scope(&self) -> Option<&str> {
        Some(&self.room_id)
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::RoomMembers(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::RoomMembers(members) => Some(members),
            _ => None,
        }
    }
}
