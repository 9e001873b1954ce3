//! Presence schema
//!
//! Presence documents are ephemeral: one per active user session, refreshed
//! on every cursor/viewport update and expired by the store's TTL when a
//! client goes silent. By convention the presence document id equals the
//! user id, so a user has at most one live presence record.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};
use crate::shared::schemas::Position;

/// Connection status advertised to other users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    #[default]
    Online,
    Away,
}

/// Cursor location on the board canvas
pub type Cursor = Position;

/// The rectangle of the board a user currently has on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Ephemeral per-session record of a user's live position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSchema {
    /// Id of the user this presence belongs to
    pub user_id: String,
    pub status: PresenceStatus,
    /// Room the user is currently in (empty in the lobby)
    pub room_id: String,
    /// Board the user is currently on (empty outside a board)
    pub board_id: String,
    pub cursor: Cursor,
    pub viewport: Viewport,
}

impl CollectionSchema for PresenceSchema {
    const KEY: CollectionKey = CollectionKey::Presence;

    fn template() -> Self {
        Self {
            user_id: String::new(),
            status: PresenceStatus::Online,
            room_id: String::new(),
            board_id: String::new(),
            cursor: Cursor::default(),
            viewport: Viewport::default(),
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["boardId", "roomId", "userId"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "boardId" => Some(self.board_id.clone()),
            "roomId" => Some(self.room_id.clone()),
            "userId" => Some(self.user_id.clone()),
            _ => None,
        }
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::Presence(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Presence(presence) => Some(presence),
            _ => None,
        }
    }
}
