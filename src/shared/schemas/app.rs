//! App schema
//!
//! An app is one placed application instance on a board: a sticky note, a
//! code cell, a viewer, a screen share. The sync core treats the
//! app-specific `state` as an opaque JSON object owned by the application
//! layer; placement and typing are structural and typed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// Position of an app on the board canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Size of an app on the board canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self { width: 400.0, height: 400.0, depth: 0.0 }
    }
}

/// Rotation of an app on the board canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An application instance placed on a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSchema {
    /// Title shown in the window chrome
    pub title: String,
    /// Application type name, e.g. "Stickie" or "SageCell"
    #[serde(rename = "type")]
    pub app_type: String,
    /// Id of the board this app is placed on
    pub board_id: String,
    /// Id of the room owning that board
    pub room_id: String,
    pub position: Position,
    pub size: Size,
    pub rotation: Rotation,
    /// Raised apps render above their siblings
    pub raised: bool,
    /// Application-specific state, opaque to the sync core
    pub state: Value,
}

impl CollectionSchema for AppSchema {
    const KEY: CollectionKey = CollectionKey::Apps;

    fn template() -> Self {
        Self {
            title: String::new(),
            app_type: String::new(),
            board_id: String::new(),
            room_id: String::new(),
            position: Position::default(),
            size: Size::default(),
            rotation: Rotation::default(),
            raised: false,
            state: Value::Object(serde_json::Map::new()),
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["boardId", "roomId", "type"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "boardId" => Some(self.board_id.clone()),
            "roomId" => Some(self.room_id.clone()),
            "type" => Some(self.app_type.clone()),
            _ => None,
        }
    }

    fn room_scope(&self) -> Option<&str> {
        Some(&self.room_id)
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::App(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::App(app) => Some(app),
            _ => None,
        }
    }
}
