//! Asset schema
//!
//! Metadata for an uploaded file. Blob storage itself is an external
//! collaborator; the sync core only tracks the descriptive record.

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// Metadata record for an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSchema {
    /// Storage filename (server-assigned)
    pub file: String,
    /// Name the file was uploaded with
    pub original_name: String,
    /// Id of the uploading user
    pub owner_id: String,
    /// Room the asset belongs to
    pub room_id: String,
    /// MIME type
    pub mimetype: String,
    /// Size in bytes
    pub size: i64,
    /// Upload time, epoch milliseconds
    pub date_added: i64,
}

impl CollectionSchema for AssetSchema {
    const KEY: CollectionKey = CollectionKey::Assets;

    fn template() -> Self {
        Self {
            file: String::new(),
            original_name: String::new(),
            owner_id: String::new(),
            room_id: String::new(),
            mimetype: "application/octet-stream".to_string(),
            size: 0,
            date_added: 0,
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
        DocumentPayload::Asset(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Asset(asset) => Some(asset),
            _ => None,
        }
    }
}
