//! Plugin schema

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// A registered plugin application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSchema {
    /// Unique plugin name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Id of the publishing user
    pub owner_id: String,
    /// Display name of the publishing user
    pub owner_name: String,
    /// Publish time, epoch milliseconds
    pub date_created: i64,
}

impl CollectionSchema for PluginSchema {
    const KEY: CollectionKey = CollectionKey::Plugins;

    fn template() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            owner_id: String::new(),
            owner_name: String::new(),
            date_created: 0,
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["name", "ownerId"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "name" => Some(self.name.clone()),
            "ownerId" => Some(self.owner_id.clone()),
            _ => None,
        }
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::Plugin(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::Plugin(plugin) => Some(plugin),
            _ => None,
        }
    }
}
