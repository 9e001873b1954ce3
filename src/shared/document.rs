//! Document Envelope
//!
//! Every stored record is wrapped in a [`Document`] envelope carrying the
//! generated id, creation/update timestamps (epoch milliseconds) and the
//! identity of the writers. The `data` payload is the collection-specific
//! schema type.
//!
//! # Invariants
//!
//! - `_id` is assigned once at creation and never changes; ids are UUID v4
//!   and are never reused after a delete.
//! - `_updatedAt` is non-decreasing across updates of the same document.
//!
//! # Merge Semantics
//!
//! Partial writes are shallow field merges: [`merge_data`] replaces the
//! top-level fields named by the patch and leaves every other field alone.
//! Concurrent writers therefore commute when they touch disjoint fields and
//! race last-write-wins when they overlap. All write paths funnel through
//! this one function, so a different conflict policy can be swapped in here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::SharedError;

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A stored record: id, timestamps, authorship, and a typed payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document<T> {
    /// Globally unique id, immutable for the document's lifetime
    #[serde(rename = "_id")]
    pub id: String,
    /// Creation time, epoch milliseconds
    #[serde(rename = "_createdAt")]
    pub created_at: i64,
    /// Last update time, epoch milliseconds; non-decreasing
    #[serde(rename = "_updatedAt")]
    pub updated_at: i64,
    /// Identity of the creator
    #[serde(rename = "_createdBy")]
    pub created_by: String,
    /// Identity of the last writer
    #[serde(rename = "_updatedBy")]
    pub updated_by: String,
    /// Collection-specific payload
    pub data: T,
}

impl<T> Document<T> {
    /// Create a fresh document with a generated id and current timestamps
    pub fn new(author: impl Into<String>, data: T) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), author, data)
    }

    /// Create a fresh document with a caller-chosen id
    ///
    /// Used where the document id is externally meaningful, e.g. Presence
    /// documents whose id is the user id.
    pub fn with_id(id: impl Into<String>, author: impl Into<String>, data: T) -> Self {
        let author = author.into();
        let now = now_millis();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            created_by: author.clone(),
            updated_by: author,
            data,
        }
    }

    /// Replace the payload, keeping envelope fields
    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Document<U> {
        Document {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
            updated_by: self.updated_by,
            data: f(self.data),
        }
    }

    /// Bump the update stamp for a new write by `author`
    ///
    /// The stamp never goes backwards, even if the wall clock does.
    pub fn touch(&mut self, author: impl Into<String>) {
        self.updated_at = now_millis().max(self.updated_at);
        self.updated_by = author.into();
    }
}

/// Shallow-merge `patch` over `base`, replacing top-level fields
///
/// Non-object patches replace `base` wholesale; this does not occur for
/// schema payloads, which always serialize to objects.
pub fn merge_data(base: Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                base_map.insert(key.clone(), value.clone());
            }
            Value::Object(base_map)
        }
        (_, patch) => patch.clone(),
    }
}

/// Merge a partial patch over a typed payload and re-validate the result
///
/// Fails with `Validation` when the merged value no longer satisfies the
/// schema (wrong type, unknown shape, missing required field).
pub fn merge_typed<T>(current: &T, patch: &Value) -> Result<T, SharedError>
where
    T: Serialize + DeserializeOwned,
{
    if !patch.is_object() {
        return Err(SharedError::validation("data", "patch must be a JSON object"));
    }
    let base = serde_json::to_value(current)?;
    let merged = merge_data(base, patch);
    serde_json::from_value(merged)
        .map_err(|e| SharedError::validation("data", format!("schema mismatch: {}", e)))
}
