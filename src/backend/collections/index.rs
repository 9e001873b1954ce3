//! Query Index
//!
//! In-memory secondary lookup for each collection: `(field, value) → set of
//! document ids`. The index is rebuilt from the store when a collection
//! initializes and is maintained on every committed mutation, so it is
//! always consistent with the authoritative document set: no stale entries
//! survive a delete, no missing entries survive a create or an update of an
//! indexed field.
//!
//! Updates that move a document between values of one field are per-field
//! atomic: remove under the old value, add under the new value, inside one
//! lock acquisition.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

type FieldMap = HashMap<String, HashSet<String>>;

/// Secondary index over one collection's documents; cheap to clone
#[derive(Clone)]
pub struct QueryIndex {
    fields: Arc<RwLock<HashMap<&'static str, FieldMap>>>,
}

impl QueryIndex {
    /// Create an index maintaining the given fields
    pub fn new(fields: &'static [&'static str]) -> Self {
        let map = fields.iter().map(|f| (*f, FieldMap::new())).collect();
        Self { fields: Arc::new(RwLock::new(map)) }
    }

    /// Whether lookups on this field are index-backed
    pub fn is_indexed(&self, field: &str) -> bool {
        self.fields.read().unwrap().contains_key(field)
    }

    /// Add `id` under `(field, value)`
    pub fn add_entry(&self, field: &str, value: &str, id: &str) {
        let mut fields = self.fields.write().unwrap();
        if let Some(field_map) = fields.get_mut(field) {
            field_map.entry(value.to_string()).or_default().insert(id.to_string());
        }
    }

    /// Remove `id` from under `(field, value)`
    pub fn remove_entry(&self, field: &str, value: &str, id: &str) {
        let mut fields = self.fields.write().unwrap();
        if let Some(field_map) = fields.get_mut(field) {
            if let Some(ids) = field_map.get_mut(value) {
                ids.remove(id);
                if ids.is_empty() {
                    field_map.remove(value);
                }
            }
        }
    }

    /// Move `id` from the old value to the new value of one field
    pub fn move_entry(&self, field: &str, old_value: &str, new_value: &str, id: &str) {
        if old_value == new_value {
            return;
        }
        let mut fields = self.fields.write().unwrap();
        if let Some(field_map) = fields.get_mut(field) {
            if let Some(ids) = field_map.get_mut(old_value) {
                ids.remove(id);
                if ids.is_empty() {
                    field_map.remove(old_value);
                }
            }
            field_map.entry(new_value.to_string()).or_default().insert(id.to_string());
        }
    }

    /// Ids currently filed under `(field, value)`
    pub fn lookup(&self, field: &str, value: &str) -> HashSet<String> {
        self.fields
            .read()
            .unwrap()
            .get(field)
            .and_then(|field_map| field_map.get(value))
            .cloned()
            .unwrap_or_default()
    }

    /// Drop every entry (used when a collection clears on start)
    pub fn clear(&self) {
        for field_map in self.fields.write().unwrap().values_mut() {
            field_map.clear();
        }
    }
}
