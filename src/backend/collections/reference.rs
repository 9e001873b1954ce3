//! Collection Reference
//!
//! `CollectionRef<T>` is the typed CRUD + query surface over one schema's
//! namespace in the document store. It owns the document lifecycle (ids,
//! timestamps, authorship), keeps the query index consistent with every
//! committed mutation, publishes change events on commit, and consults the
//! authorization gate *before* any write: a denied operation has no side
//! effects.
//!
//! # Ordering
//!
//! Mutations within one collection serialize on an internal write lock, so
//! for a single document the published UPDATE/DELETE events follow commit
//! order. There is no ordering guarantee across collections.
//!
//! # Conflicts
//!
//! Concurrent updates to the same document are not conflict-resolved: each
//! update shallow-merges over whatever the store holds when it acquires the
//! write lock, last write wins per field. An overlapped write is logged and
//! otherwise invisible.

use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend::auth::{Action, Actor, Authorization, Visibility};
use crate::backend::collections::index::QueryIndex;
use crate::backend::realtime::bus::{ChangeStream, CollectionBus};
use crate::backend::store::KvStore;
use crate::shared::document::{merge_typed, Document};
use crate::shared::error::SharedError;
use crate::shared::event::{ChangeEvent, ChangeKind};
use crate::shared::schemas::CollectionSchema;

/// Typed handle to one collection; cheap to clone, clones share state
pub struct CollectionRef<T: CollectionSchema> {
    prefix: String,
    store: KvStore,
    index: QueryIndex,
    bus: CollectionBus,
    ttl: Arc<RwLock<Option<Duration>>>,
    write_lock: Arc<Mutex<()>>,
    gate: Option<Arc<Authorization>>,
    _schema: PhantomData<fn() -> T>,
}

impl<T: CollectionSchema> Clone for CollectionRef<T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            store: self.store.clone(),
            index: self.index.clone(),
            bus: self.bus.clone(),
            ttl: self.ttl.clone(),
            write_lock: self.write_lock.clone(),
            gate: self.gate.clone(),
            _schema: PhantomData,
        }
    }
}

impl<T: CollectionSchema> CollectionRef<T> {
    /// Create the reference under `namespace` (`<ns>:DB:<COLLECTION>:<id>` keys)
    pub fn new(store: &KvStore, bus: &CollectionBus, namespace: &str) -> Self {
        Self {
            prefix: format!("{}:DB:{}:", namespace, T::KEY.as_str()),
            store: store.clone(),
            index: QueryIndex::new(T::indexed_fields()),
            bus: bus.clone(),
            ttl: Arc::new(RwLock::new(None)),
            write_lock: Arc::new(Mutex::new(())),
            gate: None,
            _schema: PhantomData,
        }
    }

    /// Collection name
    pub fn name(&self) -> &'static str {
        T::KEY.as_str()
    }

    /// Wire the authorization gate into this reference
    pub fn attach_gate(&mut self, gate: Arc<Authorization>) {
        self.gate = Some(gate);
    }

    /// A clone of this reference with no gate attached
    ///
    /// Used for the handles the gate itself holds, so permission checks do
    /// not recurse into further permission checks.
    pub fn ungated(&self) -> Self {
        let mut clone = self.clone();
        clone.gate = None;
        clone
    }

    fn key_for(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    fn ttl(&self) -> Option<Duration> {
        *self.ttl.read().unwrap()
    }

    fn parse_doc(&self, raw: &str) -> Result<Document<T>, SharedError> {
        serde_json::from_str(raw).map_err(|e| {
            SharedError::serialization(format!("corrupt {} document: {}", self.name(), e))
        })
    }

    fn index_doc(&self, doc: &Document<T>) {
        for field in T::indexed_fields() {
            if let Some(value) = doc.data.index_value(field) {
                self.index.add_entry(field, &value, &doc.id);
            }
        }
    }

    fn deindex_doc(&self, doc: &Document<T>) {
        for field in T::indexed_fields() {
            if let Some(value) = doc.data.index_value(field) {
                self.index.remove_entry(field, &value, &doc.id);
            }
        }
    }

    fn as_payload(doc: &Document<T>) -> Document<crate::shared::schemas::DocumentPayload> {
        doc.clone().map_data(|data| data.into_payload())
    }

    fn publish(&self, kind: ChangeKind, doc: &Document<T>) {
        self.bus
            .publish(ChangeEvent::single(kind, T::KEY, Self::as_payload(doc)));
    }

    async fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        room_scope: Option<&str>,
        resource_id: Option<&str>,
    ) -> Result<(), SharedError> {
        if let Some(gate) = &self.gate {
            if !gate.check(actor, action, T::KEY, room_scope, resource_id).await? {
                return Err(SharedError::forbidden(action.as_str(), self.name()));
            }
        }
        Ok(())
    }

    /// Establish start-of-life state: optionally wipe the namespace, set the
    /// TTL policy for future writes, and rebuild the query index from the
    /// store's current contents.
    pub async fn initialize(
        &self,
        clear_on_start: bool,
        ttl: Option<Duration>,
    ) -> Result<(), SharedError> {
        if clear_on_start {
            let removed = self.store.clear_prefix(&self.prefix).await?;
            if removed > 0 {
                tracing::info!("[{}] cleared {} documents on start", self.name(), removed);
            }
        }
        *self.ttl.write().unwrap() = ttl;

        self.index.clear();
        let mut count = 0usize;
        for (_, raw) in self.store.get_prefix(&self.prefix).await? {
            match self.parse_doc(&raw) {
                Ok(doc) => {
                    self.index_doc(&doc);
                    count += 1;
                }
                Err(e) => tracing::warn!("[{}] skipping corrupt row: {}", self.name(), e),
            }
        }
        tracing::info!("[{}] initialized, {} documents indexed", self.name(), count);
        Ok(())
    }

    /// Create a document from a partial payload merged over the template
    pub async fn add(&self, partial: Value, actor: &Actor) -> Result<Document<T>, SharedError> {
        self.add_inner(None, partial, actor).await
    }

    /// Create a document with a caller-chosen id
    ///
    /// Replaces any previous document under the id; Presence uses this with
    /// the user id so each user has at most one presence record.
    pub async fn add_with_id(
        &self,
        id: &str,
        partial: Value,
        actor: &Actor,
    ) -> Result<Document<T>, SharedError> {
        self.add_inner(Some(id.to_string()), partial, actor).await
    }

    async fn add_inner(
        &self,
        id: Option<String>,
        partial: Value,
        actor: &Actor,
    ) -> Result<Document<T>, SharedError> {
        let data = merge_typed(&T::template(), &partial)?;
        self.authorize(actor, Action::Create, data.room_scope(), id.as_deref())
            .await?;

        let _guard = self.write_lock.lock().await;
        let doc = match id {
            Some(id) => Document::with_id(id, &actor.id, data),
            None => Document::new(&actor.id, data),
        };
        // A caller-chosen id may replace an earlier document; drop its index
        // entries first so none go stale.
        if let Some(raw) = self.store.get(&self.key_for(&doc.id)).await? {
            if let Ok(previous) = self.parse_doc(&raw) {
                self.deindex_doc(&previous);
            }
        }

        let raw = serde_json::to_string(&doc)?;
        self.store.set(&self.key_for(&doc.id), &raw, self.ttl()).await?;
        self.index_doc(&doc);
        self.publish(ChangeKind::Create, &doc);
        Ok(doc)
    }

    /// Read one document; absent and expired read as `None`
    pub async fn get(&self, id: &str) -> Result<Option<Document<T>>, SharedError> {
        match self.store.get(&self.key_for(id)).await? {
            Some(raw) => Ok(Some(self.parse_doc(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read one document, applying the caller's visibility rule
    pub async fn get_visible(
        &self,
        id: &str,
        actor: &Actor,
    ) -> Result<Option<Document<T>>, SharedError> {
        self.authorize(actor, Action::Read, None, Some(id)).await?;
        let doc = match self.get(id).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        if let Some(gate) = &self.gate {
            match gate.visibility(actor, T::KEY).await? {
                Visibility::All => {}
                Visibility::RoomMembership(rooms) => {
                    if let Some(room) = doc.data.room_scope() {
                        if !rooms.contains(room) {
                            return Ok(None);
                        }
                    }
                }
            }
        }
        Ok(Some(doc))
    }

    /// Read every document, filtered by the caller's visibility rule
    pub async fn get_all(&self, actor: &Actor) -> Result<Vec<Document<T>>, SharedError> {
        self.authorize(actor, Action::Read, None, None).await?;
        let mut docs = Vec::new();
        for (_, raw) in self.store.get_prefix(&self.prefix).await? {
            match self.parse_doc(&raw) {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!("[{}] skipping corrupt row: {}", self.name(), e),
            }
        }
        if let Some(gate) = &self.gate {
            if let Visibility::RoomMembership(rooms) = gate.visibility(actor, T::KEY).await? {
                docs.retain(|doc| match doc.data.room_scope() {
                    Some(room) => rooms.contains(room),
                    None => true,
                });
            }
        }
        Ok(docs)
    }

    /// Documents whose `field` equals `value`
    ///
    /// Index-backed for declared fields; otherwise falls back to a full
    /// namespace scan (a latency tradeoff, not an error).
    pub async fn query(&self, field: &str, value: &str) -> Result<Vec<Document<T>>, SharedError> {
        if self.index.is_indexed(field) {
            let mut ids: Vec<String> = self.index.lookup(field, value).into_iter().collect();
            ids.sort();
            let mut docs = Vec::with_capacity(ids.len());
            for id in ids {
                // The store may have expired the row between index and read
                if let Some(doc) = self.get(&id).await? {
                    docs.push(doc);
                }
            }
            return Ok(docs);
        }

        tracing::debug!("[{}] unindexed query on '{}', full scan", self.name(), field);
        let mut docs = Vec::new();
        for (_, raw) in self.store.get_prefix(&self.prefix).await? {
            let doc = match self.parse_doc(&raw) {
                Ok(doc) => doc,
                Err(_) => continue,
            };
            let data = serde_json::to_value(&doc.data)?;
            let matches = match data.get(field) {
                Some(Value::String(s)) => s == value,
                Some(other) => other.to_string() == value,
                None => false,
            };
            if matches {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// `query` with the caller's visibility rule applied
    pub async fn query_visible(
        &self,
        field: &str,
        value: &str,
        actor: &Actor,
    ) -> Result<Vec<Document<T>>, SharedError> {
        self.authorize(actor, Action::Read, None, None).await?;
        let mut docs = self.query(field, value).await?;
        if let Some(gate) = &self.gate {
            if let Visibility::RoomMembership(rooms) = gate.visibility(actor, T::KEY).await? {
                docs.retain(|doc| match doc.data.room_scope() {
                    Some(room) => rooms.contains(room),
                    None => true,
                });
            }
        }
        Ok(docs)
    }

    /// Merge a partial payload over a document
    ///
    /// Bumps `_updatedAt`/`_updatedBy`, re-indexes changed fields, refreshes
    /// the TTL window, and publishes UPDATE. `NotFound` when the id does not
    /// exist (including a TTL expiry racing this call).
    pub async fn update(
        &self,
        id: &str,
        patch: Value,
        actor: &Actor,
    ) -> Result<Document<T>, SharedError> {
        let seen = self
            .get(id)
            .await?
            .ok_or_else(|| SharedError::not_found(self.name(), id))?;
        self.authorize(actor, Action::Update, seen.data.room_scope(), Some(id))
            .await?;

        let _guard = self.write_lock.lock().await;
        let mut doc = self
            .get(id)
            .await?
            .ok_or_else(|| SharedError::not_found(self.name(), id))?;
        if doc.updated_at != seen.updated_at {
            // Another writer committed between our read and the lock; the
            // merge below applies over their result, last write wins.
            tracing::debug!("[{}] conflict ignored on {}: overlapped write", self.name(), id);
        }

        let old_data = doc.data.clone();
        doc.data = merge_typed(&doc.data, &patch)?;
        doc.touch(&actor.id);

        let raw = serde_json::to_string(&doc)?;
        self.store.set(&self.key_for(id), &raw, self.ttl()).await?;

        for field in T::indexed_fields() {
            let old_value = old_data.index_value(field);
            let new_value = doc.data.index_value(field);
            match (old_value, new_value) {
                (Some(old), Some(new)) => self.index.move_entry(field, &old, &new, id),
                (Some(old), None) => self.index.remove_entry(field, &old, id),
                (None, Some(new)) => self.index.add_entry(field, &new, id),
                (None, None) => {}
            }
        }

        self.publish(ChangeKind::Update, &doc);
        Ok(doc)
    }

    /// Delete a document; `NotFound` when the id does not exist
    pub async fn delete(&self, id: &str, actor: &Actor) -> Result<(), SharedError> {
        let seen = self
            .get(id)
            .await?
            .ok_or_else(|| SharedError::not_found(self.name(), id))?;
        self.authorize(actor, Action::Delete, seen.data.room_scope(), Some(id))
            .await?;

        let _guard = self.write_lock.lock().await;
        let doc = self
            .get(id)
            .await?
            .ok_or_else(|| SharedError::not_found(self.name(), id))?;
        self.store.delete(&self.key_for(id)).await?;
        self.deindex_doc(&doc);
        self.publish(ChangeKind::Delete, &doc);
        Ok(())
    }

    /// Subscribe to every CREATE/UPDATE/DELETE in this collection
    ///
    /// Only mutations committed after the subscription exists are delivered;
    /// fetch current state separately before relying on the stream. Dropping
    /// the stream unsubscribes.
    pub async fn subscribe_all(&self, actor: &Actor) -> Result<ChangeStream, SharedError> {
        self.authorize(actor, Action::Sub, None, None).await?;
        Ok(self.bus.subscribe(T::KEY))
    }

    /// Subscribe to one document's changes
    pub fn subscribe_to_document(&self, id: &str) -> ChangeStream {
        self.bus.subscribe_document(T::KEY, id)
    }

    /// Physically remove expired documents, de-index them and publish their
    /// DELETE events. Run periodically for TTL-bearing collections.
    pub async fn sweep_expired(&self) -> Result<usize, SharedError> {
        let _guard = self.write_lock.lock().await;
        let expired = self.store.delete_expired(&self.prefix).await?;
        let count = expired.len();
        for (_, raw) in expired {
            match self.parse_doc(&raw) {
                Ok(doc) => {
                    self.deindex_doc(&doc);
                    self.publish(ChangeKind::Delete, &doc);
                }
                Err(e) => tracing::warn!("[{}] expired corrupt row: {}", self.name(), e),
            }
        }
        if count > 0 {
            tracing::debug!("[{}] swept {} expired documents", self.name(), count);
        }
        Ok(count)
    }
}
