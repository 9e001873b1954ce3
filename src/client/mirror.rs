//! Collection Mirror
//!
//! A per-collection in-memory cache kept consistent with the server:
//!
//! 1. `subscribe()` fetches the current snapshot over HTTP, then opens the
//!    socket subscription and applies every incoming change event.
//! 2. `create`/`update`/`delete` proxy to the server; the server's response
//!    is applied locally at once, and the echoed change event re-applies
//!    idempotently, so both paths converge to the same state.
//!
//! The cache is a live, externally mutated source: events land from a
//! background task at any time, so consumers must not assume it is stable
//! across an `await`. Per-document the cache eventually equals the
//! authoritative store; there is no cross-document snapshot isolation.
//!
//! Failures land in the `error` field for display (no auto-retry);
//! `clear_error` resets it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::client::http::ApiClient;
use crate::client::socket::SocketClient;
use crate::shared::document::Document;
use crate::shared::error::SharedError;
use crate::shared::event::{ChangeEvent, ChangeKind};
use crate::shared::schemas::CollectionSchema;

type Cache<T> = Arc<RwLock<HashMap<String, Document<T>>>>;

/// Client-side cache of one collection
pub struct CollectionMirror<T: CollectionSchema> {
    api: ApiClient,
    socket: SocketClient,
    cache: Cache<T>,
    error: Arc<RwLock<Option<SharedError>>>,
    subscription: Option<(String, JoinHandle<()>)>,
}

impl<T: CollectionSchema> CollectionMirror<T> {
    pub fn new(api: ApiClient, socket: SocketClient) -> Self {
        Self {
            api,
            socket,
            cache: Arc::new(RwLock::new(HashMap::new())),
            error: Arc::new(RwLock::new(None)),
            subscription: None,
        }
    }

    fn set_error(&self, err: &SharedError) {
        *self.error.write().unwrap() = Some(err.clone());
    }

    /// The last failed operation's error, if any
    pub fn error(&self) -> Option<SharedError> {
        self.error.read().unwrap().clone()
    }

    /// Reset the error surface
    pub fn clear_error(&self) {
        *self.error.write().unwrap() = None;
    }

    /// Apply one change event to a cache
    fn apply(cache: &Cache<T>, event: ChangeEvent) {
        if event.collection != T::KEY {
            return;
        }
        let mut cache = cache.write().unwrap();
        for doc in event.doc {
            match event.kind {
                ChangeKind::Create | ChangeKind::Update => {
                    if let Some(data) = T::from_payload(doc.data.clone()) {
                        cache.insert(doc.id.clone(), doc.map_data(|_| data));
                    }
                }
                ChangeKind::Delete => {
                    cache.remove(&doc.id);
                }
            }
        }
    }

    /// Fetch the snapshot, then follow the change stream
    ///
    /// The snapshot comes first: events only describe mutations committed
    /// after the subscription exists, never earlier ones.
    pub async fn subscribe(&mut self) -> Result<(), SharedError> {
        if self.subscription.is_some() {
            return Ok(());
        }

        let (id, mut rx) = self.socket.subscribe(format!("/api/{}", T::KEY.route()));
        let docs = match self.api.get_all::<T>().await {
            Ok(docs) => docs,
            Err(e) => {
                self.socket.unsubscribe(&id);
                self.set_error(&e);
                return Err(e);
            }
        };
        {
            let mut cache = self.cache.write().unwrap();
            cache.clear();
            for doc in docs {
                cache.insert(doc.id.clone(), doc);
            }
        }

        let cache = self.cache.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::apply(&cache, event);
            }
        });
        self.subscription = Some((id, handle));
        Ok(())
    }

    /// Stop following changes; the cache keeps its last state
    pub fn unsubscribe(&mut self) {
        if let Some((id, handle)) = self.subscription.take() {
            self.socket.unsubscribe(&id);
            handle.abort();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Local copy of one document
    pub fn get(&self, id: &str) -> Option<Document<T>> {
        self.cache.read().unwrap().get(id).cloned()
    }

    /// Local copies of every document, oldest first
    pub fn list(&self) -> Vec<Document<T>> {
        let mut docs: Vec<_> = self.cache.read().unwrap().values().cloned().collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        docs
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().unwrap().is_empty()
    }

    /// Create on the server and apply the result locally
    pub async fn create(&self, partial: Value) -> Result<Document<T>, SharedError> {
        match self.api.create::<T>(partial).await {
            Ok(doc) => {
                self.cache.write().unwrap().insert(doc.id.clone(), doc.clone());
                Ok(doc)
            }
            Err(e) => {
                self.set_error(&e);
                Err(e)
            }
        }
    }

    /// Update on the server and apply the result locally
    pub async fn update(&self, id: &str, patch: Value) -> Result<Document<T>, SharedError> {
        match self.api.update::<T>(id, patch).await {
            Ok(doc) => {
                self.cache.write().unwrap().insert(doc.id.clone(), doc.clone());
                Ok(doc)
            }
            Err(e) => {
                self.set_error(&e);
                Err(e)
            }
        }
    }

    /// Delete on the server and drop the local copy
    pub async fn delete(&self, id: &str) -> Result<(), SharedError> {
        match self.api.delete::<T>(id).await {
            Ok(()) => {
                self.cache.write().unwrap().remove(id);
                Ok(())
            }
            Err(e) => {
                self.set_error(&e);
                Err(e)
            }
        }
    }
}

impl<T: CollectionSchema> Drop for CollectionMirror<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
