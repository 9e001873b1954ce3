//! Change-Notification Bus
//!
//! One `tokio::sync::broadcast` channel per collection. Collection
//! references publish committed mutations here; server-side listeners and
//! the WebSocket fan-out subscribe.
//!
//! Publishing is non-blocking: subscribers that fall behind the bounded
//! buffer observe a lag (skipped events are logged, never re-ordered), and
//! publishing with no subscribers is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::shared::event::ChangeEvent;
use crate::shared::schemas::CollectionKey;

/// Broadcast channels for every collection; cheap to clone
#[derive(Clone)]
pub struct CollectionBus {
    senders: Arc<HashMap<CollectionKey, broadcast::Sender<ChangeEvent>>>,
}

impl CollectionBus {
    /// Create the bus with the given per-collection buffer capacity
    pub fn new(capacity: usize) -> Self {
        let senders = CollectionKey::ALL
            .into_iter()
            .map(|key| (key, broadcast::channel(capacity).0))
            .collect();
        Self { senders: Arc::new(senders) }
    }

    fn sender(&self, key: CollectionKey) -> &broadcast::Sender<ChangeEvent> {
        // The map is total over CollectionKey::ALL
        &self.senders[&key]
    }

    /// Publish an event to every current subscriber of its collection
    ///
    /// Returns the number of subscribers that received it (0 when nobody is
    /// listening, which is not an error).
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let collection = event.collection;
        match self.sender(collection).send(event) {
            Ok(count) => count,
            Err(_) => {
                tracing::debug!("[Bus] no subscribers on {}", collection);
                0
            }
        }
    }

    /// Raw receiver for a collection's channel
    pub fn subscribe_raw(&self, key: CollectionKey) -> broadcast::Receiver<ChangeEvent> {
        self.sender(key).subscribe()
    }

    /// Subscribe to every change in a collection
    pub fn subscribe(&self, key: CollectionKey) -> ChangeStream {
        ChangeStream { rx: self.subscribe_raw(key), doc_id: None }
    }

    /// Subscribe to changes of a single document
    pub fn subscribe_document(&self, key: CollectionKey, doc_id: impl Into<String>) -> ChangeStream {
        ChangeStream { rx: self.subscribe_raw(key), doc_id: Some(doc_id.into()) }
    }

    /// Number of current subscribers on a collection (for diagnostics)
    pub fn subscriber_count(&self, key: CollectionKey) -> usize {
        self.sender(key).receiver_count()
    }
}

/// A live subscription to a collection (or one document within it)
///
/// Only events published while the stream exists are delivered; there is no
/// replay of earlier mutations. Dropping the stream unsubscribes it and no
/// further events are received.
pub struct ChangeStream {
    rx: broadcast::Receiver<ChangeEvent>,
    doc_id: Option<String>,
}

impl ChangeStream {
    /// Receive the next matching event
    ///
    /// Returns `None` once the bus shuts down. A lagged consumer skips the
    /// overwritten events (logged) and continues with the newest ones.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(doc_id) = &self.doc_id {
                        if !event.touches(doc_id) {
                            continue;
                        }
                    }
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Bus] subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive for callers that poll
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(doc_id) = &self.doc_id {
                        if !event.touches(doc_id) {
                            continue;
                        }
                    }
                    return Some(event);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("[Bus] subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}
