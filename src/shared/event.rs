//! Change Events and Socket Protocol
//!
//! Every committed mutation is published as a [`ChangeEvent`] on the
//! collection's broadcast channel and fanned out to subscribed clients over
//! the WebSocket channel.
//!
//! # Delivery Contract
//!
//! - At-least-once to every listener registered at publish time
//! - No replay: a listener registered after a publish never sees it
//! - Per-document ordering follows commit order; there is no cross-document
//!   ordering guarantee
//!
//! # Socket Protocol
//!
//! Clients drive subscriptions over one persistent WebSocket:
//!
//! ```text
//! -> {"method":"SUB",   "id":"sub-1", "route":"/api/boards"}
//! -> {"method":"SUB",   "id":"sub-2", "route":"/api/apps/<docId>"}
//! <- {"id":"sub-1", "event":{"type":"CREATE","collection":"BOARDS","doc":[...]}}
//! -> {"method":"UNSUB", "id":"sub-1"}
//! ```
//!
//! A route addresses either a whole collection or a single document.

use serde::{Deserialize, Serialize};

use crate::shared::document::Document;
use crate::shared::schemas::{CollectionKey, DocumentPayload};

/// The kind of committed mutation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// A committed mutation, as published to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Mutation kind
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Collection the mutation happened in
    pub collection: CollectionKey,
    /// The affected documents, post-mutation (pre-delete for DELETE)
    pub doc: Vec<Document<DocumentPayload>>,
}

impl ChangeEvent {
    /// Create an event for a batch of documents
    pub fn new(
        kind: ChangeKind,
        collection: CollectionKey,
        doc: Vec<Document<DocumentPayload>>,
    ) -> Self {
        Self { kind, collection, doc }
    }

    /// Create an event for a single document
    pub fn single(
        kind: ChangeKind,
        collection: CollectionKey,
        doc: Document<DocumentPayload>,
    ) -> Self {
        Self::new(kind, collection, vec![doc])
    }

    /// Whether the event touches the given document id
    pub fn touches(&self, doc_id: &str) -> bool {
        self.doc.iter().any(|d| d.id == doc_id)
    }
}

/// A client-to-server request on the subscription socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SocketRequest {
    /// Open a subscription addressed by route
    #[serde(rename = "SUB")]
    Subscribe {
        /// Client-chosen subscription id, echoed on every delivery
        id: String,
        /// `/api/<collection>` or `/api/<collection>/<docId>`
        route: String,
    },
    /// Close a previously opened subscription
    #[serde(rename = "UNSUB")]
    Unsubscribe {
        /// The subscription id to close
        id: String,
    },
}

/// A server-to-client delivery on the subscription socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketReply {
    /// The subscription this event belongs to
    pub id: String,
    pub event: ChangeEvent,
}

/// A parsed subscription route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeTarget {
    pub collection: CollectionKey,
    /// `Some` when the route addresses a single document
    pub doc_id: Option<String>,
}

impl SubscribeTarget {
    /// Parse `/api/<collection>[/<docId>]`
    pub fn parse(route: &str) -> Option<Self> {
        let rest = route.strip_prefix("/api/")?;
        let mut parts = rest.split('/').filter(|s| !s.is_empty());
        let collection = CollectionKey::from_route(parts.next()?)?;
        let doc_id = parts.next().map(|s| s.to_string());
        if parts.next().is_some() {
            return None;
        }
        Some(Self { collection, doc_id })
    }

    /// Render back to the route form
    pub fn route(&self) -> String {
        match &self.doc_id {
            Some(id) => format!("/api/{}/{}", self.collection.route(), id),
            None => format!("/api/{}", self.collection.route()),
        }
    }
}
