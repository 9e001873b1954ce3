//! Collection Schemas
//!
//! One statically typed schema per collection, plus the machinery that ties
//! them together:
//!
//! - [`CollectionKey`] - the closed set of collection names
//! - [`CollectionSchema`] - per-schema metadata (template value, indexed
//!   fields, room scope) used by the collection references
//! - [`DocumentPayload`] - a tagged union over every schema, keyed by
//!   collection name; this is the wire representation of a document payload
//!   on the change-notification channel
//!
//! Payloads are validated at the store boundary by serde: a write that does
//! not deserialize into the collection's schema is rejected with a
//! validation error before anything is persisted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod app;
mod asset;
mod board;
mod message;
mod plugin;
mod presence;
mod room;
mod room_members;
mod user;

pub use app::{AppSchema, Position, Rotation, Size};
pub use asset::AssetSchema;
pub use board::BoardSchema;
pub use message::MessageSchema;
pub use plugin::PluginSchema;
pub use presence::{Cursor, PresenceSchema, PresenceStatus, Viewport};
pub use room::RoomSchema;
pub use room_members::{RoomMember, RoomMembersSchema, RoomRole};
pub use user::{UserRole, UserSchema, UserType};

/// The closed set of collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKey {
    #[serde(rename = "APPS")]
    Apps,
    #[serde(rename = "BOARDS")]
    Boards,
    #[serde(rename = "ROOMS")]
    Rooms,
    #[serde(rename = "USERS")]
    Users,
    #[serde(rename = "PRESENCE")]
    Presence,
    #[serde(rename = "MESSAGES")]
    Messages,
    #[serde(rename = "ASSETS")]
    Assets,
    #[serde(rename = "PLUGINS")]
    Plugins,
    #[serde(rename = "ROOM_MEMBERS")]
    RoomMembers,
}

impl CollectionKey {
    /// Every collection, in initialization order
    pub const ALL: [CollectionKey; 9] = [
        CollectionKey::Apps,
        CollectionKey::Boards,
        CollectionKey::Rooms,
        CollectionKey::Users,
        CollectionKey::Presence,
        CollectionKey::Messages,
        CollectionKey::Assets,
        CollectionKey::Plugins,
        CollectionKey::RoomMembers,
    ];

    /// Store namespace segment for this collection
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKey::Apps => "APPS",
            CollectionKey::Boards => "BOARDS",
            CollectionKey::Rooms => "ROOMS",
            CollectionKey::Users => "USERS",
            CollectionKey::Presence => "PRESENCE",
            CollectionKey::Messages => "MESSAGES",
            CollectionKey::Assets => "ASSETS",
            CollectionKey::Plugins => "PLUGINS",
            CollectionKey::RoomMembers => "ROOM_MEMBERS",
        }
    }

    /// URL path segment under `/api/`
    pub fn route(&self) -> &'static str {
        match self {
            CollectionKey::Apps => "apps",
            CollectionKey::Boards => "boards",
            CollectionKey::Rooms => "rooms",
            CollectionKey::Users => "users",
            CollectionKey::Presence => "presence",
            CollectionKey::Messages => "messages",
            CollectionKey::Assets => "assets",
            CollectionKey::Plugins => "plugins",
            CollectionKey::RoomMembers => "roommembers",
        }
    }

    /// Resolve a URL path segment back to a collection key
    pub fn from_route(segment: &str) -> Option<Self> {
        CollectionKey::ALL.into_iter().find(|k| k.route() == segment)
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-collection schema metadata
///
/// Implemented by every schema struct. The template value backs partial
/// creates: the caller's fields are merged over `template()` and the result
/// must satisfy the schema.
pub trait CollectionSchema:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The collection this schema belongs to
    const KEY: CollectionKey;

    /// Default value merged under partial creates
    fn template() -> Self;

    /// Wire names of the fields maintained in the query index
    fn indexed_fields() -> &'static [&'static str] {
        &[]
    }

    /// Index key for one of the indexed fields
    fn index_value(&self, field: &str) -> Option<String> {
        let _ = field;
        None
    }

    /// Id of the room this document is scoped to, if room-scoped
    fn room_scope(&self) -> Option<&str> {
        None
    }

    /// Wrap into the tagged payload union
    fn into_payload(self) -> DocumentPayload;

    /// Unwrap from the tagged payload union; `None` on collection mismatch
    fn from_payload(payload: DocumentPayload) -> Option<Self>;
}

/// A document payload tagged by its collection
///
/// Serialized form carries a `"collection"` tag next to the schema fields,
/// so a payload is self-describing on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection")]
pub enum DocumentPayload {
    #[serde(rename = "APPS")]
    App(AppSchema),
    #[serde(rename = "BOARDS")]
    Board(BoardSchema),
    #[serde(rename = "ROOMS")]
    Room(RoomSchema),
    #[serde(rename = "USERS")]
    User(UserSchema),
    #[serde(rename = "PRESENCE")]
    Presence(PresenceSchema),
    #[serde(rename = "MESSAGES")]
    Message(MessageSchema),
    #[serde(rename = "ASSETS")]
    Asset(AssetSchema),
    #[serde(rename = "PLUGINS")]
    Plugin(PluginSchema),
    #[serde(rename = "ROOM_MEMBERS")]
    RoomMembers(RoomMembersSchema),
}

impl DocumentPayload {
    /// The collection this payload belongs to
    pub fn key(&self) -> CollectionKey {
        match self {
            DocumentPayload::App(_) => CollectionKey::Apps,
            DocumentPayload::Board(_) => CollectionKey::Boards,
            DocumentPayload::Room(_) => CollectionKey::Rooms,
            DocumentPayload::User(_) => CollectionKey::Users,
            DocumentPayload::Presence(_) => CollectionKey::Presence,
            DocumentPayload::Message(_) => CollectionKey::Messages,
            DocumentPayload::Asset(_) => CollectionKey::Assets,
            DocumentPayload::Plugin(_) => CollectionKey::Plugins,
            DocumentPayload::RoomMembers(_) => CollectionKey::RoomMembers,
        }
    }
}
