//! Collections
//!
//! The typed collection references, wired together as one explicitly
//! constructed service (no module-level singletons):
//!
//! 1. `Collections::new` builds a reference per collection over the store
//!    and bus.
//! 2. `initialize_all` establishes start-of-life state: ephemeral
//!    collections (Presence, Messages) are cleared and given their TTL,
//!    query indexes are rebuilt from the store.
//! 3. The authorization gate is constructed from ungated Users/RoomMembers
//!    handles and attached to every reference.
//! 4. `seed_defaults` guarantees a default room/board on an empty store and
//!    exactly one membership roster per room.
//!
//! Cascade deletes (Room → Boards → Apps, plus assets and the roster) are
//! explicit service logic here, not store behavior: the parent delete runs
//! under the caller's identity, the dependent deletes under the server's.

pub mod index;
pub mod reference;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::backend::auth::{Actor, AuthPolicy, Authorization};
use crate::backend::realtime::bus::CollectionBus;
use crate::backend::store::KvStore;
use crate::shared::error::SharedError;
use crate::shared::schemas::{
    AppSchema, AssetSchema, BoardSchema, CollectionSchema, MessageSchema, PluginSchema,
    PresenceSchema, RoomMembersSchema, RoomRole, RoomSchema, UserSchema,
};

pub use reference::CollectionRef;

/// A schema that knows its reference inside [`Collections`]
///
/// Lets the HTTP layer write one generic handler per CRUD verb.
pub trait Registered: CollectionSchema {
    fn of(collections: &Collections) -> &CollectionRef<Self>;
}

macro_rules! register {
    ($schema:ty, $field:ident) => {
        impl Registered for $schema {
            fn of(collections: &Collections) -> &CollectionRef<Self> {
                &collections.$field
            }
        }
    };
}

register!(AppSchema, apps);
register!(BoardSchema, boards);
register!(RoomSchema, rooms);
register!(UserSchema, users);
register!(PresenceSchema, presence);
register!(MessageSchema, messages);
register!(AssetSchema, assets);
register!(PluginSchema, plugins);
register!(RoomMembersSchema, room_members);

/// Every collection reference, as one service
#[derive(Clone)]
pub struct Collections {
    pub apps: CollectionRef<AppSchema>,
    pub boards: CollectionRef<BoardSchema>,
    pub rooms: CollectionRef<RoomSchema>,
    pub users: CollectionRef<UserSchema>,
    pub presence: CollectionRef<PresenceSchema>,
    pub messages: CollectionRef<MessageSchema>,
    pub assets: CollectionRef<AssetSchema>,
    pub plugins: CollectionRef<PluginSchema>,
    pub room_members: CollectionRef<RoomMembersSchema>,
}

/// TTL configuration for the ephemeral collections
#[derive(Debug, Clone, Copy)]
pub struct TtlConfig {
    pub presence: Duration,
    pub messages: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            presence: Duration::from_secs(60),
            messages: Duration::from_secs(60),
        }
    }
}

impl Collections {
    /// Build the references; call `initialize_all` before use
    pub fn new(store: &KvStore, bus: &CollectionBus, namespace: &str) -> Self {
        Self {
            apps: CollectionRef::new(store, bus, namespace),
            boards: CollectionRef::new(store, bus, namespace),
            rooms: CollectionRef::new(store, bus, namespace),
            users: CollectionRef::new(store, bus, namespace),
            presence: CollectionRef::new(store, bus, namespace),
            messages: CollectionRef::new(store, bus, namespace),
            assets: CollectionRef::new(store, bus, namespace),
            plugins: CollectionRef::new(store, bus, namespace),
            room_members: CollectionRef::new(store, bus, namespace),
        }
    }

    /// Initialize every collection; ephemeral ones clear on start and carry TTL
    pub async fn initialize_all(&self, ttl: TtlConfig) -> Result<(), SharedError> {
        self.apps.initialize(false, None).await?;
        self.boards.initialize(false, None).await?;
        self.rooms.initialize(false, None).await?;
        self.users.initialize(false, None).await?;
        self.assets.initialize(false, None).await?;
        self.plugins.initialize(false, None).await?;
        self.room_members.initialize(false, None).await?;
        self.messages.initialize(true, Some(ttl.messages)).await?;
        self.presence.initialize(true, Some(ttl.presence)).await?;
        Ok(())
    }

    /// Construct the gate from ungated handles and attach it everywhere
    pub fn wire_gate(&mut self, policy: AuthPolicy) -> Arc<Authorization> {
        let gate = Arc::new(Authorization::new(
            self.users.ungated(),
            self.room_members.ungated(),
            policy,
        ));
        self.apps.attach_gate(gate.clone());
        self.boards.attach_gate(gate.clone());
        self.rooms.attach_gate(gate.clone());
        self.users.attach_gate(gate.clone());
        self.presence.attach_gate(gate.clone());
        self.messages.attach_gate(gate.clone());
        self.assets.attach_gate(gate.clone());
        self.plugins.attach_gate(gate.clone());
        self.room_members.attach_gate(gate.clone());
        gate
    }

    /// Ensure the default room/board exist and every room has its roster
    pub async fn seed_defaults(&self) -> Result<(), SharedError> {
        let server = Actor::server();
        let mut rooms = self.rooms.get_all(&server).await?;

        if rooms.is_empty() {
            let room = self
                .rooms
                .add(
                    json!({
                        "name": "Main Room",
                        "description": "Builtin default room",
                        "color": "green",
                        "ownerId": "-",
                        "isPrivate": false,
                        "privatePin": "",
                        "isListed": true,
                    }),
                    &server,
                )
                .await?;
            tracing::info!("[Rooms] default room added");

            self.boards
                .add(
                    json!({
                        "name": "Main Board",
                        "description": "Builtin default board",
                        "color": "green",
                        "roomId": room.id,
                        "ownerId": "-",
                    }),
                    &server,
                )
                .await?;
            tracing::info!("[Boards] default board added");
            rooms = self.rooms.get_all(&server).await?;
        } else {
            tracing::info!("[Rooms] loaded {} room(s) from store", rooms.len());
        }

        // Exactly one roster per room: backfill any that are missing
        for room in &rooms {
            let rosters = self.room_members.query("roomId", &room.id).await?;
            if rosters.is_empty() {
                let owner = if room.data.owner_id.is_empty() || room.data.owner_id == "-" {
                    room.created_by.clone()
                } else {
                    room.data.owner_id.clone()
                };
                self.room_members
                    .add(
                        json!({
                            "roomId": room.id,
                            "members": [{"userId": owner, "role": "owner"}],
                        }),
                        &server,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Delete a board and, as the owning collaborator, its apps
    pub async fn delete_board_cascade(
        &self,
        board_id: &str,
        actor: &Actor,
    ) -> Result<(), SharedError> {
        self.boards.delete(board_id, actor).await?;

        let server = Actor::server();
        for app in self.apps.query("boardId", board_id).await? {
            if let Err(e) = self.apps.delete(&app.id, &server).await {
                tracing::warn!("[Boards] cascade: app {} not deleted: {}", app.id, e);
            }
        }
        Ok(())
    }

    /// Delete a room and everything scoped to it: boards, their apps,
    /// assets, and the membership roster
    pub async fn delete_room_cascade(
        &self,
        room_id: &str,
        actor: &Actor,
    ) -> Result<(), SharedError> {
        self.rooms.delete(room_id, actor).await?;

        let server = Actor::server();
        for board in self.boards.query("roomId", room_id).await? {
            if let Err(e) = self.delete_board_cascade(&board.id, &server).await {
                tracing::warn!("[Rooms] cascade: board {} not deleted: {}", board.id, e);
            }
        }
        for asset in self.assets.query("roomId", room_id).await? {
            if let Err(e) = self.assets.delete(&asset.id, &server).await {
                tracing::warn!("[Rooms] cascade: asset {} not deleted: {}", asset.id, e);
            }
        }
        for roster in self.room_members.query("roomId", room_id).await? {
            if let Err(e) = self.room_members.delete(&roster.id, &server).await {
                tracing::warn!("[Rooms] cascade: roster {} not deleted: {}", roster.id, e);
            }
        }
        Ok(())
    }

    /// Add a user to a room's roster, creating the roster if needed
    pub async fn join_room(
        &self,
        room_id: &str,
        user_id: &str,
        role: RoomRole,
        actor: &Actor,
    ) -> Result<(), SharedError> {
        let rosters = self.room_members.query("roomId", room_id).await?;
        match rosters.into_iter().next() {
            Some(roster) => {
                if roster.data.role_of(user_id).is_some() {
                    return Ok(());
                }
                let mut members = roster.data.members.clone();
                members.push(crate::shared::schemas::RoomMember {
                    user_id: user_id.to_string(),
                    role,
                });
                self.room_members
                    .update(&roster.id, json!({ "members": members }), actor)
                    .await?;
                Ok(())
            }
            None => {
                self.room_members
                    .add(
                        json!({
                            "roomId": room_id,
                            "members": [{"userId": user_id, "role": role}],
                        }),
                        actor,
                    )
                    .await?;
                Ok(())
            }
        }
    }
}
