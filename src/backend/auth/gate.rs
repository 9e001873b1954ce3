//! Authorization Gate
//!
//! The gate decides `allow | deny` for `(actor, action, collection,
//! room-scope, resource)` tuples. It is constructed once at startup with
//! *ungated* handles to the Users and RoomMembers collections (so its own
//! lookups never recurse into permission checks) and is then attached to
//! every collection reference.
//!
//! Role model:
//!
//! - Global role (admin / user / guest) comes from the caller's user
//!   document.
//! - Room roles (owner / member) come from the room's `ROOM_MEMBERS`
//!   document.
//! - The server-internal actor bypasses the gate entirely.
//!
//! Which role may do what is configuration ([`AuthPolicy`]), not part of the
//! core algorithm; the gate only guarantees that a deny happens before the
//! mutating call and leaves no side effects.

use std::collections::HashSet;

use crate::backend::auth::{Action, Actor};
use crate::backend::collections::CollectionRef;
use crate::shared::error::SharedError;
use crate::shared::schemas::{
    CollectionKey, RoomMembersSchema, RoomRole, UserRole, UserSchema,
};

/// Policy knobs consulted by [`Authorization::check`]
///
/// Defaults: guests are read-only apart from their own presence; users may
/// create anywhere and write room-scoped documents they are members of;
/// deleting a Room takes its owner; RoomMembers rosters are only listed to
/// their members and may be updated by any member (self-service join/leave).
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Guests may create/refresh/delete their own presence record
    pub guest_presence_writes: bool,
    /// Collections whose delete takes the room owner, not mere membership
    pub owner_only_delete: Vec<CollectionKey>,
    /// Non-owner members may update the membership roster (join/leave)
    pub member_roster_updates: bool,
    /// Collections listed only to room members
    pub membership_listed: Vec<CollectionKey>,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            guest_presence_writes: true,
            owner_only_delete: vec![CollectionKey::Rooms],
            member_roster_updates: true,
            membership_listed: vec![CollectionKey::RoomMembers],
        }
    }
}

/// Visibility rule for a `get_all`/`query` caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Every document is listed
    All,
    /// Room-scoped documents are listed only for these rooms
    RoomMembership(HashSet<String>),
}

/// The authorization gate service
pub struct Authorization {
    users: CollectionRef<UserSchema>,
    room_members: CollectionRef<RoomMembersSchema>,
    policy: AuthPolicy,
}

impl Authorization {
    /// Build the gate from ungated collection handles
    pub fn new(
        users: CollectionRef<UserSchema>,
        room_members: CollectionRef<RoomMembersSchema>,
        policy: AuthPolicy,
    ) -> Self {
        Self { users, room_members, policy }
    }

    /// Role the user holds in a room, if a member at all
    pub async fn room_role(
        &self,
        user_id: &str,
        room_id: &str,
    ) -> Result<Option<RoomRole>, SharedError> {
        let rosters = self.room_members.query("roomId", room_id).await?;
        Ok(rosters.first().and_then(|doc| doc.data.role_of(user_id)))
    }

    /// Rooms the user is a member of
    async fn member_rooms(&self, user_id: &str) -> Result<HashSet<String>, SharedError> {
        let rosters = Box::pin(self.room_members.get_all(&Actor::server())).await?;
        Ok(rosters
            .into_iter()
            .filter(|doc| doc.data.role_of(user_id).is_some())
            .map(|doc| doc.data.room_id)
            .collect())
    }

    async fn global_role(&self, actor: &Actor) -> Result<Option<UserRole>, SharedError> {
        Ok(self.users.get(&actor.id).await?.map(|doc| doc.data.user_role))
    }

    /// Decide `allow | deny`
    ///
    /// `room_scope` is the room id a room-scoped document belongs to;
    /// `resource_id` is the targeted document id, when the action has one.
    /// Unknown identities (no user document) are denied everything.
    pub async fn check(
        &self,
        actor: &Actor,
        action: Action,
        collection: CollectionKey,
        room_scope: Option<&str>,
        resource_id: Option<&str>,
    ) -> Result<bool, SharedError> {
        if actor.is_server() {
            return Ok(true);
        }
        let role = match self.global_role(actor).await? {
            Some(role) => role,
            None => {
                tracing::warn!("[Auth] unknown identity '{}' denied", actor.id);
                return Ok(false);
            }
        };
        if role == UserRole::Admin {
            return Ok(true);
        }
        if matches!(action, Action::Read | Action::Sub) {
            return Ok(true);
        }

        // Mutations, by global role
        match role {
            UserRole::Guest => Ok(self.policy.guest_presence_writes
                && collection == CollectionKey::Presence
                && resource_id == Some(actor.id.as_str())),
            UserRole::User => {
                self.check_user_write(actor, action, collection, room_scope, resource_id)
                    .await
            }
            UserRole::Admin => Ok(true),
        }
    }

    async fn check_user_write(
        &self,
        actor: &Actor,
        action: Action,
        collection: CollectionKey,
        room_scope: Option<&str>,
        resource_id: Option<&str>,
    ) -> Result<bool, SharedError> {
        let own_resource = resource_id == Some(actor.id.as_str());
        match collection {
            // Accounts are created by the token route (server actor); users
            // may only touch their own document.
            CollectionKey::Users => Ok(action != Action::Create && own_resource),
            CollectionKey::Presence => Ok(own_resource),
            CollectionKey::Rooms => match action {
                Action::Create => Ok(true),
                _ => {
                    // A room is its own scope; the id names the room
                    let Some(room_id) = resource_id else { return Ok(false) };
                    Ok(self.room_role(&actor.id, room_id).await? == Some(RoomRole::Owner))
                }
            },
            CollectionKey::RoomMembers => {
                let Some(room_id) = room_scope else {
                    return Ok(action == Action::Create);
                };
                match self.room_role(&actor.id, room_id).await? {
                    Some(RoomRole::Owner) => Ok(true),
                    Some(RoomRole::Member) => {
                        Ok(action == Action::Update && self.policy.member_roster_updates)
                    }
                    None => Ok(action == Action::Create),
                }
            }
            _ => {
                // Boards, Apps, Assets, Messages, Plugins: room membership
                // gates the room-scoped ones; the rest are open to users.
                let Some(room_id) = room_scope else { return Ok(true) };
                let room_role = self.room_role(&actor.id, room_id).await?;
                if action == Action::Delete && self.policy.owner_only_delete.contains(&collection)
                {
                    return Ok(room_role == Some(RoomRole::Owner));
                }
                Ok(room_role.is_some())
            }
        }
    }

    /// Visibility rule applied to `get_all`/`query` results
    pub async fn visibility(
        &self,
        actor: &Actor,
        collection: CollectionKey,
    ) -> Result<Visibility, SharedError> {
        if actor.is_server() {
            return Ok(Visibility::All);
        }
        if !self.policy.membership_listed.contains(&collection) {
            return Ok(Visibility::All);
        }
        if self.global_role(actor).await? == Some(UserRole::Admin) {
            return Ok(Visibility::All);
        }
        Ok(Visibility::RoomMembership(self.member_rooms(&actor.id).await?))
    }
}
