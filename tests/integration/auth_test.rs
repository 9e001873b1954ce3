//! Authorization gate integration tests
//!
//! The contract under test: a deny leaves zero observable state change
//! (no document, no index entry, no published event) and surfaces as
//! `Forbidden`.

use std::time::Duration;

use serde_json::json;
use slateboard::backend::auth::{Actor, AuthPolicy};
use slateboard::backend::collections::{Collections, TtlConfig};
use slateboard::backend::realtime::bus::CollectionBus;
use slateboard::backend::store::KvStore;
use slateboard::shared::error::SharedError;
use slateboard::shared::schemas::CollectionKey;

struct Gated {
    collections: Collections,
    bus: CollectionBus,
}

async fn gated() -> Gated {
    let store = KvStore::connect("sqlite::memory:").await.unwrap();
    let bus = CollectionBus::new(256);
    let mut collections = Collections::new(&store, &bus, "TEST");
    collections.initialize_all(TtlConfig::default()).await.unwrap();
    collections.wire_gate(AuthPolicy::default());
    Gated { collections, bus }
}

async fn seed_user(c: &Collections, id: &str, role: &str) {
    c.users
        .add_with_id(id, json!({"name": id, "userRole": role}), &Actor::server())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_guest_create_denied_with_no_side_effects() {
    let g = gated().await;
    seed_user(&g.collections, "guest1", "guest").await;

    let mut sub = g.bus.subscribe(CollectionKey::Boards);
    let err = g
        .collections
        .boards
        .add(json!({"name": "sneaky", "roomId": "r1"}), &Actor::user("guest1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SharedError::Forbidden { .. }));
    assert!(g
        .collections
        .boards
        .get_all(&Actor::server())
        .await
        .unwrap()
        .is_empty());
    assert!(g
        .collections
        .boards
        .query("roomId", "r1")
        .await
        .unwrap()
        .is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_non_member_update_and_delete_denied() {
    let g = gated().await;
    let server = Actor::server();
    seed_user(&g.collections, "alice", "user").await;
    seed_user(&g.collections, "mallory", "user").await;

    let room = g
        .collections
        .rooms
        .add(json!({"name": "R", "ownerId": "alice"}), &server)
        .await
        .unwrap();
    g.collections
        .join_room(&room.id, "alice", slateboard::shared::schemas::RoomRole::Owner, &server)
        .await
        .unwrap();
    let board = g
        .collections
        .boards
        .add(json!({"name": "B", "roomId": room.id}), &server)
        .await
        .unwrap();

    let mallory = Actor::user("mallory");
    let err = g
        .collections
        .boards
        .update(&board.id, json!({"name": "defaced"}), &mallory)
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));

    let err = g.collections.boards.delete(&board.id, &mallory).await.unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));

    let untouched = g.collections.boards.get(&board.id).await.unwrap().unwrap();
    assert_eq!(untouched.data.name, "B");
    assert_eq!(untouched.updated_at, board.updated_at);
}

#[tokio::test]
async fn test_member_update_allowed_owner_delete_room() {
    let g = gated().await;
    let server = Actor::server();
    seed_user(&g.collections, "alice", "user").await;
    seed_user(&g.collections, "bob", "user").await;

    let room = g
        .collections
        .rooms
        .add(json!({"name": "R", "ownerId": "alice"}), &server)
        .await
        .unwrap();
    g.collections
        .join_room(&room.id, "alice", slateboard::shared::schemas::RoomRole::Owner, &server)
        .await
        .unwrap();
    g.collections
        .join_room(&room.id, "bob", slateboard::shared::schemas::RoomRole::Member, &server)
        .await
        .unwrap();
    let board = g
        .collections
        .boards
        .add(json!({"name": "B", "roomId": room.id}), &server)
        .await
        .unwrap();

    // Member may move things around
    g.collections
        .boards
        .update(&board.id, json!({"name": "B2"}), &Actor::user("bob"))
        .await
        .unwrap();

    // But only the owner deletes the room
    let err = g
        .collections
        .rooms
        .delete(&room.id, &Actor::user("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));
    g.collections
        .rooms
        .delete(&room.id, &Actor::user("alice"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_identity_denied_get_all() {
    let g = gated().await;
    let err = g
        .collections
        .boards
        .get_all(&Actor::user("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));
}

#[tokio::test]
async fn test_guest_owns_its_presence_only() {
    let g = gated().await;
    seed_user(&g.collections, "guest1", "guest").await;
    let guest = Actor::user("guest1");

    g.collections
        .presence
        .add_with_id("guest1", json!({"userId": "guest1"}), &guest)
        .await
        .unwrap();
    g.collections
        .presence
        .update("guest1", json!({"status": "away"}), &guest)
        .await
        .unwrap();

    let err = g
        .collections
        .presence
        .add_with_id("other", json!({"userId": "other"}), &guest)
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));
}

#[tokio::test]
async fn test_roster_listing_scoped_to_members() {
    let g = gated().await;
    let server = Actor::server();
    seed_user(&g.collections, "alice", "user").await;
    seed_user(&g.collections, "carol", "user").await;

    let room = g
        .collections
        .rooms
        .add(json!({"name": "R", "ownerId": "alice"}), &server)
        .await
        .unwrap();
    g.collections
        .join_room(&room.id, "alice", slateboard::shared::schemas::RoomRole::Owner, &server)
        .await
        .unwrap();

    let seen_by_alice = g
        .collections
        .room_members
        .get_all(&Actor::user("alice"))
        .await
        .unwrap();
    assert_eq!(seen_by_alice.len(), 1);

    let seen_by_carol = g
        .collections
        .room_members
        .get_all(&Actor::user("carol"))
        .await
        .unwrap();
    assert!(seen_by_carol.is_empty());
}
