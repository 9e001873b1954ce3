//! Client store mirror tests
//!
//! Two mirrors on two clients against one server: every mutation must
//! converge on both caches via the echoed change events.

use std::time::Duration;

use serde_json::json;
use slateboard::client::{CollectionMirror, SocketClient};
use slateboard::shared::error::SharedError;
use slateboard::shared::schemas::{BoardSchema, PresenceSchema, RoomSchema};

use crate::common::{settle, wait_until, TestServer};

const CONVERGE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_snapshot_then_live_updates_converge() {
    let server = TestServer::spawn().await;
    let (alice_api, _) = server.login("Alice").await;
    let (bob_api, _) = server.login("Bob").await;

    let room = alice_api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();
    let existing = alice_api
        .create::<BoardSchema>(json!({"name": "existing", "roomId": room.id}))
        .await
        .unwrap();

    let bob_socket = SocketClient::connect(&server.base_url, bob_api.token()).await.unwrap();
    let mut bob_boards = CollectionMirror::<BoardSchema>::new(bob_api, bob_socket);
    bob_boards.subscribe().await.unwrap();
    settle().await;

    // Snapshot covers pre-subscription state
    assert!(bob_boards.get(&existing.id).is_some());

    // Live events cover everything after
    let fresh = alice_api
        .create::<BoardSchema>(json!({"name": "fresh", "roomId": room.id}))
        .await
        .unwrap();
    assert!(wait_until(CONVERGE, || bob_boards.get(&fresh.id).is_some()).await);

    alice_api
        .update::<BoardSchema>(&fresh.id, json!({"name": "renamed"}))
        .await
        .unwrap();
    assert!(
        wait_until(CONVERGE, || {
            bob_boards
                .get(&fresh.id)
                .map(|d| d.data.name == "renamed")
                .unwrap_or(false)
        })
        .await
    );

    alice_api.delete::<BoardSchema>(&fresh.id).await.unwrap();
    assert!(wait_until(CONVERGE, || bob_boards.get(&fresh.id).is_none()).await);
    assert!(bob_boards.get(&existing.id).is_some());
}

#[tokio::test]
async fn test_originator_sees_own_writes_immediately() {
    let server = TestServer::spawn().await;
    let (api, _) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let mut boards = CollectionMirror::<BoardSchema>::new(api, socket);
    boards.subscribe().await.unwrap();
    settle().await;

    let doc = boards
        .create(json!({"name": "mine", "roomId": room.id}))
        .await
        .unwrap();
    // Applied locally before any echo round-trip
    assert_eq!(boards.get(&doc.id).unwrap().data.name, "mine");

    boards.update(&doc.id, json!({"name": "mine2"})).await.unwrap();
    assert_eq!(boards.get(&doc.id).unwrap().data.name, "mine2");

    boards.delete(&doc.id).await.unwrap();
    assert!(boards.get(&doc.id).is_none());

    // And the echoed events leave the cache in the same state
    settle().await;
    assert!(boards.get(&doc.id).is_none());
}

#[tokio::test]
async fn test_concurrent_disjoint_field_updates_converge_on_both() {
    let server = TestServer::spawn().await;
    let (alice_api, _) = server.login("Alice").await;
    let (bob_api, bob) = server.login("Bob").await;

    let room = alice_api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();
    // Bob joins so he may write in the room
    let rosters = alice_api
        .query::<slateboard::shared::schemas::RoomMembersSchema>("roomId", &room.id)
        .await
        .unwrap();
    let mut members = serde_json::to_value(&rosters[0].data.members).unwrap();
    members
        .as_array_mut()
        .unwrap()
        .push(json!({"userId": bob.id, "role": "member"}));
    alice_api
        .update::<slateboard::shared::schemas::RoomMembersSchema>(
            &rosters[0].id,
            json!({"members": members}),
        )
        .await
        .unwrap();

    let board = alice_api
        .create::<BoardSchema>(json!({"name": "B", "roomId": room.id}))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        alice_api.update::<BoardSchema>(&board.id, json!({"description": "from alice"})),
        bob_api.update::<BoardSchema>(&board.id, json!({"color": "red"})),
    );
    a.unwrap();
    b.unwrap();

    let merged = alice_api.get::<BoardSchema>(&board.id).await.unwrap();
    assert_eq!(merged.data.description, "from alice");
    assert_eq!(merged.data.color, "red");
}

#[tokio::test]
async fn test_presence_ttl_expiry_reaches_mirrors() {
    let server = TestServer::spawn_with(|config| {
        config.presence_ttl = Duration::from_millis(300);
        config.sweep_interval = Duration::from_millis(50);
    })
    .await;

    let (alice_api, alice) = server.login("Alice").await;
    let (bob_api, _) = server.login("Bob").await;

    let bob_socket = SocketClient::connect(&server.base_url, bob_api.token()).await.unwrap();
    let mut bob_presence = CollectionMirror::<PresenceSchema>::new(bob_api, bob_socket);
    bob_presence.subscribe().await.unwrap();
    settle().await;

    alice_api
        .create::<PresenceSchema>(json!({"boardId": "b1", "status": "online"}))
        .await
        .unwrap();
    assert!(wait_until(CONVERGE, || bob_presence.get(&alice.id).is_some()).await);

    // Alice stops refreshing; the sweeper publishes the expiry as DELETE
    assert!(wait_until(CONVERGE, || bob_presence.get(&alice.id).is_none()).await);
}

#[tokio::test]
async fn test_error_surface_and_clear() {
    let server = TestServer::spawn().await;
    let (api, _) = server.login("Alice").await;
    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let boards = CollectionMirror::<BoardSchema>::new(api, socket);

    let err = boards.update("missing-id", json!({"name": "x"})).await.unwrap_err();
    assert!(matches!(err, SharedError::NotFound { .. }));
    assert!(matches!(boards.error(), Some(SharedError::NotFound { .. })));

    boards.clear_error();
    assert!(boards.error().is_none());
}

#[tokio::test]
async fn test_unsubscribe_stops_cache_mutation() {
    let server = TestServer::spawn().await;
    let (api, _) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let mut boards = CollectionMirror::<BoardSchema>::new(api.clone(), socket);
    boards.subscribe().await.unwrap();
    settle().await;

    boards.unsubscribe();
    assert!(!boards.is_subscribed());
    settle().await;

    let frozen = boards.len();
    api.create::<BoardSchema>(json!({"name": "unseen", "roomId": room.id}))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(boards.len(), frozen);
}
