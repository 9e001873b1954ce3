//! WebSocket subscription channel tests
//!
//! End to end: HTTP mutation → bus → socket fan-out → client receiver.

use std::time::Duration;

use serde_json::json;
use slateboard::client::SocketClient;
use slateboard::shared::event::ChangeKind;
use slateboard::shared::schemas::{BoardSchema, CollectionSchema, RoomSchema};

use crate::common::{settle, TestServer};

#[tokio::test]
async fn test_collection_subscription_sees_crud_cycle() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let (sub_id, mut rx) = socket.subscribe("/api/boards");
    settle().await;

    let board = api
        .create::<BoardSchema>(json!({"name": "B", "roomId": room.id}))
        .await
        .unwrap();
    api.update::<BoardSchema>(&board.id, json!({"name": "B2"}))
        .await
        .unwrap();
    api.delete::<BoardSchema>(&board.id).await.unwrap();

    let create = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(create.kind, ChangeKind::Create);
    assert!(create.touches(&board.id));

    let update = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(update.kind, ChangeKind::Update);
    let payload = BoardSchema::from_payload(update.doc[0].data.clone()).unwrap();
    assert_eq!(payload.name, "B2");

    let delete = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delete.kind, ChangeKind::Delete);

    socket.unsubscribe(&sub_id);
}

#[tokio::test]
async fn test_document_subscription_filters_other_docs() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();
    let target = api
        .create::<BoardSchema>(json!({"name": "target", "roomId": room.id}))
        .await
        .unwrap();
    let other = api
        .create::<BoardSchema>(json!({"name": "other", "roomId": room.id}))
        .await
        .unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let (_sub_id, mut rx) = socket.subscribe(format!("/api/boards/{}", target.id));
    settle().await;

    api.update::<BoardSchema>(&other.id, json!({"name": "noise"}))
        .await
        .unwrap();
    api.update::<BoardSchema>(&target.id, json!({"name": "hit"}))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(event.touches(&target.id));
    let payload = BoardSchema::from_payload(event.doc[0].data.clone()).unwrap();
    assert_eq!(payload.name, "hit");
}

#[tokio::test]
async fn test_unsubscribed_stream_goes_quiet() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let (sub_id, mut rx) = socket.subscribe("/api/boards");
    settle().await;

    socket.unsubscribe(&sub_id);
    settle().await;

    api.create::<BoardSchema>(json!({"name": "after", "roomId": room.id}))
        .await
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
    // Either the channel is already closed or nothing ever arrives
    assert!(matches!(outcome, Err(_) | Ok(None)));
}

#[tokio::test]
async fn test_ws_upgrade_requires_token() {
    let server = TestServer::spawn().await;
    let err = SocketClient::connect(&server.base_url, "bad-token").await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_late_subscriber_gets_no_replay() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;
    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();
    api.create::<BoardSchema>(json!({"name": "old", "roomId": room.id}))
        .await
        .unwrap();

    let socket = SocketClient::connect(&server.base_url, api.token()).await.unwrap();
    let (_sub_id, mut rx) = socket.subscribe("/api/boards");
    settle().await;

    let outcome = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(outcome.is_err(), "no replay of pre-subscription commits");
}
