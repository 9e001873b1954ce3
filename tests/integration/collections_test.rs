//! Collection + index + bus integration tests
//!
//! These drive the collection references directly (no HTTP) and check the
//! core consistency properties: index-backed queries, commit-order
//! delivery, no replay for late subscribers, and TTL expiry.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use slateboard::backend::auth::Actor;
use slateboard::backend::collections::{Collections, TtlConfig};
use slateboard::backend::realtime::bus::CollectionBus;
use slateboard::backend::store::KvStore;
use slateboard::shared::event::ChangeKind;
use slateboard::shared::schemas::CollectionSchema;

async fn collections() -> Collections {
    let store = KvStore::connect("sqlite::memory:").await.unwrap();
    let bus = CollectionBus::new(256);
    let collections = Collections::new(&store, &bus, "TEST");
    collections
        .initialize_all(TtlConfig {
            presence: Duration::from_millis(120),
            messages: Duration::from_millis(120),
        })
        .await
        .unwrap();
    collections
}

#[tokio::test]
async fn test_room_board_query_scenario() {
    let c = collections().await;
    let server = Actor::server();

    let room = c
        .rooms
        .add(json!({"name": "Main Room", "ownerId": "-"}), &server)
        .await
        .unwrap();
    let board = c
        .boards
        .add(json!({"name": "Main Board", "roomId": room.id}), &server)
        .await
        .unwrap();

    let hits = c.boards.query("roomId", &room.id).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, board.id);
    assert_eq!(hits[0].data.name, "Main Board");
}

#[tokio::test]
async fn test_subscriber_gets_exactly_n_messages_in_commit_order() {
    let c = collections().await;
    let server = Actor::server();
    let doc = c.boards.add(json!({"name": "v0"}), &server).await.unwrap();
    // Noise on another document must not leak into the scoped stream
    let other = c.boards.add(json!({"name": "noise"}), &server).await.unwrap();

    let mut sub = c.boards.subscribe_to_document(&doc.id);

    let n = 5;
    for i in 1..=n {
        c.boards
            .update(&doc.id, json!({"name": format!("v{}", i)}), &server)
            .await
            .unwrap();
        c.boards
            .update(&other.id, json!({"name": format!("noise{}", i)}), &server)
            .await
            .unwrap();
    }

    for i in 1..=n {
        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        let board = slateboard::shared::schemas::BoardSchema::from_payload(
            event.doc[0].data.clone(),
        )
        .unwrap();
        assert_eq!(board.name, format!("v{}", i));
    }
    // Exactly N: nothing else pending for this document
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_subscriber_after_commit_sees_nothing() {
    let c = collections().await;
    let server = Actor::server();
    let doc = c.boards.add(json!({"name": "before"}), &server).await.unwrap();
    c.boards.update(&doc.id, json!({"name": "done"}), &server).await.unwrap();

    let mut sub = c.boards.subscribe_all(&server).await.unwrap();
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_updated_at_is_non_decreasing_across_merge_chain() {
    let c = collections().await;
    let server = Actor::server();
    let doc = c.apps.add(json!({"type": "Stickie"}), &server).await.unwrap();

    let mut last = doc.updated_at;
    for i in 0..10 {
        let updated = c
            .apps
            .update(&doc.id, json!({"raised": i % 2 == 0}), &server)
            .await
            .unwrap();
        assert!(updated.updated_at >= last);
        last = updated.updated_at;
    }
}

#[tokio::test]
async fn test_left_fold_of_merges() {
    let c = collections().await;
    let server = Actor::server();
    let doc = c.apps.add(json!({"type": "Stickie"}), &server).await.unwrap();

    c.apps
        .update(&doc.id, json!({"title": "one"}), &server)
        .await
        .unwrap();
    c.apps
        .update(&doc.id, json!({"raised": true}), &server)
        .await
        .unwrap();
    c.apps
        .update(&doc.id, json!({"title": "two"}), &server)
        .await
        .unwrap();

    let merged = c.apps.get(&doc.id).await.unwrap().unwrap();
    assert_eq!(merged.data.title, "two");
    assert!(merged.data.raised);
    assert_eq!(merged.data.app_type, "Stickie");
}

#[tokio::test]
async fn test_presence_expires_from_get_all_without_refresh() {
    let c = collections().await;
    let server = Actor::server();

    c.presence
        .add_with_id("u1", json!({"userId": "u1", "boardId": "b1"}), &server)
        .await
        .unwrap();
    assert_eq!(c.presence.get_all(&server).await.unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(c.presence.get_all(&server).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_after_expiry_reports_not_found() {
    let c = collections().await;
    let server = Actor::server();
    c.presence
        .add_with_id("u1", json!({"userId": "u1"}), &server)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let err = c
        .presence
        .update("u1", json!({"status": "away"}), &server)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        slateboard::shared::error::SharedError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_concurrent_disjoint_updates_commute() {
    let c = collections().await;
    let server = Actor::server();
    let app = c.apps.add(json!({"type": "Stickie"}), &server).await.unwrap();

    let c1 = c.clone();
    let c2 = c.clone();
    let id1 = app.id.clone();
    let id2 = app.id.clone();
    let s1 = server.clone();
    let s2 = server.clone();

    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            c1.apps
                .update(&id1, json!({"position": {"x": 10.0, "y": 0.0, "z": 0.0}}), &s1)
                .await
        }),
        tokio::spawn(async move {
            c2.apps
                .update(&id2, json!({"raised": true}), &s2)
                .await
        }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let merged = c.apps.get(&app.id).await.unwrap().unwrap();
    assert_eq!(merged.data.position.x, 10.0);
    assert!(merged.data.raised);
}
