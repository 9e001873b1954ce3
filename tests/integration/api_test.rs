//! HTTP surface integration tests
//!
//! Drives a real in-process server through the crate's own `ApiClient`
//! plus raw reqwest where the status code or body shape is the point.

use serde_json::json;
use slateboard::shared::api::ApiResponse;
use slateboard::shared::error::SharedError;
use slateboard::shared::schemas::{AppSchema, BoardSchema, RoomMembersSchema, RoomSchema};

use crate::common::TestServer;

#[tokio::test]
async fn test_unauthenticated_requests_are_401() {
    let server = TestServer::spawn().await;
    let http = reqwest::Client::new();

    let response = http
        .get(format!("{}/api/boards", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: ApiResponse<serde_json::Value> = response.json().await.unwrap();
    assert!(!body.success);

    let response = http
        .get(format!("{}/api/boards", server.base_url))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_info_route_is_public() {
    let server = TestServer::spawn().await;
    let response = reqwest::get(format!("{}/api/info", server.base_url)).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: ApiResponse<slateboard::shared::api::ServerInfo> =
        response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.data.unwrap().server_name, "slateboard");
}

#[tokio::test]
async fn test_token_then_me_roundtrip() {
    let server = TestServer::spawn().await;
    let (api, user) = server.login("Alice").await;

    let http = reqwest::Client::new();
    let response = http
        .get(format!("{}/api/auth/me", server.base_url))
        .bearer_auth(api.token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: ApiResponse<slateboard::shared::document::Document<
        slateboard::shared::schemas::UserSchema,
    >> = response.json().await.unwrap();
    assert_eq!(body.data.unwrap().id, user.id);
}

#[tokio::test]
async fn test_same_email_maps_to_same_user() {
    let server = TestServer::spawn().await;
    let (_api1, user1) = server.login("Alice").await;
    let (_api2, user2) = server.login("Alice").await;
    assert_eq!(user1.id, user2.id);
}

#[tokio::test]
async fn test_board_crud_flow() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;

    let room = api
        .create::<RoomSchema>(json!({"name": "Studio"}))
        .await
        .unwrap();

    let board = api
        .create::<BoardSchema>(json!({"name": "Sketches", "roomId": room.id}))
        .await
        .unwrap();
    assert_eq!(board.data.name, "Sketches");

    let fetched = api.get::<BoardSchema>(&board.id).await.unwrap();
    assert_eq!(fetched, board);

    let updated = api
        .update::<BoardSchema>(&board.id, json!({"description": "rough work"}))
        .await
        .unwrap();
    assert_eq!(updated.data.description, "rough work");
    assert!(updated.updated_at >= board.updated_at);

    let by_room = api.query::<BoardSchema>("roomId", &room.id).await.unwrap();
    assert_eq!(by_room.len(), 1);

    api.delete::<BoardSchema>(&board.id).await.unwrap();
    let err = api.get::<BoardSchema>(&board.id).await.unwrap_err();
    assert!(matches!(err, SharedError::NotFound { .. }));
}

#[tokio::test]
async fn test_creating_room_seats_creator_as_owner() {
    let server = TestServer::spawn().await;
    let (api, user) = server.login("Alice").await;

    let room = api.create::<RoomSchema>(json!({"name": "Studio"})).await.unwrap();
    let rosters = api
        .query::<RoomMembersSchema>("roomId", &room.id)
        .await
        .unwrap();
    assert_eq!(rosters.len(), 1);
    assert_eq!(
        rosters[0].data.role_of(&user.id),
        Some(slateboard::shared::schemas::RoomRole::Owner)
    );
}

#[tokio::test]
async fn test_invalid_body_is_400() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;

    let err = api
        .create::<BoardSchema>(json!({"isPrivate": "yes"}))
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Validation { .. }));
}

#[tokio::test]
async fn test_guest_write_is_403() {
    let server = TestServer::spawn().await;
    let (owner_api, _) = server.login("Alice").await;
    let room = owner_api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();

    let (guest_api, _) = server.login_guest("Visitor").await;
    let err = guest_api
        .create::<BoardSchema>(json!({"name": "nope", "roomId": room.id}))
        .await
        .unwrap_err();
    assert!(matches!(err, SharedError::Forbidden { .. }));
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;
    let err = api.get::<BoardSchema>("no-such-id").await.unwrap_err();
    assert!(matches!(err, SharedError::NotFound { .. }));
}

#[tokio::test]
async fn test_room_delete_cascades_over_http() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;

    let room = api.create::<RoomSchema>(json!({"name": "R"})).await.unwrap();
    let board = api
        .create::<BoardSchema>(json!({"name": "B", "roomId": room.id}))
        .await
        .unwrap();
    let app = api
        .create::<AppSchema>(json!({
            "type": "Stickie",
            "boardId": board.id,
            "roomId": room.id,
            "state": {"text": "hello"},
        }))
        .await
        .unwrap();

    api.delete::<RoomSchema>(&room.id).await.unwrap();

    assert!(matches!(
        api.get::<BoardSchema>(&board.id).await.unwrap_err(),
        SharedError::NotFound { .. }
    ));
    assert!(matches!(
        api.get::<AppSchema>(&app.id).await.unwrap_err(),
        SharedError::NotFound { .. }
    ));
    assert!(api
        .query::<RoomMembersSchema>("roomId", &room.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_compute_proxy_unconfigured_is_bad_gateway() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;

    let http = reqwest::Client::new();
    let response = http
        .get(format!("{}/api/compute/kernels", server.base_url))
        .bearer_auth(api.token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: ApiResponse<serde_json::Value> = response.json().await.unwrap();
    assert!(!body.success);
}

#[tokio::test]
async fn test_default_seeding_visible_over_http() {
    let server = TestServer::spawn().await;
    let (api, _user) = server.login("Alice").await;

    let rooms = api.get_all::<RoomSchema>().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].data.name, "Main Room");

    let boards = api.query::<BoardSchema>("roomId", &rooms[0].id).await.unwrap();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].data.name, "Main Board");
}
