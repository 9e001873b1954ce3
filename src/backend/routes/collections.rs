//! Collection CRUD Routes
//!
//! One generic handler per verb, instantiated per collection:
//!
//! - `POST   /api/<collection>`            create
//! - `GET    /api/<collection>`            list (visibility filtered)
//! - `GET    /api/<collection>/{id}`       read one
//! - `PUT    /api/<collection>/{id}`       partial update
//! - `DELETE /api/<collection>/{id}`       delete
//! - `GET    /api/<collection>/{field}/{value}`  query by field
//!
//! Rooms and Boards override delete with explicit cascades; Rooms override
//! create to seat the creator as room owner; Presence overrides create so
//! the document id is the caller's user id.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::backend::auth::Actor;
use crate::backend::collections::Registered;
use crate::backend::error::ApiError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::api::ApiResponse;
use crate::shared::document::Document;
use crate::shared::error::SharedError;
use crate::shared::schemas::{
    AppSchema, AssetSchema, BoardSchema, MessageSchema, PluginSchema, PresenceSchema,
    RoomMembersSchema, RoomRole, RoomSchema, UserSchema,
};

type DocResult<T> = Result<Json<ApiResponse<Document<T>>>, ApiError>;
type DocsResult<T> = Result<Json<ApiResponse<Vec<Document<T>>>>, ApiError>;
type EmptyResult = Result<Json<ApiResponse<()>>, ApiError>;

async fn create_doc<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<Value>,
) -> DocResult<T> {
    let doc = T::of(&app.collections).add(body, &user.actor()).await?;
    Ok(Json(ApiResponse::ok(doc)))
}

async fn get_all_docs<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
) -> DocsResult<T> {
    let docs = T::of(&app.collections).get_all(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(docs)))
}

async fn get_doc<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> DocResult<T> {
    let doc = T::of(&app.collections)
        .get_visible(&id, &user.actor())
        .await?
        .ok_or_else(|| SharedError::not_found(T::KEY.as_str(), &id))?;
    Ok(Json(ApiResponse::ok(doc)))
}

async fn update_doc<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> DocResult<T> {
    let doc = T::of(&app.collections).update(&id, patch, &user.actor()).await?;
    Ok(Json(ApiResponse::ok(doc)))
}

async fn delete_doc<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> EmptyResult {
    T::of(&app.collections).delete(&id, &user.actor()).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

async fn query_docs<T: Registered>(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path((field, value)): Path<(String, String)>,
) -> DocsResult<T> {
    let docs = T::of(&app.collections)
        .query_visible(&field, &value, &user.actor())
        .await?;
    Ok(Json(ApiResponse::ok(docs)))
}

/// The standard CRUD router for one collection
fn collection_router<T: Registered>() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_docs::<T>).post(create_doc::<T>))
        .route(
            "/{id}",
            get(get_doc::<T>).put(update_doc::<T>).delete(delete_doc::<T>),
        )
        .route("/{field}/{value}", get(query_docs::<T>))
}

// Rooms: creating a room seats the creator as its owner; deleting one
// cascades to boards, apps, assets and the roster.

async fn create_room(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<Value>,
) -> DocResult<RoomSchema> {
    let actor = user.actor();
    let room = app.collections.rooms.add(body, &actor).await?;
    app.collections
        .join_room(&room.id, &user.user_id, RoomRole::Owner, &Actor::server())
        .await?;
    Ok(Json(ApiResponse::ok(room)))
}

async fn delete_room(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> EmptyResult {
    app.collections.delete_room_cascade(&id, &user.actor()).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

async fn delete_board(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> EmptyResult {
    app.collections.delete_board_cascade(&id, &user.actor()).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

// Presence: the document id is the caller's user id, one live record per
// session, created on board join and refreshed with PUT.

async fn create_presence(
    State(app): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<Value>,
) -> DocResult<PresenceSchema> {
    let mut body = body;
    if let Some(map) = body.as_object_mut() {
        map.insert("userId".to_string(), json!(user.user_id));
    }
    let doc = app
        .collections
        .presence
        .add_with_id(&user.user_id, body, &user.actor())
        .await?;
    Ok(Json(ApiResponse::ok(doc)))
}

/// Boards with the cascading delete
fn boards_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_docs::<BoardSchema>).post(create_doc::<BoardSchema>))
        .route(
            "/{id}",
            get(get_doc::<BoardSchema>)
                .put(update_doc::<BoardSchema>)
                .delete(delete_board),
        )
        .route("/{field}/{value}", get(query_docs::<BoardSchema>))
}

/// Rooms with owner seating on create and the cascading delete
fn rooms_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_docs::<RoomSchema>).post(create_room))
        .route(
            "/{id}",
            get(get_doc::<RoomSchema>)
                .put(update_doc::<RoomSchema>)
                .delete(delete_room),
        )
        .route("/{field}/{value}", get(query_docs::<RoomSchema>))
}

/// Presence with the user-id document convention on create
fn presence_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_docs::<PresenceSchema>).post(create_presence))
        .route(
            "/{id}",
            get(get_doc::<PresenceSchema>)
                .put(update_doc::<PresenceSchema>)
                .delete(delete_doc::<PresenceSchema>),
        )
        .route("/{field}/{value}", get(query_docs::<PresenceSchema>))
}

/// All collection routes, nested under `/api`
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .nest("/apps", collection_router::<AppSchema>())
        .nest("/boards", boards_router())
        .nest("/rooms", rooms_router())
        .nest("/users", collection_router::<UserSchema>())
        .nest("/presence", presence_router())
        .nest("/messages", collection_router::<MessageSchema>())
        .nest("/assets", collection_router::<AssetSchema>())
        .nest("/plugins", collection_router::<PluginSchema>())
        .nest("/roommembers", collection_router::<RoomMembersSchema>())
}
