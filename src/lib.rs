//! Slateboard - Collaborative Whiteboard Sync Core
//!
//! Slateboard is the real-time state synchronization core of a multi-user
//! collaborative whiteboard platform: many simultaneous users create, move,
//! and edit typed applications on shared boards while seeing each other's
//! cursors and presence live.
//!
//! # Module Structure
//!
//! - **`shared`** - Types on both sides of the wire: the document envelope,
//!   collection schemas, change events, and the error taxonomy
//! - **`backend`** - The server: document store adapter, typed collections
//!   with a query index, change-notification bus with WebSocket fan-out,
//!   authorization gate, and the HTTP surface
//! - **`client`** - Store mirrors: per-collection caches kept consistent
//!   with the server over the subscription socket, with CRUD proxies
//!
//! # Data Flow
//!
//! A client mutation travels: mirror → HTTP → authorization gate →
//! collection reference → store + query index → change bus → every
//! subscribed mirror (the originator included) applies the event to its
//! cache.
//!
//! # Consistency
//!
//! Per-document eventual consistency: after a mirror processes the event
//! for a mutation, its copy of that document equals the store's copy as of
//! that commit. Concurrent updates to one document merge shallow,
//! last-write-wins per field; updates to different documents are
//! uncoordinated. Ephemeral collections (presence, messages) expire by TTL.
//!
//! # Usage
//!
//! Server:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = slateboard::backend::create_app().await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Client mirror:
//!
//! ```rust,no_run
//! use slateboard::client::{ApiClient, CollectionMirror, SocketClient};
//! use slateboard::shared::schemas::BoardSchema;
//! use slateboard::shared::TokenRequest;
//!
//! # async fn example() -> Result<(), slateboard::shared::SharedError> {
//! let request = TokenRequest { name: "Alice".into(), email: None, guest: false };
//! let (api, _me) = ApiClient::acquire("http://localhost:3000", &request).await?;
//! let socket = SocketClient::connect(api.base_url(), api.token()).await?;
//!
//! let mut boards = CollectionMirror::<BoardSchema>::new(api, socket);
//! boards.subscribe().await?;
//! for board in boards.list() {
//!     println!("{}", board.data.name);
//! }
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;

/// Client-side store mirrors
pub mod client;
