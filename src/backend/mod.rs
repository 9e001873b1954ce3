//! Backend Module
//!
//! The server side of the sync core: an Axum HTTP/WebSocket server over a
//! SQLite-backed document store, with typed collections, a query index, a
//! change-notification bus, and an authorization gate.
//!
//! # Architecture
//!
//! ```text
//! client ──HTTP──▶ routes ──▶ auth gate ──▶ collections ──▶ store + index
//!                                               │
//!                                               ▼ publish
//! client ◀──WS──── realtime::ws ◀────────── realtime::bus
//! ```
//!
//! Submodules:
//!
//! - **`store`** - key-value document store adapter (sqlx/SQLite, TTL)
//! - **`collections`** - typed collection references and the query index
//! - **`realtime`** - change bus and WebSocket fan-out
//! - **`auth`** - actors, the authorization gate, bearer tokens
//! - **`routes`** - HTTP surface and router assembly
//! - **`middleware`** - bearer-token authentication
//! - **`proxy`** - opaque forwarding to the external compute backend
//! - **`server`** - configuration, shared state, initialization
//! - **`error`** - HTTP error mapping
//!
//! # State Management
//!
//! All state lives in explicitly constructed services carried by
//! [`server::AppState`]; there are no module-level singletons. Shared
//! mutable state uses `Arc` + locks, change fan-out uses
//! `tokio::sync::broadcast`.

pub mod auth;
pub mod collections;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use auth::{Action, Actor, Authorization};
pub use collections::{CollectionRef, Collections};
pub use error::ApiError;
pub use realtime::{ChangeStream, CollectionBus};
pub use server::{create_app, create_app_with_config, AppState, ServerConfig};
pub use store::KvStore;
