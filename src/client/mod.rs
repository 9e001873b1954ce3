//! Client-Side Store Mirrors
//!
//! The browser-equivalent side of the sync core as a Rust library:
//!
//! - [`ApiClient`] - typed CRUD over the HTTP surface, carrying the bearer
//!   token
//! - [`SocketClient`] - one persistent WebSocket multiplexing any number of
//!   SUB/UNSUB subscriptions
//! - [`CollectionMirror`] - a per-collection in-memory cache: snapshot via
//!   `get_all`, then change events applied as they arrive; CRUD methods
//!   proxy to the server and converge with the echoed events
//!
//! Mirrors surface failures in their `error` field for display and never
//! auto-retry; `clear_error` resets the surface.

pub mod http;
pub mod mirror;
pub mod socket;

pub use http::ApiClient;
pub use mirror::CollectionMirror;
pub use socket::SocketClient;
