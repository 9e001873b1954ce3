//! Real-time Change Notification
//!
//! - [`bus`] - per-collection broadcast channels and the `ChangeStream`
//!   subscription handle used server-side
//! - [`ws`] - the `/api/ws` WebSocket endpoint fanning events out to
//!   clients, driven by SUB/UNSUB requests

pub mod bus;
pub mod ws;

pub use bus::{ChangeStream, CollectionBus};
