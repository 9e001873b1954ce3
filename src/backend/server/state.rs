//! Application State
//!
//! `AppState` is the explicitly constructed service container handed to
//! every handler: the typed collections, the change bus, the authorization
//! gate, the startup configuration, and a shared outbound HTTP client for
//! the compute proxy. There are no module-level singletons; everything a
//! handler touches arrives through this struct.
//!
//! All fields are cheap to clone and thread-safe.

use std::sync::Arc;

use crate::backend::auth::Authorization;
use crate::backend::collections::Collections;
use crate::backend::realtime::bus::CollectionBus;
use crate::backend::server::config::ServerConfig;

/// Shared state for all HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Typed collection references (gate already attached)
    pub collections: Arc<Collections>,
    /// Change-notification bus
    pub bus: CollectionBus,
    /// Authorization gate
    pub auth: Arc<Authorization>,
    /// Startup configuration
    pub config: Arc<ServerConfig>,
    /// Outbound HTTP client for the compute proxy
    pub http: reqwest::Client,
}
