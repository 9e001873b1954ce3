//! Server Initialization
//!
//! `create_app` wires the whole service graph, explicitly and in order:
//!
//! 1. Connect the document store
//! 2. Create the change bus and the collection references
//! 3. Initialize collections (ephemeral ones clear on start and get TTLs)
//! 4. Construct the authorization gate and attach it everywhere
//! 5. Seed the default room/board and membership rosters
//! 6. Spawn the TTL sweeper tasks
//! 7. Assemble the router
//!
//! Nothing here is a singleton: tests build as many independent apps as
//! they like, each over its own store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::backend::auth::AuthPolicy;
use crate::backend::collections::{CollectionRef, Collections, TtlConfig};
use crate::backend::realtime::bus::CollectionBus;
use crate::backend::routes::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use crate::backend::store::KvStore;
use crate::shared::error::SharedError;
use crate::shared::schemas::CollectionSchema;

/// Broadcast buffer per collection channel
const BUS_CAPACITY: usize = 1024;

/// Periodically sweep one TTL-bearing collection
fn spawn_sweeper<T: CollectionSchema>(collection: CollectionRef<T>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = collection.sweep_expired().await {
                tracing::warn!("[{}] sweep failed: {}", collection.name(), e);
            }
        }
    });
}

/// Build the application for the given configuration
///
/// Returns the router plus the state, so embedders (and tests) can reach
/// the collections and bus directly.
pub async fn create_app_with_config(
    config: ServerConfig,
) -> Result<(Router, AppState), SharedError> {
    tracing::info!("Initializing {} server", config.server_name);

    // Step 1: the document store
    let store = KvStore::connect(&config.database_url).await?;
    tracing::info!("Store connected at {}", config.database_url);

    // Step 2: bus + collection references
    let bus = CollectionBus::new(BUS_CAPACITY);
    let mut collections = Collections::new(&store, &bus, &config.server_name);

    // Step 3: collection start-of-life
    collections
        .initialize_all(TtlConfig {
            presence: config.presence_ttl,
            messages: config.message_ttl,
        })
        .await?;

    // Step 4: the authorization gate
    let auth = collections.wire_gate(AuthPolicy::default());

    // Step 5: defaults
    collections.seed_defaults().await?;

    // Step 6: TTL sweepers for the ephemeral collections
    spawn_sweeper(collections.presence.clone(), config.sweep_interval);
    spawn_sweeper(collections.messages.clone(), config.sweep_interval);

    // Step 7: router
    let state = AppState {
        collections: Arc::new(collections),
        bus,
        auth,
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };
    let app = create_router(state.clone());

    tracing::info!("Router configured");
    Ok((app, state))
}

/// Build the application from environment configuration
pub async fn create_app() -> Result<Router, SharedError> {
    let (app, _state) = create_app_with_config(ServerConfig::from_env()).await?;
    Ok(app)
}
