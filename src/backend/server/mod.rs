//! Server setup: configuration, shared state, and initialization

pub mod config;
pub mod init;
pub mod state;

pub use config::ServerConfig;
pub use init::{create_app, create_app_with_config};
pub use state::AppState;
