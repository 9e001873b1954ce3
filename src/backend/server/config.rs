//! Server Configuration
//!
//! Configuration is read once at startup from environment variables (a
//! `.env` file is honored via `dotenv` in `main`), with development-friendly
//! defaults. It is not consulted again at runtime.
//!
//! | Variable             | Default           | Meaning                          |
//! |----------------------|-------------------|----------------------------------|
//! | `SERVER_NAME`        | `slateboard`      | Instance name and store namespace|
//! | `SERVER_PORT`        | `3000`            | HTTP/WebSocket port              |
//! | `DATABASE_URL`       | `sqlite::memory:` | Store connection string          |
//! | `AUTH_SECRET`        | dev secret        | Token signing key                |
//! | `AUTH_TOKEN_TTL_SECS`| `86400`           | Issued-token lifetime            |
//! | `PRESENCE_TTL_SECS`  | `60`              | Presence expiry window           |
//! | `MESSAGE_TTL_SECS`   | `60`              | Message expiry window            |
//! | `SWEEP_INTERVAL_SECS`| `10`              | TTL sweeper cadence              |
//! | `COMPUTE_URL`        | unset             | Kernel proxy target (optional)   |

use std::time::Duration;

/// Startup configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Instance name; also namespaces every store key
    pub server_name: String,
    pub port: u16,
    /// sqlx URL of the document store
    pub database_url: String,
    /// Signing secret for bearer tokens
    pub auth_secret: String,
    /// Lifetime of issued tokens, seconds
    pub token_ttl_secs: u64,
    pub presence_ttl: Duration,
    pub message_ttl: Duration,
    /// Cadence of the TTL sweeper tasks
    pub sweep_interval: Duration,
    /// Base URL of the external compute backend, when proxying is enabled
    pub compute_url: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Load from the environment
    pub fn from_env() -> Self {
        let auth_secret = match std::env::var("AUTH_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!("AUTH_SECRET not set, using development secret");
                "slateboard-dev-secret".to_string()
            }
        };

        Self {
            server_name: env_or("SERVER_NAME", "slateboard"),
            port: env_secs("SERVER_PORT", 3000) as u16,
            database_url: env_or("DATABASE_URL", "sqlite::memory:"),
            auth_secret,
            token_ttl_secs: env_secs("AUTH_TOKEN_TTL_SECS", 86_400),
            presence_ttl: Duration::from_secs(env_secs("PRESENCE_TTL_SECS", 60)),
            message_ttl: Duration::from_secs(env_secs("MESSAGE_TTL_SECS", 60)),
            sweep_interval: Duration::from_secs(env_secs("SWEEP_INTERVAL_SECS", 10)),
            compute_url: std::env::var("COMPUTE_URL").ok(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "slateboard".to_string(),
            port: 3000,
            database_url: "sqlite::memory:".to_string(),
            auth_secret: "slateboard-dev-secret".to_string(),
            token_ttl_secs: 86_400,
            presence_ttl: Duration::from_secs(60),
            message_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(10),
            compute_url: None,
        }
    }
}
