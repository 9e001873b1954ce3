//! In-process test server
//!
//! Spawns the real application on an ephemeral port over an in-memory
//! store, and hands out authenticated clients.

use std::time::Duration;

use slateboard::backend::server::{create_app_with_config, AppState, ServerConfig};
use slateboard::client::ApiClient;
use slateboard::shared::api::TokenRequest;
use slateboard::shared::document::Document;
use slateboard::shared::schemas::UserSchema;

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Spawn with test-friendly defaults (fast sweeper, in-memory store)
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a tweaked configuration
    pub async fn spawn_with(tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let mut config = ServerConfig::default();
        config.sweep_interval = Duration::from_millis(50);
        tweak(&mut config);

        let (app, state) = create_app_with_config(config).await.expect("app builds");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server runs");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Log in as a regular user
    pub async fn login(&self, name: &str) -> (ApiClient, Document<UserSchema>) {
        let request = TokenRequest {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            guest: false,
        };
        ApiClient::acquire(&self.base_url, &request).await.expect("login")
    }

    /// Log in as a guest
    pub async fn login_guest(&self, name: &str) -> (ApiClient, Document<UserSchema>) {
        let request = TokenRequest {
            name: name.to_string(),
            email: None,
            guest: true,
        };
        ApiClient::acquire(&self.base_url, &request).await.expect("guest login")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Poll until `predicate` holds or `timeout` elapses; true on success
pub async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Give the server a moment to register an async side effect (e.g. a SUB)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}
