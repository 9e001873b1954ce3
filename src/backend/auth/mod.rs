//! Authorization
//!
//! Identity and permission checking for every collection operation:
//!
//! - [`Actor`] - who an operation runs as (an authenticated user, or the
//!   server process itself)
//! - [`Action`] - what is being attempted
//! - [`Authorization`] - the gate, consulted by collection references before
//!   any scoped read or write
//! - [`token`] - signed bearer tokens carried by HTTP and WebSocket clients

mod gate;
pub mod token;

pub use gate::{AuthPolicy, Authorization, Visibility};

/// Identity the server process acts under; bypasses the gate
pub const SERVER_ACTOR_ID: &str = "SERVER";

/// What kind of identity an [`Actor`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// The server process itself (startup seeding, sweepers, internal listeners)
    Server,
    /// An authenticated end user
    User,
}

/// The identity an operation runs on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub kind: ActorKind,
}

impl Actor {
    /// The server-internal actor
    pub fn server() -> Self {
        Self { id: SERVER_ACTOR_ID.to_string(), kind: ActorKind::Server }
    }

    /// An end-user actor
    pub fn user(id: impl Into<String>) -> Self {
        Self { id: id.into(), kind: ActorKind::User }
    }

    pub fn is_server(&self) -> bool {
        self.kind == ActorKind::Server
    }
}

/// An attempted operation, as seen by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Opening a subscription
    Sub,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Sub => "sub",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
