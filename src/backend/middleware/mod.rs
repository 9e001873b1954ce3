//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
