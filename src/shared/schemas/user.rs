//! User schema

use serde::{Deserialize, Serialize};

use super::{CollectionKey, CollectionSchema, DocumentPayload};

/// Global role carried on the user document
///
/// Room-level roles (owner/member) live in `ROOM_MEMBERS`; this is the
/// platform-wide role the authorization gate falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Guest,
}

/// Kind of client the account belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Client,
    Wall,
}

/// A platform user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSchema {
    /// Display name
    pub name: String,
    /// Login email; empty for anonymous guests
    pub email: String,
    /// Accent color for cursors and avatars
    pub color: String,
    /// Platform-wide role
    pub user_role: UserRole,
    /// Client kind
    pub user_type: UserType,
    /// Avatar URL, empty when unset
    pub profile_picture: String,
}

impl CollectionSchema for UserSchema {
    const KEY: CollectionKey = CollectionKey::Users;

    fn template() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            color: "gray".to_string(),
            user_role: UserRole::User,
            user_type: UserType::Client,
            profile_picture: String::new(),
        }
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["email"]
    }

    fn index_value(&self, field: &str) -> Option<String> {
        match field {
            "email" => Some(self.email.clone()),
            _ => None,
        }
    }

    fn into_payload(self) -> DocumentPayload {
        DocumentPayload::User(self)
    }

    fn from_payload(payload: DocumentPayload) -> Option<Self> {
        match payload {
            DocumentPayload::User(user) => Some(user),
            _ => None,
        }
    }
}
