//! Cart and order ownership.
//!
//! Authentication is an external collaborator: the service only ever
//! sees a stable user id for authenticated callers or an opaque session
//! key for anonymous ones. Every core call takes an explicit
//! [`Identity`] instead of reading ambient request state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an authenticated user, issued by the external
/// identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session key for an anonymous visitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Mints a fresh session key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps a key received from a client.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The owner of a cart or order: an authenticated user XOR an anonymous
/// session. Exactly one of the two is ever set, which keeps a single
/// active cart per identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// An authenticated user.
    User(UserId),
    /// An anonymous visitor identified by a session key.
    Session(SessionKey),
}

impl Identity {
    /// Returns the user id when authenticated.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Identity::User(id) => Some(*id),
            Identity::Session(_) => None,
        }
    }

    /// Returns the session key when anonymous.
    pub fn session_key(&self) -> Option<&SessionKey> {
        match self {
            Identity::User(_) => None,
            Identity::Session(key) => Some(key),
        }
    }

    /// Returns true for anonymous identities.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Session(_))
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::User(id) => write!(f, "user:{id}"),
            Identity::Session(key) => write!(f, "session:{key}"),
        }
    }
}
