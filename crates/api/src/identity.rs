//! Request identity extraction.
//!
//! Authentication lives outside this service. Callers identify
//! themselves with one of two headers:
//!
//! - `x-user-id` — UUID of an authenticated user, set by the upstream
//!   auth proxy
//! - `x-session-key` — opaque key for an anonymous visitor
//!
//! When neither header is present a fresh session key is minted for
//! the request, and cart/checkout responses echo it back so the client
//! can keep using the same anonymous cart.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Identity, SessionKey, UserId};

use crate::error::ApiError;

const USER_HEADER: &str = "x-user-id";
const SESSION_HEADER: &str = "x-session-key";

/// The resolved caller identity for a request.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub identity: Identity,
    /// True when no identity header was sent and a session key was
    /// minted for this request.
    pub minted: bool,
}

impl ClientIdentity {
    /// The session key to echo in responses, for anonymous callers.
    pub fn session_key(&self) -> Option<String> {
        self.identity.session_key().map(|key| key.to_string())
    }
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(USER_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {USER_HEADER} header")))?;
            let uuid = uuid::Uuid::parse_str(raw)
                .map_err(|e| ApiError::BadRequest(format!("Invalid {USER_HEADER}: {e}")))?;
            return Ok(ClientIdentity {
                identity: Identity::User(UserId::from_uuid(uuid)),
                minted: false,
            });
        }

        if let Some(value) = parts.headers.get(SESSION_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {SESSION_HEADER} header")))?;
            return Ok(ClientIdentity {
                identity: Identity::Session(SessionKey::new(raw)),
                minted: false,
            });
        }

        Ok(ClientIdentity {
            identity: Identity::Session(SessionKey::generate()),
            minted: true,
        })
    }
}
