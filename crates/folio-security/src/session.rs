//! Session state.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new cryptographically secure session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-side state of one visitor session.
///
/// Sessions are looked up by the transport layer and shared between the
/// concurrent requests of one visitor. The nonce slot is only touched by
/// [`NonceGuard`](crate::NonceGuard).
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    created_at: u64,
    pub(crate) nonce: Mutex<Option<String>>,
}

impl Session {
    /// Create a session with a freshly generated ID.
    pub fn new() -> Self {
        Self::with_id(SessionId::generate())
    }

    /// Create a session with a known ID.
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            created_at: current_timestamp(),
            nonce: Mutex::new(None),
        }
    }

    /// Session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Unix timestamp of creation.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Check whether a token has been issued for this session.
    pub fn has_nonce(&self) -> bool {
        self.nonce.lock().is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
