//! Per-session anti-forgery tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use folio_core::NonceConfig;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::session::Session;

/// Issues and verifies the anti-forgery token of a session.
///
/// The token is generated lazily on first need and then stays stable for
/// the session's lifetime, unless rotation is enabled.
#[derive(Debug, Clone)]
pub struct NonceGuard {
    config: NonceConfig,
}

impl NonceGuard {
    /// Create a guard with the given settings.
    pub fn new(config: NonceConfig) -> Self {
        Self { config }
    }

    /// Whether tokens are rotated after a successful verification.
    pub fn rotates_after_verify(&self) -> bool {
        self.config.rotate_after_verify
    }

    /// Get the session token, creating it on first use.
    ///
    /// Concurrent first calls converge on a single token.
    pub fn get_or_create_nonce(&self, session: &Session) -> String {
        let mut slot = session.nonce.lock();
        match slot.as_ref() {
            Some(token) => token.clone(),
            None => {
                let token = self.generate();
                debug!(session = %session.id(), "issued session nonce");
                *slot = Some(token.clone());
                token
            }
        }
    }

    /// Compare a supplied token against the session token.
    ///
    /// Exact match only, in constant time. A session without a token never
    /// verifies.
    pub fn verify(&self, session: &Session, supplied: &str) -> bool {
        let slot = session.nonce.lock();
        match slot.as_deref() {
            Some(expected) => bool::from(expected.as_bytes().ct_eq(supplied.as_bytes())),
            None => false,
        }
    }

    /// Verify a supplied token and, on a match, replace it with a fresh one.
    ///
    /// Comparison and replacement happen under one session lock, so a token
    /// is accepted at most once. Returns the new token on success.
    pub fn verify_and_rotate(&self, session: &Session, supplied: &str) -> Option<String> {
        let mut slot = session.nonce.lock();
        let matches = match slot.as_deref() {
            Some(expected) => bool::from(expected.as_bytes().ct_eq(supplied.as_bytes())),
            None => false,
        };
        if !matches {
            return None;
        }

        let token = self.generate();
        *slot = Some(token.clone());
        debug!(session = %session.id(), "rotated session nonce");
        Some(token)
    }

    /// Replace the session token with a fresh one and return it.
    pub fn rotate(&self, session: &Session) -> String {
        let token = self.generate();
        *session.nonce.lock() = Some(token.clone());
        debug!(session = %session.id(), "rotated session nonce");
        token
    }

    fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.config.token_bytes];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl Default for NonceGuard {
    fn default() -> Self {
        Self::new(NonceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_nonce_is_stable() {
        let guard = NonceGuard::default();
        let session = Session::new();

        let first = guard.get_or_create_nonce(&session);
        let second = guard.get_or_create_nonce(&session);
        assert_eq!(first, second);
        // 24 bytes base64 encoded = 32 chars
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn test_nonce_differs_between_sessions() {
        let guard = NonceGuard::default();
        let a = guard.get_or_create_nonce(&Session::new());
        let b = guard.get_or_create_nonce(&Session::new());
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_exact_match_only() {
        let guard = NonceGuard::default();
        let session = Session::new();
        let token = guard.get_or_create_nonce(&session);

        assert!(guard.verify(&session, &token));
        assert!(!guard.verify(&session, &token[..token.len() - 1]));
        assert!(!guard.verify(&session, &format!("{}x", token)));
        assert!(!guard.verify(&session, ""));
    }

    #[test]
    fn test_verify_without_token_fails() {
        let guard = NonceGuard::default();
        let session = Session::new();
        assert!(!guard.verify(&session, ""));
        assert!(!session.has_nonce());
    }

    #[test]
    fn test_rotate_invalidates_old_token() {
        let guard = NonceGuard::default();
        let session = Session::new();
        let old = guard.get_or_create_nonce(&session);
        let new = guard.rotate(&session);

        assert_ne!(old, new);
        assert!(!guard.verify(&session, &old));
        assert!(guard.verify(&session, &new));
    }

    #[test]
    fn test_verify_and_rotate_accepts_token_once() {
        let guard = NonceGuard::default();
        let session = Session::new();
        let token = guard.get_or_create_nonce(&session);

        assert_eq!(guard.verify_and_rotate(&session, "forged"), None);
        assert!(guard.verify(&session, &token));

        let fresh = guard.verify_and_rotate(&session, &token).unwrap();
        assert_ne!(fresh, token);
        assert_eq!(guard.verify_and_rotate(&session, &token), None);
        assert_eq!(guard.get_or_create_nonce(&session), fresh);
    }

    #[test]
    fn test_concurrent_verify_and_rotate_single_winner() {
        let guard = NonceGuard::default();
        let session = Session::new();
        let token = guard.get_or_create_nonce(&session);
        let barrier = Barrier::new(8);

        let accepted: Vec<Option<String>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        guard.verify_and_rotate(&session, &token)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = accepted.into_iter().flatten().collect();
        assert_eq!(winners.len(), 1);
        assert!(guard.verify(&session, &winners[0]));
        assert!(!guard.verify(&session, &token));
    }

    #[test]
    fn test_concurrent_creation_converges() {
        let guard = NonceGuard::default();
        let session = Arc::new(Session::new());
        let barrier = Barrier::new(8);

        let tokens: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        guard.get_or_create_nonce(&session)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(tokens.windows(2).all(|w| w[0] == w[1]));
        assert!(guard.verify(&session, &tokens[0]));
    }

    #[test]
    fn test_token_bytes_configurable() {
        let guard = NonceGuard::new(NonceConfig {
            token_bytes: 12,
            rotate_after_verify: true,
        });
        let token = guard.get_or_create_nonce(&Session::new());
        assert_eq!(token.len(), 16);
        assert!(guard.rotates_after_verify());
    }
}
