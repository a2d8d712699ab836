//! Security infrastructure for the Folio page framework.
//!
//! This crate provides:
//! - `Session` / `SessionId` - Per-visitor state holding the anti-forgery token
//! - `NonceGuard` - Issues and verifies the per-session token
//!
//! # Example
//!
//! ```ignore
//! use folio_security::{NonceGuard, Session};
//!
//! let guard = NonceGuard::new(NonceConfig::default());
//! let session = Session::new();
//!
//! let token = guard.get_or_create_nonce(&session);
//! assert!(guard.verify(&session, &token));
//! ```

mod nonce;
mod session;

pub use nonce::*;
pub use session::*;
