//! Core abstractions for the Folio page framework.
//!
//! This crate provides the plain data types shared by every other crate:
//! - `TransactionContext` - The per-request facade (method, parameters, uploads)
//! - `PageState` / `PageId` - Page lifecycle tracking
//! - `Model`, `Errors`, `ShadowInput` - Per-page data exposed to rendering
//! - `View` - The business method's view selection
//! - `PageError` - Request-level failure taxonomy
//! - `EngineConfig` - Reserved names, registry and nonce settings

mod config;
mod context;
mod error;
mod lifecycle;
mod model;
mod upload;
mod view;

pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use model::*;
pub use upload::*;
pub use view::*;
