//! Page lifecycle engine for the Folio page framework.
//!
//! This crate provides:
//! - `PageHandler` - Business logic hooks a page implements
//! - `PageCore` - Framework-owned page state (identity, lifecycle, model, errors)
//! - `PageCatalog` / `PageType` - Path to page type registrations
//! - `LifecycleEngine` - One execution against one page
//! - `PageEngine` - Request entry point tying the registry, binder and nonce guard together

mod catalog;
mod engine;
mod instance;
mod lifecycle;
mod page;
mod response;

pub use catalog::*;
pub use engine::*;
pub use instance::*;
pub use lifecycle::*;
pub use page::*;
pub use response::*;
