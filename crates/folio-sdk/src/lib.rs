//! Public SDK for the Folio page framework.
//!
//! This crate re-exports all framework functionality:
//!
//! ```ignore
//! use folio_sdk::prelude::*;
//!
//! #[derive(Default, Command)]
//! struct Signup {
//!     #[param]
//!     age: i32,
//! }
//!
//! impl PageHandler for Signup {
//!     fn on_get(&mut self, _: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
//!         Ok(View::Default)
//!     }
//!
//!     fn on_post(&mut self, page: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
//!         if page.has_errors() {
//!             return Ok(View::Default);
//!         }
//!         page.finish()?;
//!         Ok(View::redirect("/welcome"))
//!     }
//! }
//!
//! let pages = PageCatalog::new().with("/signup", PageType::of::<Signup>().persistent());
//! let fields = FieldCatalog::new().with::<Signup>();
//! let engine = PageEngine::new(EngineConfig::default(), pages, fields)?;
//!
//! let response = engine.service(&cx, &session)?;
//! ```

pub use folio_binder;
pub use folio_core;
pub use folio_engine;
pub use folio_macros::*;
pub use folio_observability;
pub use folio_registry;
pub use folio_security;

/// Prelude for convenient imports.
pub mod prelude {
    pub use folio_binder::*;
    pub use folio_core::*;
    pub use folio_engine::*;
    pub use folio_macros::*;
    pub use folio_observability::*;
    pub use folio_registry::*;
    pub use folio_security::*;
}
