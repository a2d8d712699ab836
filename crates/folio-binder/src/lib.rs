//! Command object binding for the Folio page framework.
//!
//! This crate provides:
//! - `Converter` - Pluggable text/value strategies (`IntegerConverter`, ...)
//! - `FieldTable` - Static per-type field metadata, built once at startup
//! - `FieldCatalog` - Field tables looked up by command type
//! - `CommandSlot` - Single-flight command object resolution
//! - `CommandBinder` - Binds request parameters and collects field errors
//! - `ResourceJanitor` - Deletes temporary upload files exactly once per execution

mod binder;
mod catalog;
mod command;
mod convert;
mod error;
mod field;
mod janitor;

pub use binder::*;
pub use catalog::*;
pub use command::*;
pub use convert::*;
pub use error::*;
pub use field::*;
pub use janitor::*;

// Re-exported so `#[derive(Command)]` output only needs this crate.
pub use folio_core::UploadedFile;
