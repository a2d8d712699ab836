//! Persistent page storage for the Folio page framework.
//!
//! This crate provides:
//! - `PersistentPageRegistry` - Concurrency-safe identity -> page table
//! - `PersistentPageRecord` - Timestamps, owner and replacement URI of one page
//! - `Clock` - Time source used for activity tracking
//! - `SweeperHandle` - Background idle eviction task

mod clock;
mod error;
mod record;
mod registry;
mod sweeper;

pub use clock::*;
pub use error::*;
pub use record::*;
pub use registry::*;
pub use sweeper::*;
