//! Registry error types.

use folio_core::PageId;
use thiserror::Error;

/// Errors returned by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No record for the identity (evicted, invalidated or never issued).
    #[error("page not found: {0}")]
    NotFound(PageId),

    /// The record belongs to another session.
    #[error("page {0} is owned by another session")]
    NotOwner(PageId),
}
