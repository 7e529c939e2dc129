use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the catalog store.
///
/// Only `initialize`, `reload` and the accessors produce these. A failed
/// load or reload never touches the catalog already in memory.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog store not initialized, call initialize() first")]
    NotInitialized,

    #[error("catalog not loaded")]
    NotLoaded,

    #[error("catalog file not found: {}", path.display())]
    CatalogFileNotFound { path: PathBuf },

    #[error("invalid catalog schema in {}: {reason}", path.display())]
    InvalidCatalogSchema { path: PathBuf, reason: String },

    #[error("failed to read catalog file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
