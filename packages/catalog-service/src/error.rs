//! Error types for catalog-service
//!
//! Every orchestrator returns [`CatalogError`]; the HTTP boundary matches on
//! [`CatalogError::kind`] to pick a status code.

use std::fmt;
use thiserror::Error;

use catalog_storage::StorageError;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced dataset or edge is absent
    NotFound,
    /// Uniqueness violation (FQN, edge, column name)
    Conflict,
    /// Edge would break the DAG invariant
    Cycle,
    /// Malformed request content
    Validation,
    /// Store failure the orchestrators did not anticipate
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Cycle => "cycle",
            ErrorKind::Validation => "validation",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(
        "Cannot add lineage '{upstream}' → '{downstream}': this would create a cycle. \
         '{upstream}' is already downstream of '{downstream}' (directly or transitively)."
    )]
    Cycle { upstream: String, downstream: String },

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CatalogError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn dataset_not_found(fqn: &str) -> Self {
        Self::NotFound(format!("Dataset '{}' not found.", fqn))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::Cycle { .. } => ErrorKind::Cycle,
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::Storage(_) => ErrorKind::Storage,
        }
    }
}
