//! Error types for the outliner providers

use thiserror::Error;

/// Errors surfaced to the host by connection-level operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Document is read-only")]
    ReadOnly,
}

/// Failures of the injected key-value storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A snapshot write that was dropped.
///
/// These never propagate out of `save`/`load`; they are only handed to
/// observers registered with `on_persist_error`.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to serialize snapshot for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write snapshot for '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
}

impl PersistError {
    /// Storage key of the write that was lost
    pub fn key(&self) -> &str {
        match self {
            PersistError::Serialize { key, .. } | PersistError::Storage { key, .. } => key,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
