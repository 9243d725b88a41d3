//! Error types for the collaborator seams of the core
//!
//! Everything in the filtering and search pipeline is total. Errors only
//! appear where the core talks to a capture source or a blob store.

use thiserror::Error;

/// Failures raised by a capture source while fetching history
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Capture source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid HAR data received from capture source")]
    MalformedDocument,

    #[error("Capture source failed: {0}")]
    Source(String),
}

/// Failures raised while loading or saving preference blobs
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to serialize blob {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse blob {name}: {source}")]
    Deserialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Blob storage failed: {0}")]
    Backend(String),
}
