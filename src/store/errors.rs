//! Data store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing extraction output.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file or directory operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded or decoded.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A stored file does not hold a JSON array of records.
    #[error("{path} does not contain a JSON array of records")]
    NotRecords {
        /// The file involved.
        path: PathBuf,
    },
}
