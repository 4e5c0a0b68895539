//! Error type for schema introspection and caching.

use std::path::PathBuf;

use thiserror::Error;

use crate::clients::GraphqlError;

/// Errors raised while introspecting or caching the API schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The introspection request failed at the transport level.
    #[error("Schema introspection request failed: {0}")]
    Transport(#[from] GraphqlError),

    /// The server answered the introspection query with GraphQL errors.
    #[error("Schema introspection was rejected: {message}")]
    Graphql {
        /// Joined error messages.
        message: String,
    },

    /// The introspection payload did not have the expected shape.
    #[error("Invalid introspection response: {reason}")]
    InvalidIntrospection {
        /// What was missing or malformed.
        reason: String,
    },

    /// Reading or writing the cache file failed.
    #[error("Schema cache I/O error at '{}': {source}", path.display())]
    Io {
        /// The cache file path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The cache entry could not be encoded.
    #[error("Schema cache encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
