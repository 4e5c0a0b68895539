//! Configuration error types for the extractor.
//!
//! Constructors of configuration values return `Result<T, ConfigError>` so
//! bad credentials or settings are rejected before any request is sent.
//!
//! # Example
//!
//! ```rust
//! use shopify_extract::{AccessToken, ConfigError};
//!
//! let result = AccessToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyAccessToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while building credentials or extractor configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Access token cannot be empty.
    #[error("Access token cannot be empty. Please provide a valid Admin API access token.")]
    EmptyAccessToken,

    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty. Please provide the app's client ID.")]
    EmptyClientId,

    /// Shop domain is invalid.
    #[error("Invalid shop domain '{domain}'. Expected format: 'shop-name' or 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2025-01') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A credential key is absent from the environment or credentials file.
    #[error("Missing credential '{key}'. Set it in the environment or in the credentials file.")]
    MissingCredential {
        /// The environment key that was looked up.
        key: &'static str,
    },

    /// The credentials file could not be read or written.
    #[error("Credentials file '{path}' could not be used: {reason}")]
    CredentialsFile {
        /// Path of the credentials file.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://proxy.example.com').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Secondary batch size must be at least one.
    #[error("Invalid batch size {size}. The secondary batch size must be at least 1.")]
    InvalidBatchSize {
        /// The rejected size.
        size: usize,
    },

    /// Page size must be within the API's accepted range.
    #[error("Invalid page size {size}. The page size must be between 1 and 250.")]
    InvalidPageSize {
        /// The rejected size.
        size: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_access_token_error_message() {
        let message = ConfigError::EmptyAccessToken.to_string();
        assert!(message.contains("Access token cannot be empty"));
    }

    #[test]
    fn test_invalid_shop_domain_error_message() {
        let error = ConfigError::InvalidShopDomain {
            domain: "bad domain!".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("bad domain!"));
        assert!(message.contains("Expected format"));
    }

    #[test]
    fn test_missing_credential_names_the_key() {
        let error = ConfigError::MissingCredential {
            key: "SHOPIFY_ACCESS_TOKEN",
        };
        assert!(error.to_string().contains("SHOPIFY_ACCESS_TOKEN"));
    }

    #[test]
    fn test_invalid_batch_size_message() {
        let error = ConfigError::InvalidBatchSize { size: 0 };
        assert!(error.to_string().contains("at least 1"));
    }
}
