//! Transport-level errors for GraphQL operations.
//!
//! Errors reported by the GraphQL server itself (unknown fields, invalid
//! arguments, throttling) arrive in [`GraphqlResponse::errors`] and are not
//! represented here.
//!
//! [`GraphqlResponse::errors`]: crate::clients::GraphqlResponse::errors

use crate::clients::HttpError;
use thiserror::Error;

/// Error type for GraphQL transport operations.
///
/// ```rust
/// use shopify_extract::clients::graphql::GraphqlError;
/// use shopify_extract::clients::{HttpError, HttpResponseError};
///
/// let http_error = HttpError::Response(HttpResponseError {
///     code: 401,
///     message: r#"{"errors":"Invalid API key or access token"}"#.to_string(),
///     error_reference: None,
/// });
/// let graphql_error: GraphqlError = http_error.into();
/// assert!(graphql_error.to_string().contains("Invalid API key"));
/// ```
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// An HTTP-level error: network failure, non-2xx status or retry exhaustion.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The body of a 2xx response was not a GraphQL response document.
    #[error("Malformed GraphQL response: {reason}")]
    InvalidResponse {
        /// What was wrong with the body.
        reason: String,
    },
}
