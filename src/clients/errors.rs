//! Transport-level error types.
//!
//! Everything in this module describes a failure to obtain a usable HTTP
//! response. GraphQL-level errors travel inside a successful response and
//! are modelled by [`GraphqlResponse`](crate::clients::GraphqlResponse).
//!
//! - [`HttpResponseError`]: non-2xx response without a GraphQL error body
//! - [`MaxHttpRetriesExceededError`]: 429/500 responses after all tries
//! - [`InvalidHttpRequestError`]: request rejected before sending
//! - [`HttpError`]: unified error over the above plus network failures

use thiserror::Error;

/// A non-successful HTTP response.
///
/// `message` is a compact JSON document holding whichever of `errors`,
/// `error`, `error_description` and `error_reference` the response carried.
#[derive(Debug, Error)]
#[error("HTTP {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Serialized error body.
    pub message: String,
    /// Value of the `X-Request-Id` header, if present.
    pub error_reference: Option<String>,
}

/// Returned when 429 or 500 responses persist through every configured try.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last message: {message}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// Serialized error body of the last response.
    pub message: String,
    /// Value of the `X-Request-Id` header, if present.
    pub error_reference: Option<String>,
}

/// A request that failed validation before it was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A request body was provided without specifying the body type.
    #[error("Cannot set a body without also setting body_type.")]
    MissingBodyType,

    /// A POST request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Unified error type for all HTTP-related failures.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A non-2xx response.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network, TLS or timeout failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the status code of the failed response, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::MaxRetries(e) => Some(e.code),
            Self::InvalidRequest(_) | Self::Network(_) => None,
        }
    }
}
