//! HTTP and GraphQL client layer.
//!
//! # Overview
//!
//! - [`HttpClient`]: authenticated HTTP client with 429/500 retry handling
//! - [`HttpRequest`] / [`HttpResponse`]: request and response types
//! - [`graphql::GraphqlClient`]: Admin API GraphQL client
//! - [`graphql::GraphqlTransport`]: trait the extraction engine runs against
//!
//! # Retry Behavior
//!
//! - **429 (Rate Limited)**: retries using `Retry-After`, or 1 second if absent
//! - **500 (Server Error)**: retries with a fixed 1-second delay
//! - **Other errors (4xx)**: returned immediately
//!
//! The default is a single try. Raise it with
//! [`ExtractorConfigBuilder::request_tries`](crate::ExtractorConfigBuilder::request_tries).

mod errors;
pub mod graphql;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::{HttpResponse, QueryCost};

pub use graphql::{GraphqlClient, GraphqlError, GraphqlErrorEntry, GraphqlResponse, GraphqlTransport};
