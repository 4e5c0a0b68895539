//! GraphQL client for the Shopify Admin API.
//!
//! - [`GraphqlClient`]: posts `{query, variables}` to `graphql.json`
//! - [`GraphqlTransport`]: the trait extraction code is written against
//! - [`GraphqlResponse`] / [`GraphqlErrorEntry`]: decoded response documents
//! - [`GraphqlError`]: transport-level failures
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_extract::clients::{GraphqlClient, GraphqlTransport};
//! use serde_json::json;
//!
//! let client = GraphqlClient::new(&config);
//! let response = client
//!     .execute(
//!         "query($id: ID!) { product(id: $id) { title } }",
//!         Some(json!({ "id": "gid://shopify/Product/123" })),
//!     )
//!     .await?;
//!
//! if response.has_errors() {
//!     eprintln!("GraphQL errors: {}", response.error_summary());
//! }
//! ```

mod client;
mod errors;
mod response;
mod transport;

pub use client::GraphqlClient;
pub use errors::GraphqlError;
pub use response::{GraphqlErrorEntry, GraphqlResponse};
pub use transport::GraphqlTransport;
