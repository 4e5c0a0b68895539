//! The seam between extraction logic and the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::graphql::{GraphqlError, GraphqlResponse};

/// Executes GraphQL operations against one store.
///
/// `Err` means the operation produced no usable GraphQL response (network
/// failure, non-2xx status without a GraphQL error body). Server-reported
/// GraphQL errors come back as `Ok` with [`GraphqlResponse::errors`] filled.
///
/// [`GraphqlClient`](crate::clients::GraphqlClient) is the production
/// implementation.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Executes `query` with optional `variables`.
    async fn execute(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<GraphqlResponse, GraphqlError>;
}
