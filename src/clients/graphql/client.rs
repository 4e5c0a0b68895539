//! GraphQL client implementation for the Admin API.

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::graphql::{GraphqlError, GraphqlResponse, GraphqlTransport};
use crate::clients::{DataType, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse};
use crate::config::{ApiVersion, ExtractorConfig};

/// GraphQL API client bound to one store and API version.
///
/// Requests go to `POST {base}/admin/api/{version}/graphql.json` with the
/// `X-Shopify-Access-Token` header.
///
/// `GraphqlClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use shopify_extract::clients::GraphqlClient;
///
/// let client = GraphqlClient::new(&config);
/// let response = client.query("query { shop { name } }", None).await?;
/// println!("Shop: {}", response.body["data"]["shop"]["name"]);
/// ```
#[derive(Debug)]
pub struct GraphqlClient {
    http_client: HttpClient,
    api_version: ApiVersion,
    tries: u32,
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a client using the credentials' API version.
    #[must_use]
    pub fn new(config: &ExtractorConfig) -> Self {
        let api_version = config.credentials().api_version().clone();
        let http_client = HttpClient::new(format!("/admin/api/{api_version}"), config);

        tracing::debug!(
            "GraphQL client for {} using API version {}",
            config.credentials().shop(),
            api_version
        );

        Self {
            http_client,
            api_version,
            tries: config.request_tries(),
        }
    }

    /// Returns the API version being used by this client.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// Sends a GraphQL operation and returns the raw HTTP response.
    ///
    /// GraphQL-level errors are returned with HTTP 200 and live in
    /// `response.body["errors"]`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Http`] for network errors, non-2xx responses
    /// and retry exhaustion.
    pub async fn query(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<HttpResponse, GraphqlError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let request = HttpRequest::builder(HttpMethod::Post, "graphql.json")
            .body(body)
            .body_type(DataType::Json)
            .tries(self.tries)
            .build()
            .map_err(|e| GraphqlError::Http(e.into()))?;

        self.http_client.request(request).await.map_err(Into::into)
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    async fn execute(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<GraphqlResponse, GraphqlError> {
        match self.query(query, variables).await {
            Ok(response) => {
                if let Some(cost) = response.query_cost() {
                    tracing::trace!(
                        "Query cost requested={} actual={:?} available={:?}",
                        cost.requested,
                        cost.actual,
                        cost.currently_available
                    );
                }
                GraphqlResponse::from_body(response.body)
            }
            // A non-2xx response that still carries GraphQL errors is a
            // GraphQL-level failure, not a transport one.
            Err(GraphqlError::Http(HttpError::Response(error))) => {
                GraphqlResponse::from_error_message(&error.message)
                    .ok_or(GraphqlError::Http(HttpError::Response(error)))
            }
            Err(error) => Err(error),
        }
    }
}
