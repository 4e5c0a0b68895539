//! HTTP response type with Shopify-specific header and cost parsing.

use std::collections::HashMap;

/// Query cost reported in `extensions.cost` of an Admin GraphQL response.
///
/// ```rust
/// use shopify_extract::clients::QueryCost;
/// use serde_json::json;
///
/// let cost = QueryCost::from_extensions(&json!({
///     "cost": {
///         "requestedQueryCost": 52,
///         "actualQueryCost": 12,
///         "throttleStatus": {
///             "maximumAvailable": 2000.0,
///             "currentlyAvailable": 1988.0,
///             "restoreRate": 100.0
///         }
///     }
/// }))
/// .unwrap();
/// assert_eq!(cost.requested, 52);
/// assert_eq!(cost.currently_available, Some(1988.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryCost {
    /// Cost the server estimated before execution.
    pub requested: u64,
    /// Cost actually charged, when reported.
    pub actual: Option<u64>,
    /// Points left in the leaky bucket.
    pub currently_available: Option<f64>,
    /// Bucket refill rate per second.
    pub restore_rate: Option<f64>,
}

impl QueryCost {
    /// Parses the cost block out of a response `extensions` object.
    #[must_use]
    pub fn from_extensions(extensions: &serde_json::Value) -> Option<Self> {
        let cost = extensions.get("cost")?;
        let throttle = cost.get("throttleStatus");
        Some(Self {
            requested: cost.get("requestedQueryCost")?.as_u64()?,
            actual: cost.get("actualQueryCost").and_then(serde_json::Value::as_u64),
            currently_available: throttle
                .and_then(|t| t.get("currentlyAvailable"))
                .and_then(serde_json::Value::as_f64),
            restore_rate: throttle
                .and_then(|t| t.get("restoreRate"))
                .and_then(serde_json::Value::as_f64),
        })
    }
}

/// An HTTP response from the Admin API.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, lower-cased; a header may have multiple values.
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the `Retry-After` header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.parse::<f64>().ok());

        Self {
            code,
            headers,
            body,
            retry_request_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `X-Shopify-API-Deprecated-Reason` header value, if present.
    #[must_use]
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.header("x-shopify-api-deprecated-reason")
    }

    /// Returns the GraphQL query cost carried in the body, if any.
    #[must_use]
    pub fn query_cost(&self) -> Option<QueryCost> {
        self.body.get("extensions").and_then(QueryCost::from_extensions)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}
