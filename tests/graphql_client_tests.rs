//! Integration tests for the GraphQL client against a mock Admin API.

use serde_json::{json, Value};
use shopify_extract::clients::{GraphqlClient, GraphqlError, GraphqlTransport, HttpError};
use shopify_extract::{AccessToken, ApiVersion, Credentials, ExtractorConfig, HostUrl, ShopDomain};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GRAPHQL_PATH: &str = "/admin/api/2025-01/graphql.json";

fn config_for(server: &MockServer) -> ExtractorConfig {
    ExtractorConfig::builder()
        .credentials(Credentials::new(
            ShopDomain::new("test-shop").unwrap(),
            AccessToken::new("shpat_test_token").unwrap(),
            None,
            ApiVersion::V2025_01,
        ))
        .api_host(HostUrl::new(server.uri()).unwrap())
        .build()
        .unwrap()
}

fn request_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

// ============================================================================
// Request shape
// ============================================================================

#[tokio::test]
async fn test_execute_posts_query_and_variables_with_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .and(|request: &Request| {
            let body = request_body(request);
            body["query"] == "query { shop { name } }" && body["variables"] == json!({"first": 5})
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"shop": {"name": "Test"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let response = client
        .execute("query { shop { name } }", Some(json!({"first": 5})))
        .await
        .unwrap();

    assert!(!response.has_errors());
    assert_eq!(response.data_field("shop"), Some(&json!({"name": "Test"})));
}

#[tokio::test]
async fn test_execute_sends_null_variables_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(|request: &Request| request_body(request)["variables"].is_null())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    client.execute("query { shop { id } }", None).await.unwrap();
}

#[tokio::test]
async fn test_execute_sends_json_body_without_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(|request: &Request| request.url.query().is_none())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    client.execute("query { shop { id } }", None).await.unwrap();
}

// ============================================================================
// GraphQL-level errors
// ============================================================================

#[tokio::test]
async fn test_errors_with_200_are_a_graphql_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [
                {"message": "Field 'bodyHtml' doesn't exist on type 'Product'", "path": ["query", "products"]}
            ]
        })))
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let response = client.execute("query { x }", None).await.unwrap();

    assert!(response.has_errors());
    assert!(response.data.is_none());
    assert!(response.is_schema_incompatible());
    assert!(response.error_summary().contains("bodyHtml"));
}

#[tokio::test]
async fn test_non_2xx_with_errors_array_is_a_graphql_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{"message": "Parse error on \"}\" (RCURLY) at [1, 9]"}]
        })))
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let response = client.execute("query { }", None).await.unwrap();

    assert_eq!(response.errors.len(), 1);
    assert!(response.error_summary().starts_with("Parse error"));
}

// ============================================================================
// Transport errors
// ============================================================================

#[tokio::test]
async fn test_unauthorized_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"errors": "[API] Invalid API key or access token"})),
        )
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let error = client.execute("query { shop { id } }", None).await.unwrap_err();

    match error {
        GraphqlError::Http(HttpError::Response(response)) => {
            assert_eq!(response.code, 401);
            assert!(response.message.contains("Invalid API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let error = client.execute("query { shop { id } }", None).await.unwrap_err();

    assert!(matches!(error, GraphqlError::Http(HttpError::Response(ref e)) if e.code == 500));
}

#[tokio::test]
async fn test_body_without_data_or_errors_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"extensions": {}})))
        .mount(&server)
        .await;

    let client = GraphqlClient::new(&config_for(&server));
    let error = client.execute("query { shop { id } }", None).await.unwrap_err();

    assert!(matches!(error, GraphqlError::InvalidResponse { .. }));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_client_targets_the_api_host_override() {
    let config = ExtractorConfig::builder()
        .credentials(Credentials::new(
            ShopDomain::new("test-shop").unwrap(),
            AccessToken::new("shpat_test_token").unwrap(),
            None,
            ApiVersion::V2025_04,
        ))
        .api_host(HostUrl::new("http://127.0.0.1:4010").unwrap())
        .build()
        .unwrap();

    let client = GraphqlClient::new(&config);

    assert_eq!(client.api_version(), &ApiVersion::V2025_04);
    assert_eq!(client.http_client().base_uri(), "http://127.0.0.1:4010");
    assert_eq!(client.http_client().base_path(), "/admin/api/2025-04");
}
