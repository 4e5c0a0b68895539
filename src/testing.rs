//! Transport fakes and schema fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::{GraphqlError, GraphqlResponse, GraphqlTransport, HttpError, HttpResponseError};
use crate::config::{AccessToken, ApiVersion, Credentials, ExtractorConfig, ShopDomain};
use crate::schema::{Schema, SchemaArgument, SchemaField, SchemaType, TypeKind, TypeRef};

type Handler =
    Box<dyn Fn(&str, Option<&Value>) -> Result<GraphqlResponse, GraphqlError> + Send + Sync>;

/// A call observed by [`ScriptedTransport`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub query: String,
    pub variables: Option<Value>,
}

/// Answers GraphQL calls from a script or a handler and records every call.
pub struct ScriptedTransport {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    /// Replies with `responses` in order, then fails.
    pub fn new(responses: Vec<Result<GraphqlResponse, GraphqlError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::with_handler(move |_, _| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GraphqlError::InvalidResponse {
                    reason: "script exhausted".to_string(),
                }))
        })
    }

    /// Replies by calling `handler` with the query and variables.
    pub fn with_handler(
        handler: impl Fn(&str, Option<&Value>) -> Result<GraphqlResponse, GraphqlError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn execute(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<GraphqlResponse, GraphqlError> {
        self.calls.lock().unwrap().push(RecordedCall {
            query: query.to_string(),
            variables: variables.clone(),
        });
        tokio::task::yield_now().await;
        (self.handler)(query, variables.as_ref())
    }
}

/// A transport-level failure as produced by a 502 from the API.
pub fn transport_error() -> GraphqlError {
    GraphqlError::Http(HttpError::Response(HttpResponseError {
        code: 502,
        message: r#"{"errors":"Bad Gateway"}"#.to_string(),
        error_reference: None,
    }))
}

/// A connection page: `{ <key>: { pageInfo, edges: [{node}] } }`.
pub fn connection_page(
    key: &str,
    nodes: Vec<Value>,
    has_next_page: bool,
    end_cursor: Option<&str>,
) -> GraphqlResponse {
    let edges: Vec<Value> = nodes
        .into_iter()
        .map(|node| serde_json::json!({ "node": node }))
        .collect();
    let mut data = serde_json::Map::new();
    data.insert(
        key.to_string(),
        serde_json::json!({
            "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor },
            "edges": edges,
        }),
    );
    GraphqlResponse::with_data(Value::Object(data))
}

fn scalar(name: &str) -> TypeRef {
    TypeRef::named(TypeKind::Scalar, name)
}

fn object(name: &str) -> TypeRef {
    TypeRef::named(TypeKind::Object, name)
}

fn required(inner: TypeRef) -> TypeRef {
    TypeRef::non_null(inner)
}

fn arg(name: &str, ty: TypeRef) -> SchemaArgument {
    SchemaArgument {
        name: name.to_string(),
        ty,
        default_value: None,
    }
}

fn connection_args() -> Vec<SchemaArgument> {
    vec![arg("first", scalar("Int")), arg("after", scalar("String"))]
}

fn connection_types(node: &str) -> Vec<SchemaType> {
    vec![
        SchemaType::new(
            format!("{node}Connection"),
            TypeKind::Object,
            vec![
                SchemaField::new(
                    "edges",
                    required(TypeRef::list(required(object(&format!("{node}Edge"))))),
                ),
                SchemaField::new("pageInfo", required(object("PageInfo"))),
            ],
        ),
        SchemaType::new(
            format!("{node}Edge"),
            TypeKind::Object,
            vec![
                SchemaField::new("cursor", required(scalar("String"))),
                SchemaField::new("node", required(object(node))),
            ],
        ),
    ]
}

/// A trimmed Admin API schema: products with variants, orders with
/// transactions, and enough odd shapes to exercise the builder and validator.
pub fn sample_schema() -> Schema {
    let mut types = vec![
        SchemaType::new(
            "QueryRoot",
            TypeKind::Object,
            vec![
                SchemaField::new("products", required(object("ProductConnection")))
                    .with_args(connection_args()),
                SchemaField::new("orders", required(object("OrderConnection")))
                    .with_args(connection_args()),
                SchemaField::new("productVariant", object("ProductVariant"))
                    .with_args(vec![arg("id", required(scalar("ID")))]),
                SchemaField::new("shop", required(object("Shop"))),
            ],
        ),
        SchemaType::new(
            "Product",
            TypeKind::Object,
            vec![
                SchemaField::new("id", required(scalar("ID"))),
                SchemaField::new("title", required(scalar("String"))),
                SchemaField::new("handle", required(scalar("String"))),
                SchemaField::new("status", required(TypeRef::named(TypeKind::Enum, "ProductStatus"))),
                SchemaField::new("createdAt", required(scalar("DateTime"))),
                SchemaField::new("tags", required(TypeRef::list(required(scalar("String"))))),
                SchemaField::new("variants", required(object("ProductVariantConnection")))
                    .with_args(connection_args()),
                SchemaField::new("featuredImage", object("Image")),
                SchemaField::new("seo", required(object("SEO"))),
                SchemaField::new("primaryMedia", TypeRef::named(TypeKind::Union, "MediaUnion")),
                SchemaField::new("metafield", object("Metafield"))
                    .with_args(vec![arg("key", required(scalar("String")))]),
            ],
        ),
        SchemaType::new(
            "ProductVariant",
            TypeKind::Object,
            vec![
                SchemaField::new("id", required(scalar("ID"))),
                SchemaField::new("title", required(scalar("String"))),
                SchemaField::new("sku", scalar("String")),
                SchemaField::new("price", required(scalar("Money"))),
                SchemaField::new("inventoryQuantity", scalar("Int")),
                SchemaField::new("product", required(object("Product"))),
            ],
        ),
        SchemaType::new(
            "Image",
            TypeKind::Object,
            vec![
                SchemaField::new("id", scalar("ID")),
                SchemaField::new("url", required(scalar("URL"))),
                SchemaField::new("altText", scalar("String")),
                SchemaField::new("width", scalar("Int")),
                SchemaField::new("height", scalar("Int")),
                SchemaField::new("thumbhash", scalar("String")),
                SchemaField::new("originalSrc", scalar("URL")),
            ],
        ),
        SchemaType::new(
            "SEO",
            TypeKind::Object,
            vec![
                SchemaField::new("title", scalar("String")),
                SchemaField::new("description", scalar("String")),
            ],
        ),
        SchemaType::new(
            "Metafield",
            TypeKind::Object,
            vec![
                SchemaField::new("id", required(scalar("ID"))),
                SchemaField::new("value", required(scalar("String"))),
            ],
        ),
        SchemaType::new(
            "Order",
            TypeKind::Object,
            vec![
                SchemaField::new("id", required(scalar("ID"))),
                SchemaField::new("name", required(scalar("String"))),
                SchemaField::new("email", scalar("String")),
                SchemaField::new(
                    "transactions",
                    required(TypeRef::list(required(object("OrderTransaction")))),
                )
                .with_args(vec![arg("first", scalar("Int"))]),
            ],
        ),
        SchemaType::new(
            "OrderTransaction",
            TypeKind::Object,
            vec![
                SchemaField::new("id", required(scalar("ID"))),
                SchemaField::new("kind", required(TypeRef::named(TypeKind::Enum, "OrderTransactionKind"))),
                SchemaField::new("status", required(TypeRef::named(TypeKind::Enum, "OrderTransactionStatus"))),
            ],
        ),
        SchemaType::new(
            "PageInfo",
            TypeKind::Object,
            vec![
                SchemaField::new("hasNextPage", required(scalar("Boolean"))),
                SchemaField::new("endCursor", scalar("String")),
            ],
        ),
        SchemaType::new(
            "Shop",
            TypeKind::Object,
            vec![SchemaField::new("name", required(scalar("String")))],
        ),
        SchemaType::new("MediaUnion", TypeKind::Union, vec![]),
        SchemaType::new("ProductStatus", TypeKind::Enum, vec![]),
        SchemaType::new("OrderTransactionKind", TypeKind::Enum, vec![]),
        SchemaType::new("OrderTransactionStatus", TypeKind::Enum, vec![]),
    ];
    types.extend(connection_types("Product"));
    types.extend(connection_types("ProductVariant"));
    types.extend(connection_types("Order"));
    for name in ["ID", "String", "Int", "Boolean", "DateTime", "Money", "URL"] {
        types.push(SchemaType::new(name, TypeKind::Scalar, vec![]));
    }
    Schema::new(Some("QueryRoot".to_string()), types)
}

/// The introspection response that [`fetch_schema`](crate::schema::fetch_schema)
/// turns back into `schema`.
pub fn introspection_response(schema: &Schema) -> GraphqlResponse {
    GraphqlResponse::with_data(serde_json::json!({
        "__schema": {
            "queryType": { "name": schema.query_type },
            "types": serde_json::to_value(&schema.types).unwrap(),
        }
    }))
}

/// A config for `my-store` writing into `data_dir`, without delays.
pub fn test_config(data_dir: &std::path::Path) -> ExtractorConfig {
    ExtractorConfig::builder()
        .credentials(Credentials::new(
            ShopDomain::new("my-store").unwrap(),
            AccessToken::new("shpat_test").unwrap(),
            None,
            ApiVersion::V2025_01,
        ))
        .data_dir(data_dir)
        .page_delay(std::time::Duration::ZERO)
        .batch_delay(std::time::Duration::ZERO)
        .build()
        .unwrap()
}
