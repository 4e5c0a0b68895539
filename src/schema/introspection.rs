//! Schema introspection against the live API.

use serde::Deserialize;

use crate::clients::GraphqlTransport;
use crate::schema::{Schema, SchemaError, SchemaType};

/// Introspection query listing every type with its fields and their
/// arguments.
///
/// `TypeRef` unwraps six `ofType` levels, enough for shapes such as
/// `[[String!]!]!`.
pub const INTROSPECTION_QUERY: &str = r"
query IntrospectionQuery {
  __schema {
    queryType { name }
    types {
      kind
      name
      fields(includeDeprecated: true) {
        name
        args {
          name
          defaultValue
          type { ...TypeRef }
        }
        type { ...TypeRef }
      }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
            }
          }
        }
      }
    }
  }
}
";

#[derive(Deserialize)]
struct RawSchema {
    #[serde(rename = "queryType")]
    query_type: Option<RawNamed>,
    types: Vec<SchemaType>,
}

#[derive(Deserialize)]
struct RawNamed {
    name: String,
}

/// Fetches the API schema as a flat type list.
///
/// Internal `__`-prefixed types and fields are removed.
///
/// # Errors
///
/// - [`SchemaError::Transport`] if the request fails
/// - [`SchemaError::Graphql`] if the server rejects the query
/// - [`SchemaError::InvalidIntrospection`] if `__schema` is missing or malformed
pub async fn fetch_schema(transport: &dyn GraphqlTransport) -> Result<Schema, SchemaError> {
    tracing::info!("Fetching API schema via introspection");

    let response = transport.execute(INTROSPECTION_QUERY, None).await?;
    if response.has_errors() && response.data_field("__schema").is_none() {
        return Err(SchemaError::Graphql {
            message: response.error_summary(),
        });
    }

    let raw = response
        .data_field("__schema")
        .cloned()
        .ok_or_else(|| SchemaError::InvalidIntrospection {
            reason: "response has no '__schema' member".to_string(),
        })?;

    let raw: RawSchema =
        serde_json::from_value(raw).map_err(|e| SchemaError::InvalidIntrospection {
            reason: e.to_string(),
        })?;

    let types: Vec<SchemaType> = raw
        .types
        .into_iter()
        .filter(|t| !t.name.starts_with("__"))
        .map(|mut t| {
            t.fields.retain(|f| !f.is_internal());
            t
        })
        .collect();

    tracing::info!("Introspected {} types", types.len());

    Ok(Schema::new(raw.query_type.map(|q| q.name), types))
}
