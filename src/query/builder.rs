//! Schema-driven generation of paginated queries.

use serde::{Deserialize, Serialize};

use crate::query::QueryBuildError;
use crate::schema::{Schema, SchemaField, SchemaType};

/// Resource names whose type name the strip-trailing-`s` rule gets wrong, or
/// that are common enough to pin explicitly.
const SINGULAR_EXCEPTIONS: &[(&str, &str)] = &[
    ("products", "Product"),
    ("orders", "Order"),
    ("customers", "Customer"),
    ("collections", "Collection"),
    ("inventoryItems", "InventoryItem"),
    ("productVariants", "ProductVariant"),
    ("draftOrders", "DraftOrder"),
    ("fulfillmentOrders", "FulfillmentOrder"),
    ("locations", "Location"),
    ("companies", "Company"),
    ("businessEntities", "BusinessEntity"),
    ("codeDiscountNodes", "DiscountCodeNode"),
    ("automaticDiscountNodes", "DiscountAutomaticNode"),
];

/// Limits applied when generating nested selections.
///
/// Full recursive expansion of a type quickly exceeds the API's query cost
/// ceiling, so nested objects and connections only select a handful of leaf
/// fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBuilderOptions {
    /// Maximum scalar/enum sub-fields selected on a nested object, not
    /// counting `id`.
    pub max_subfields: usize,
    /// `first:` argument used for nested connections.
    pub nested_page_size: u32,
}

impl QueryBuilderOptions {
    /// Five sub-fields, nested page size 10.
    pub const DEFAULT: Self = Self {
        max_subfields: 5,
        nested_page_size: 10,
    };
}

impl Default for QueryBuilderOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A generated query plus the top-level node fields it selects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedQuery {
    /// Query text taking `$first: Int!` and `$after: String`.
    pub query: String,
    /// Names of the node fields that made it into the selection.
    pub fields: Vec<String>,
}

/// Builds paginated connection queries from an introspected [`Schema`].
///
/// # Example
///
/// ```rust
/// use shopify_extract::query::{QueryBuilder, QueryBuilderOptions};
/// use shopify_extract::schema::{Schema, SchemaField, SchemaType, TypeKind, TypeRef};
///
/// let schema = Schema::new(None, vec![SchemaType::new(
///     "Product",
///     TypeKind::Object,
///     vec![
///         SchemaField::new("id", TypeRef::named(TypeKind::Scalar, "ID")),
///         SchemaField::new("title", TypeRef::named(TypeKind::Scalar, "String")),
///     ],
/// )]);
///
/// let generated = QueryBuilder::new(&schema, QueryBuilderOptions::default())
///     .build("products", None)
///     .unwrap();
/// assert!(generated.query.contains("products(first: $first, after: $after)"));
/// assert_eq!(generated.fields, vec!["id", "title"]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct QueryBuilder<'a> {
    schema: &'a Schema,
    options: QueryBuilderOptions,
}

impl<'a> QueryBuilder<'a> {
    /// Creates a builder over `schema`.
    #[must_use]
    pub const fn new(schema: &'a Schema, options: QueryBuilderOptions) -> Self {
        Self { schema, options }
    }

    /// Builds a query for the `resource` connection on the root query type.
    ///
    /// With `selected_fields`, only those node fields are considered; unknown
    /// names are skipped. Otherwise every field of the node type is. Fields
    /// that need arguments, union fields, and objects with nothing selectable
    /// are left out.
    ///
    /// # Errors
    ///
    /// - [`QueryBuildError::UnknownType`] if no node type can be resolved
    /// - [`QueryBuildError::NoSelectableFields`] if nothing could be selected
    pub fn build(
        &self,
        resource: &str,
        selected_fields: Option<&[String]>,
    ) -> Result<GeneratedQuery, QueryBuildError> {
        let node_type = self.resolve_node_type(resource)?;

        let candidates: Vec<&SchemaField> = match selected_fields {
            Some(names) if !names.is_empty() => names
                .iter()
                .filter_map(|name| {
                    let field = node_type.field(name.trim());
                    if field.is_none() {
                        tracing::debug!("Skipping unknown field '{}' on {}", name, node_type.name);
                    }
                    field
                })
                .collect(),
            _ => node_type.fields.iter().filter(|f| !f.is_internal()).collect(),
        };

        let mut fields = Vec::new();
        let mut selections = Vec::new();
        for field in candidates {
            if let Some(selection) = self.render_field(field) {
                fields.push(field.name.clone());
                selections.push(selection);
            }
        }

        if selections.is_empty() {
            return Err(QueryBuildError::NoSelectableFields {
                type_name: node_type.name.clone(),
            });
        }

        let body = selections
            .iter()
            .map(|s| format!("        {s}\n"))
            .collect::<String>();
        let query = format!(
            "query($first: Int!, $after: String) {{\n  {resource}(first: $first, after: $after) {{\n    pageInfo {{ hasNextPage endCursor }}\n    edges {{\n      node {{\n{body}      }}\n    }}\n  }}\n}}\n"
        );

        tracing::debug!(
            "Generated query for {} selecting {} fields of {}",
            resource,
            fields.len(),
            node_type.name
        );

        Ok(GeneratedQuery { query, fields })
    }

    fn resolve_node_type(&self, resource: &str) -> Result<&'a SchemaType, QueryBuildError> {
        let type_name = singular_type_name(resource);
        if let Some(ty) = self
            .schema
            .get_type(&type_name)
            .filter(|t| t.kind.has_fields())
        {
            return Ok(ty);
        }

        self.schema
            .root_query_type()
            .and_then(|root| root.field(resource))
            .and_then(|field| field.ty.named_type())
            .and_then(|(name, _)| self.schema.get_type(name))
            .and_then(|connection| self.connection_node_type(connection))
            .ok_or_else(|| QueryBuildError::UnknownType {
                resource: resource.to_string(),
                type_name,
            })
    }

    fn render_field(&self, field: &SchemaField) -> Option<String> {
        if field.has_required_args() {
            return None;
        }
        let (type_name, kind) = field.ty.named_type()?;
        if kind.is_leaf() {
            return Some(field.name.clone());
        }
        if !kind.has_fields() {
            return None;
        }

        let ty = self.schema.get_type(type_name)?;
        if type_name.ends_with("Connection") {
            let node = self.connection_node_type(ty)?;
            let sub = self.leaf_selection(node);
            if sub.is_empty() {
                return None;
            }
            let args = if field.args.is_empty() || field.accepts_arg("first") {
                format!("(first: {})", self.options.nested_page_size)
            } else {
                String::new()
            };
            Some(format!(
                "{}{args} {{ edges {{ node {{ {} }} }} }}",
                field.name,
                sub.join(" ")
            ))
        } else {
            let sub = self.leaf_selection(ty);
            if sub.is_empty() {
                return None;
            }
            let args = if field.ty.is_list() && field.accepts_arg("first") {
                format!("(first: {})", self.options.nested_page_size)
            } else {
                String::new()
            };
            Some(format!("{}{args} {{ {} }}", field.name, sub.join(" ")))
        }
    }

    /// `id` when the type has one, then up to `max_subfields` other leaves.
    fn leaf_selection<'t>(&self, ty: &'t SchemaType) -> Vec<&'t str> {
        let mut selection: Vec<&str> = ty.field("id").map(|f| f.name.as_str()).into_iter().collect();
        selection.extend(
            ty.fields
                .iter()
                .filter(|f| f.name != "id" && !f.is_internal() && !f.has_required_args())
                .filter(|f| f.ty.named_type().is_some_and(|(_, kind)| kind.is_leaf()))
                .map(|f| f.name.as_str())
                .take(self.options.max_subfields),
        );
        selection
    }

    /// Resolves `XConnection` to `X` via `edges.node`, then `nodes`, then by
    /// stripping the suffix.
    fn connection_node_type(&self, connection: &SchemaType) -> Option<&'a SchemaType> {
        let via_edges = connection
            .field("edges")
            .and_then(|edges| edges.ty.named_type())
            .and_then(|(edge, _)| self.schema.get_type(edge))
            .and_then(|edge| edge.field("node"))
            .and_then(|node| node.ty.named_type());
        let via_nodes = || connection.field("nodes").and_then(|n| n.ty.named_type());

        via_edges
            .or_else(via_nodes)
            .and_then(|(name, _)| self.schema.get_type(name))
            .or_else(|| {
                connection
                    .name
                    .strip_suffix("Connection")
                    .and_then(|name| self.schema.get_type(name))
            })
            .filter(|t| t.kind.has_fields())
    }
}

/// Resolves a connection resource name such as `products` to its node type
/// name (`Product`).
///
/// Names missing from the exception table drop one trailing `s` and have
/// their first letter capitalized.
#[must_use]
pub fn singular_type_name(resource: &str) -> String {
    if let Some((_, name)) = SINGULAR_EXCEPTIONS.iter().find(|(r, _)| *r == resource) {
        return (*name).to_string();
    }
    let stem = resource.strip_suffix('s').unwrap_or(resource);
    let mut chars = stem.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
