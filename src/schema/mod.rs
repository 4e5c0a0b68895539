//! API schema introspection, caching and the flat type model.
//!
//! - [`fetch_schema`]: runs [`INTROSPECTION_QUERY`] and returns a [`Schema`]
//! - [`SchemaCache`]: one JSON file `{apiVersion, timestamp, schema}`
//! - [`SchemaProvider`]: cache-or-introspect for the current API version

mod cache;
mod errors;
mod introspection;
mod provider;
mod types;

pub use cache::{SchemaCache, SchemaCacheEntry, SchemaCacheInfo};
pub use errors::SchemaError;
pub use introspection::{fetch_schema, INTROSPECTION_QUERY};
pub use provider::SchemaProvider;
pub use types::{Schema, SchemaArgument, SchemaField, SchemaType, TypeKind, TypeRef};
