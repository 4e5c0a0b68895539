//! Cache-or-introspect access to the schema.

use std::sync::Arc;

use crate::clients::GraphqlTransport;
use crate::config::ApiVersion;
use crate::schema::{fetch_schema, Schema, SchemaCache, SchemaError};

/// Supplies the schema for the current API version, introspecting only on a
/// cache miss.
#[derive(Clone)]
pub struct SchemaProvider {
    transport: Arc<dyn GraphqlTransport>,
    cache: SchemaCache,
    api_version: ApiVersion,
}

impl std::fmt::Debug for SchemaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaProvider")
            .field("cache", &self.cache)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SchemaProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        cache: SchemaCache,
        api_version: ApiVersion,
    ) -> Self {
        Self {
            transport,
            cache,
            api_version,
        }
    }

    /// Returns the underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Returns the API version schemas are fetched for.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the schema, from cache when fresh, otherwise introspected and
    /// cached. `force_refresh` skips the cache lookup.
    ///
    /// A failure to write the cache is logged and does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the cache cannot be read or introspection fails.
    pub async fn schema(&self, force_refresh: bool) -> Result<Schema, SchemaError> {
        if !force_refresh {
            if let Some(schema) = self.cache.load_fresh(&self.api_version)? {
                tracing::debug!("Using cached schema for API version {}", self.api_version);
                return Ok(schema);
            }
        }

        let schema = fetch_schema(self.transport.as_ref()).await?;
        if let Err(e) = self.cache.save(&schema, &self.api_version) {
            tracing::warn!("Failed to write schema cache: {}", e);
        }
        Ok(schema)
    }
}
