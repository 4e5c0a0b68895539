//! Single-file schema cache keyed by API version.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ApiVersion;
use crate::schema::{Schema, SchemaError};

/// The persisted cache document: `{apiVersion, timestamp, schema}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCacheEntry {
    /// API version the schema was fetched for.
    pub api_version: ApiVersion,
    /// When the schema was fetched.
    pub timestamp: DateTime<Utc>,
    /// The cached schema.
    pub schema: Schema,
}

/// Summary of the cache file for inspection without loading the schema
/// into the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCacheInfo {
    /// API version the schema was fetched for.
    pub api_version: ApiVersion,
    /// When the schema was fetched.
    pub timestamp: DateTime<Utc>,
    /// Number of cached types.
    pub type_count: usize,
    /// Whether the entry matches the current credentials' version.
    pub fresh: bool,
}

/// Schema cache stored as one JSON file.
///
/// An entry is fresh only when its API version equals the caller's current
/// version; there is no time-based expiry.
///
/// # Example
///
/// ```rust,no_run
/// use shopify_extract::schema::{Schema, SchemaCache};
/// use shopify_extract::ApiVersion;
///
/// let cache = SchemaCache::new("data/schema_cache.json");
/// cache.save(&Schema::default(), &ApiVersion::V2025_01)?;
/// assert!(cache.load_fresh(&ApiVersion::V2025_01)?.is_some());
/// assert!(cache.load_fresh(&ApiVersion::V2025_04)?.is_none());
/// # Ok::<(), shopify_extract::schema::SchemaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SchemaCache {
    path: PathBuf,
}

impl SchemaCache {
    /// Creates a cache backed by `path`. Nothing is read until [`load`](Self::load).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cache entry.
    ///
    /// A missing file is a miss. An unreadable JSON document is also treated
    /// as a miss, with a warning, so a corrupt cache never blocks extraction.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<SchemaCacheEntry>, SchemaError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SchemaError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable schema cache at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Loads the cached schema only if it was fetched for `api_version`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_fresh(&self, api_version: &ApiVersion) -> Result<Option<Schema>, SchemaError> {
        Ok(self.load()?.and_then(|entry| {
            if &entry.api_version == api_version {
                Some(entry.schema)
            } else {
                tracing::debug!(
                    "Schema cache is for {} but {} is in use; treating as a miss",
                    entry.api_version,
                    api_version
                );
                None
            }
        }))
    }

    /// Writes `schema` for `api_version`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] or [`SchemaError::Json`] on failure.
    pub fn save(&self, schema: &Schema, api_version: &ApiVersion) -> Result<(), SchemaError> {
        let entry = SchemaCacheEntry {
            api_version: api_version.clone(),
            timestamp: Utc::now(),
            schema: schema.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SchemaError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| SchemaError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            "Cached {} schema types for API version {} at {}",
            schema.len(),
            api_version,
            self.path.display()
        );
        Ok(())
    }

    /// Deletes the cache file. Returns `true` if a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Io`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, SchemaError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Cleared schema cache at {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SchemaError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Summarizes the cache entry relative to `current_version`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn info(&self, current_version: &ApiVersion) -> Result<Option<SchemaCacheInfo>, SchemaError> {
        Ok(self.load()?.map(|entry| SchemaCacheInfo {
            fresh: &entry.api_version == current_version,
            type_count: entry.schema.len(),
            api_version: entry.api_version,
            timestamp: entry.timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaField, SchemaType, TypeKind, TypeRef};

    fn sample_schema() -> Schema {
        Schema::new(
            Some("QueryRoot".to_string()),
            vec![SchemaType::new(
                "Product",
                TypeKind::Object,
                vec![
                    SchemaField::new(
                        "id",
                        TypeRef::non_null(TypeRef::named(TypeKind::Scalar, "ID")),
                    ),
                    SchemaField::new("title", TypeRef::named(TypeKind::Scalar, "String")),
                ],
            )],
        )
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("nested").join("schema_cache.json"));
        let version: ApiVersion = "2025-01".parse().unwrap();

        cache.save(&sample_schema(), &version).unwrap();
        let entry = cache.load().unwrap().unwrap();

        assert_eq!(entry.api_version.to_string(), "2025-01");
        assert_eq!(entry.schema, sample_schema());
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("schema_cache.json"));
        cache.save(&sample_schema(), &ApiVersion::V2025_01).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(raw["apiVersion"], "2025-01");
        assert!(raw["timestamp"].is_string());
        assert!(raw["schema"]["types"].is_array());
    }

    #[test]
    fn test_clear_then_load_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("schema_cache.json"));
        cache.save(&sample_schema(), &ApiVersion::V2025_01).unwrap();

        assert!(cache.clear().unwrap());
        assert!(cache.load().unwrap().is_none());
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn test_version_mismatch_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SchemaCache::new(dir.path().join("schema_cache.json"));
        cache.save(&sample_schema(), &ApiVersion::V2025_01).unwrap();

        assert!(cache.load_fresh(&ApiVersion::V2025_01).unwrap().is_some());
        assert!(cache.load_fresh(&ApiVersion::V2025_04).unwrap().is_none());

        let info = cache.info(&ApiVersion::V2025_04).unwrap().unwrap();
        assert!(!info.fresh);
        assert_eq!(info.type_count, 1);
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(SchemaCache::new(path).load().unwrap().is_none());
    }
}
