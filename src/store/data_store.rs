//! JSON files of extracted records under a data directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::config::SCHEMA_CACHE_FILE;
use crate::store::{flatten_records_to_csv, StoreError};

/// Subdirectory holding per-page files.
pub const PAGES_DIR: &str = "pages";

/// Writes and reads extraction output.
///
/// A finished extraction is one file `{resource}_{timestamp}.json` holding
/// the full record array. Per-page files go to `pages/` so they stay on disk
/// when a run fails part way.
///
/// # Example
///
/// ```rust,no_run
/// use shopify_extract::store::DataStore;
/// use serde_json::json;
///
/// let store = DataStore::new("data");
/// let path = store.save_records("products", &[json!({"id": "gid://shopify/Product/1"})])?;
/// assert_eq!(store.load(&path)?.len(), 1);
/// # Ok::<(), shopify_extract::store::StoreError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the records of a finished extraction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory or file cannot be written.
    pub fn save_records(&self, resource: &str, records: &[Value]) -> Result<PathBuf, StoreError> {
        let path = self
            .dir
            .join(format!("{}_{}.json", file_stem(resource), timestamp()));
        self.write_json(&path, records)?;
        tracing::info!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Writes one fetched page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory or file cannot be written.
    pub fn save_page(
        &self,
        resource: &str,
        page: u32,
        records: &[Value],
    ) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(PAGES_DIR).join(format!(
            "{}_page{page:04}_{}.json",
            file_stem(resource),
            timestamp()
        ));
        self.write_json(&path, records)?;
        tracing::debug!("Saved page {} of {} to {}", page, resource, path.display());
        Ok(path)
    }

    /// Writes the records as CSV next to the JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save_csv(&self, resource: &str, records: &[Value]) -> Result<PathBuf, StoreError> {
        let path = self
            .dir
            .join(format!("{}_{}.csv", file_stem(resource), timestamp()));
        self.ensure_parent(&path)?;
        std::fs::write(&path, flatten_records_to_csv(records)).map_err(|source| {
            StoreError::Io {
                path: path.clone(),
                source,
            }
        })?;
        tracing::info!("Saved CSV export to {}", path.display());
        Ok(path)
    }

    /// Lists saved extraction files, oldest first. Page files and the schema
    /// cache are not included.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|ext| ext == "json")
                    && path.file_name().is_some_and(|name| name != SCHEMA_CACHE_FILE)
            })
            .collect();
        files.sort_by_key(|path| {
            std::fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
        });
        Ok(files)
    }

    /// Reads a saved record array.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or is not a JSON
    /// array.
    pub fn load(&self, path: &Path) -> Result<Vec<Value>, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Array(records) => Ok(records),
            _ => Err(StoreError::NotRecords {
                path: path.to_path_buf(),
            }),
        }
    }

    fn write_json(&self, path: &Path, records: &[Value]) -> Result<(), StoreError> {
        self.ensure_parent(path)?;
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), StoreError> {
        let parent = path.parent().unwrap_or(&self.dir);
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })
    }
}

/// UTC time with `-` in place of `:` so it is safe in file names.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string()
}

fn file_stem(resource: &str) -> String {
    resource
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_records_names_file_by_resource_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("data"));

        let path = store
            .save_records("products", &[json!({"id": 1}), json!({"id": 2})])
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("products_20"));
        assert!(name.ends_with("Z.json"));
        assert!(!name.contains(':'));
        assert_eq!(store.load(&path).unwrap(), vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn test_list_skips_pages_and_schema_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        std::fs::write(dir.path().join(SCHEMA_CACHE_FILE), "{}").unwrap();

        store.save_page("orders", 1, &[json!({"id": 1})]).unwrap();
        let saved = store.save_records("orders", &[json!({"id": 1})]).unwrap();

        assert_eq!(store.list().unwrap(), vec![saved]);
        assert_eq!(
            std::fs::read_dir(dir.path().join(PAGES_DIR)).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_list_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        std::fs::write(&path, r#"{"id": 1}"#).unwrap();

        let result = DataStore::new(dir.path()).load(&path);
        assert!(matches!(result, Err(StoreError::NotRecords { .. })));
    }

    #[test]
    fn test_file_stem_replaces_unsafe_characters() {
        assert_eq!(file_stem("products_with_variants"), "products_with_variants");
        assert_eq!(file_stem("../etc/passwd"), "___etc_passwd");
    }

    #[test]
    fn test_save_csv_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());

        let path = store
            .save_csv("products", &[json!({"id": "1", "title": "Hat"})])
            .unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "id,title\n1,Hat\n");
    }
}
