//! Configuration types for the extractor.
//!
//! # Overview
//!
//! - [`Credentials`]: store domain, access token, client ID and API version
//! - [`ExtractorConfig`]: credentials plus pagination, batching, storage and
//!   query-generation settings
//! - [`ExtractorConfigBuilder`]: fluent builder for [`ExtractorConfig`]
//! - Validated newtypes: [`ShopDomain`], [`AccessToken`], [`ClientId`],
//!   [`HostUrl`], [`ApiVersion`]
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use shopify_extract::{AccessToken, ApiVersion, Credentials, ExtractorConfig, ShopDomain};
//!
//! let credentials = Credentials::new(
//!     ShopDomain::new("my-store").unwrap(),
//!     AccessToken::new("shpat_token").unwrap(),
//!     None,
//!     ApiVersion::V2025_01,
//! );
//!
//! let config = ExtractorConfig::builder()
//!     .credentials(credentials)
//!     .batch_size(10)
//!     .page_delay(Duration::from_millis(250))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.batch_size(), 10);
//! ```

mod credentials;
mod newtypes;
mod version;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use credentials::{
    Credentials, ENV_ACCESS_TOKEN, ENV_API_VERSION, ENV_CLIENT_ID, ENV_STORE,
};
pub use newtypes::{AccessToken, ClientId, HostUrl, ShopDomain};
pub use version::ApiVersion;

use crate::error::ConfigError;
use crate::query::QueryBuilderOptions;

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Default pause between consecutive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
/// Default number of secondary queries issued concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Default pause between secondary query batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);
/// Default directory for extraction output.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default file name of the schema cache inside the data directory.
pub const SCHEMA_CACHE_FILE: &str = "schema_cache.json";

/// Configuration for an extraction run.
///
/// `ExtractorConfig` is `Clone`, `Send` and `Sync` so it can be shared with
/// background extraction tasks.
#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    credentials: Credentials,
    api_host: Option<HostUrl>,
    data_dir: PathBuf,
    schema_cache_path: PathBuf,
    page_size: u32,
    page_delay: Duration,
    batch_size: usize,
    batch_delay: Duration,
    request_tries: u32,
    request_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
    persist_pages: bool,
    query_builder: QueryBuilderOptions,
}

impl ExtractorConfig {
    /// Creates a new builder for constructing an `ExtractorConfig`.
    #[must_use]
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }

    /// Returns the store credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the API host override, if configured.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Returns the directory extraction output is written to.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the schema cache file path.
    #[must_use]
    pub fn schema_cache_path(&self) -> &Path {
        &self.schema_cache_path
    }

    /// Returns the number of records requested per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the pause between page requests.
    #[must_use]
    pub const fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Returns the number of secondary queries issued concurrently.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the pause between secondary query batches.
    #[must_use]
    pub const fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Returns how many times a request is attempted on 429/500 responses.
    #[must_use]
    pub const fn request_tries(&self) -> u32 {
        self.request_tries
    }

    /// Returns the per-request timeout, if any.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns whether each fetched page is also written to the data directory.
    #[must_use]
    pub const fn persist_pages(&self) -> bool {
        self.persist_pages
    }

    /// Returns the dynamic query generation limits.
    #[must_use]
    pub const fn query_builder(&self) -> &QueryBuilderOptions {
        &self.query_builder
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ExtractorConfig>();
};

/// Builder for [`ExtractorConfig`].
///
/// Only `credentials` is required.
///
/// # Defaults
///
/// - `data_dir`: `data`
/// - `schema_cache_path`: `<data_dir>/schema_cache.json`
/// - `page_size`: 50, `page_delay`: 500ms
/// - `batch_size`: 5, `batch_delay`: 500ms
/// - `request_tries`: 1 (no automatic retries)
/// - `request_timeout`: `None`
/// - `persist_pages`: `false`
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    credentials: Option<Credentials>,
    api_host: Option<HostUrl>,
    data_dir: Option<PathBuf>,
    schema_cache_path: Option<PathBuf>,
    page_size: Option<u32>,
    page_delay: Option<Duration>,
    batch_size: Option<usize>,
    batch_delay: Option<Duration>,
    request_tries: Option<u32>,
    request_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
    persist_pages: Option<bool>,
    query_builder: Option<QueryBuilderOptions>,
}

impl ExtractorConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store credentials (required).
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Routes requests to this origin instead of the store domain.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the schema cache file path.
    #[must_use]
    pub fn schema_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_cache_path = Some(path.into());
        self
    }

    /// Sets the number of records requested per page.
    #[must_use]
    pub const fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the pause between page requests.
    #[must_use]
    pub const fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    /// Sets the number of secondary queries issued concurrently.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets the pause between secondary query batches.
    #[must_use]
    pub const fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    /// Sets how many times a request is attempted on 429/500 responses.
    #[must_use]
    pub const fn request_tries(mut self, tries: u32) -> Self {
        self.request_tries = Some(tries);
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Writes every fetched page to the data directory as it arrives, so a
    /// failed run still leaves the pages fetched so far on disk.
    #[must_use]
    pub const fn persist_pages(mut self, enabled: bool) -> Self {
        self.persist_pages = Some(enabled);
        self
    }

    /// Overrides the dynamic query generation limits.
    #[must_use]
    pub const fn query_builder(mut self, options: QueryBuilderOptions) -> Self {
        self.query_builder = Some(options);
        self
    }

    /// Builds the [`ExtractorConfig`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRequiredField`] if credentials are not set
    /// - [`ConfigError::InvalidBatchSize`] if the batch size is zero
    /// - [`ConfigError::InvalidPageSize`] if the page size is outside 1..=250
    pub fn build(self) -> Result<ExtractorConfig, ConfigError> {
        let credentials = self.credentials.ok_or(ConfigError::MissingRequiredField {
            field: "credentials",
        })?;

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize { size: batch_size });
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=250).contains(&page_size) {
            return Err(ConfigError::InvalidPageSize { size: page_size });
        }

        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let schema_cache_path = self
            .schema_cache_path
            .unwrap_or_else(|| data_dir.join(SCHEMA_CACHE_FILE));

        Ok(ExtractorConfig {
            credentials,
            api_host: self.api_host,
            data_dir,
            schema_cache_path,
            page_size,
            page_delay: self.page_delay.unwrap_or(DEFAULT_PAGE_DELAY),
            batch_size,
            batch_delay: self.batch_delay.unwrap_or(DEFAULT_BATCH_DELAY),
            request_tries: self.request_tries.unwrap_or(1).max(1),
            request_timeout: self.request_timeout,
            user_agent_prefix: self.user_agent_prefix,
            persist_pages: self.persist_pages.unwrap_or(false),
            query_builder: self.query_builder.unwrap_or_default(),
        })
    }
}
