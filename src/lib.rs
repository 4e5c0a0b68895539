//! # Shopify Extract
//!
//! Paginated, schema-aware data extraction from the Shopify Admin GraphQL API.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ExtractorConfig`] and [`ExtractorConfigBuilder`]
//! - Validated newtypes for store credentials
//! - An async GraphQL client with retry handling ([`clients::GraphqlClient`])
//! - Schema introspection with a per-API-version file cache ([`schema`])
//! - Query generation from the schema and validation of predefined templates
//!   ([`query`])
//! - Cursor pagination, dependent (primary then per-id secondary) queries and
//!   background sessions with progress tracking ([`extraction`])
//! - JSON and CSV output files ([`store`])
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_extract::{AccessToken, ApiVersion, Credentials, ExtractorConfig, ShopDomain};
//!
//! let config = ExtractorConfig::builder()
//!     .credentials(Credentials::new(
//!         ShopDomain::new("my-store").unwrap(),
//!         AccessToken::new("shpat_token").unwrap(),
//!         None,
//!         ApiVersion::latest(),
//!     ))
//!     .data_dir("data")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.data_dir(), std::path::Path::new("data"));
//! ```
//!
//! ## Running an Extraction
//!
//! ```rust,no_run
//! use shopify_extract::extraction::{ExtractionRequest, Extractor};
//! use shopify_extract::{Credentials, ExtractorConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::builder()
//!     .credentials(Credentials::from_env()?)
//!     .build()?;
//! let extractor = Extractor::new(config);
//!
//! let session = extractor.start(ExtractionRequest::resource("products"))?;
//! let snapshot = extractor.wait(session).await?;
//! println!("{}: {} records", snapshot.status, snapshot.records_processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: newtypes validate on construction
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;
pub mod extraction;
pub mod query;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public types at crate root for convenience
pub use config::{
    AccessToken, ApiVersion, ClientId, Credentials, ExtractorConfig, ExtractorConfigBuilder,
    HostUrl, ShopDomain,
};
pub use error::ConfigError;

pub use clients::{GraphqlClient, GraphqlError, GraphqlResponse, GraphqlTransport};
pub use extraction::{ExtractionError, ExtractionRequest, ExtractionStatus, Extractor};
