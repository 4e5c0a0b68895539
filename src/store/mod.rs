//! Extraction output on disk.
//!
//! - [`DataStore`]: timestamped JSON record files and per-page files
//! - [`flatten_records_to_csv`]: CSV export of nested records

mod csv;
mod data_store;
mod errors;

pub use csv::flatten_records_to_csv;
pub use data_store::{DataStore, PAGES_DIR};
pub use errors::StoreError;
