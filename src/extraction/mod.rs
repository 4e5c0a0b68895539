//! The extraction engine.
//!
//! # Overview
//!
//! - [`Paginator`]: follows cursor pagination over one root connection
//! - [`DependentExecutor`]: runs a primary pagination, then one secondary
//!   query per collected identifier, in batches
//! - [`ExtractionTracker`]: shared status, progress and log of a run
//! - [`Extractor`]: starts runs in the background and tracks them by
//!   session id
//!
//! # Progress
//!
//! Progress never decreases and stays below 100 until the run completes.
//! A plain pagination reports `90 * p / (p + 1)` after page `p` while more
//! pages remain. A dependent run maps its primary phase into `0..=50` and
//! reports `50 + 50 * n / total` after secondary batch `n`.

mod dependent;
mod errors;
mod extractor;
mod paginator;
mod state;

pub use dependent::{
    batch_progress, DependentExecutor, DependentQuery, IdExtractor, ResultMerger,
    SecondaryQueryBuilder, SecondaryRequest, SecondaryResult,
};
pub use errors::ExtractionError;
pub use extractor::{ExtractionRequest, Extractor, SessionId, RETAINED_SESSIONS};
pub use paginator::{
    page_progress, PageResult, PaginationSettings, Paginator, QueryFallback, SchemaFallback,
};
pub use state::{
    ExtractionSnapshot, ExtractionStatus, ExtractionTracker, LogEntry, LogLevel, ProgressRange,
};
