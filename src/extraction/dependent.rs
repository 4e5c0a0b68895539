//! Primary pagination followed by batched per-identifier secondary queries.

use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use crate::config::{DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE};
use crate::extraction::paginator::pause;
use crate::extraction::{ExtractionError, ExtractionStatus, Paginator, ProgressRange};
use crate::query::{extract_ids, join_by_id, DependentTemplate};

/// A secondary query for one identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct SecondaryRequest {
    /// Query text.
    pub query: String,
    /// Variables carrying the identifier.
    pub variables: Value,
}

/// The `data` of one secondary response, possibly partial.
#[derive(Clone, Debug, PartialEq)]
pub struct SecondaryResult {
    /// The identifier queried.
    pub id: String,
    /// The response's `data` object.
    pub data: Value,
}

/// Builds the secondary query for an identifier.
pub type SecondaryQueryBuilder = Box<dyn Fn(&str) -> SecondaryRequest + Send + Sync>;
/// Pulls child identifiers out of one page of primary records.
pub type IdExtractor = Box<dyn Fn(&[Value]) -> Vec<String> + Send + Sync>;
/// Combines all primary records with all secondary results.
pub type ResultMerger = Box<dyn FnOnce(Vec<Value>, Vec<SecondaryResult>) -> Vec<Value> + Send>;

/// Everything the executor needs for one dependent extraction.
pub struct DependentQuery {
    primary_query: String,
    primary_variables: Option<Value>,
    resource_key: String,
    secondary_query: SecondaryQueryBuilder,
    id_extractor: IdExtractor,
    merger: ResultMerger,
    batch_size: usize,
    batch_delay: Duration,
}

impl std::fmt::Debug for DependentQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependentQuery")
            .field("resource_key", &self.resource_key)
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .finish_non_exhaustive()
    }
}

impl DependentQuery {
    /// Creates a dependent query with the default batch size and delay.
    #[must_use]
    pub fn new(
        primary_query: impl Into<String>,
        resource_key: impl Into<String>,
        secondary_query: impl Fn(&str) -> SecondaryRequest + Send + Sync + 'static,
        id_extractor: impl Fn(&[Value]) -> Vec<String> + Send + Sync + 'static,
        merger: impl FnOnce(Vec<Value>, Vec<SecondaryResult>) -> Vec<Value> + Send + 'static,
    ) -> Self {
        Self {
            primary_query: primary_query.into(),
            primary_variables: None,
            resource_key: resource_key.into(),
            secondary_query: Box::new(secondary_query),
            id_extractor: Box::new(id_extractor),
            merger: Box::new(merger),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Wires a declarative template: identifiers come from its id path and
    /// each record gets its matched secondary records under the merge key.
    #[must_use]
    pub fn from_template(
        primary_query: impl Into<String>,
        resource_key: impl Into<String>,
        template: DependentTemplate,
    ) -> Self {
        Self::new(
            primary_query,
            resource_key,
            move |id| SecondaryRequest {
                query: template.secondary_query.to_string(),
                variables: template.variables(id),
            },
            move |records| extract_ids(records, template.id_path),
            move |records, results| {
                let details = results.into_iter().filter_map(|result| {
                    result
                        .data
                        .get(template.secondary_key)
                        .filter(|v| !v.is_null())
                        .cloned()
                        .map(|detail| (result.id, detail))
                });
                join_by_id(records, details, template.id_path, template.merge_key)
            },
        )
    }

    /// Sets variables sent with every primary page.
    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        self.primary_variables = Some(variables);
        self
    }

    /// Sets how many secondary queries run at once. Zero is treated as one.
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the pause between batches.
    #[must_use]
    pub const fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

/// Progress after `batch` of `total` batches: `50 + floor(batch * 50 / total)`.
#[must_use]
pub fn batch_progress(batch: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let share = batch.min(total) * 50 / total;
    50 + u8::try_from(share).unwrap_or(50)
}

/// Runs a [`DependentQuery`] in three phases.
///
/// 1. Primary pages are fetched like [`Paginator::fetch_all`], collecting
///    identifiers from each page; progress 0-50.
/// 2. Identifiers are split into batches. The queries of a batch run
///    concurrently and the batch settles before the next starts; progress
///    50-100. GraphQL errors for one identifier are logged and whatever
///    data came back is kept. A transport error fails the run once its
///    batch has settled.
/// 3. The merger is called once with everything collected.
pub struct DependentExecutor<'a> {
    paginator: Paginator<'a>,
}

impl<'a> DependentExecutor<'a> {
    /// Creates an executor paging the primary query with `paginator`.
    #[must_use]
    pub fn new(paginator: Paginator<'a>) -> Self {
        Self {
            paginator: paginator.with_progress_range(ProgressRange::new(0, 50)),
        }
    }

    /// Runs the extraction and returns the merged records.
    ///
    /// # Errors
    ///
    /// Returns any error of the primary fetch, a secondary transport error,
    /// or [`ExtractionError::Cancelled`].
    pub async fn execute(&self, request: DependentQuery) -> Result<Vec<Value>, ExtractionError> {
        let DependentQuery {
            primary_query,
            primary_variables,
            resource_key,
            secondary_query,
            id_extractor,
            merger,
            batch_size,
            batch_delay,
        } = request;
        let tracker = self.paginator.tracker();
        let transport = self.paginator.transport();
        let cancel = self.paginator.cancellation();

        tracker.set_status(ExtractionStatus::FetchingPrimary);
        tracker.info(format!("Phase 1: fetching {resource_key}"));

        let mut ids: Vec<String> = Vec::new();
        let records = self
            .paginator
            .fetch_pages(&primary_query, primary_variables, &resource_key, |page| {
                ids.extend(id_extractor(page));
            })
            .await?;

        tracker.info(format!(
            "Phase 1 complete: {} {resource_key}, {} identifiers",
            records.len(),
            ids.len()
        ));

        let mut results = Vec::new();
        if ids.is_empty() {
            tracker.info("No identifiers found; skipping secondary queries");
        } else {
            tracker.set_status(ExtractionStatus::FetchingSecondary);
            let total_batches = ids.len().div_ceil(batch_size);
            tracker.info(format!(
                "Phase 2: fetching {} records in {total_batches} batches of up to {batch_size}",
                ids.len()
            ));

            let mut processed = 0;
            for (index, batch) in ids.chunks(batch_size).enumerate() {
                if cancel.is_cancelled() {
                    return Err(ExtractionError::Cancelled);
                }

                let requests = batch.iter().map(|id| {
                    let request = secondary_query(id);
                    async move {
                        let outcome = transport
                            .execute(&request.query, Some(request.variables))
                            .await;
                        (id, outcome)
                    }
                });
                let outcomes = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(ExtractionError::Cancelled),
                    outcomes = join_all(requests) => outcomes,
                };

                let mut failure = None;
                for (id, outcome) in outcomes {
                    match outcome {
                        Ok(response) => {
                            if response.has_errors() {
                                tracker.warn(format!(
                                    "Secondary query for {id} returned errors: {}",
                                    response.error_summary()
                                ));
                            }
                            if let Some(data) = response.data {
                                results.push(SecondaryResult {
                                    id: id.clone(),
                                    data,
                                });
                            }
                        }
                        Err(e) => {
                            failure.get_or_insert(e);
                        }
                    }
                }
                if let Some(e) = failure {
                    return Err(e.into());
                }

                let batch_number = index + 1;
                processed += batch.len();
                tracker.set_records(processed, ids.len());
                tracker.set_progress(batch_progress(batch_number, total_batches));
                tracker.info(format!(
                    "Completed batch {batch_number}/{total_batches} ({processed}/{} records)",
                    ids.len()
                ));

                if batch_number < total_batches {
                    pause(cancel, batch_delay).await?;
                }
            }
        }

        tracker.set_status(ExtractionStatus::Processing);
        tracker.info(format!(
            "Merging {} secondary results into {} records",
            results.len(),
            records.len()
        ));
        Ok(merger(records, results))
    }
}
