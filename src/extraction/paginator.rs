//! Cursor pagination over a connection query.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::clients::{GraphqlResponse, GraphqlTransport};
use crate::config::ExtractorConfig;
use crate::extraction::{ExtractionError, ExtractionTracker, ProgressRange};
use crate::query::{QueryBuilder, QueryBuilderOptions};
use crate::schema::SchemaProvider;
use crate::store::DataStore;

/// Page size and pacing for a paginated fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationSettings {
    /// `first` sent when the caller's variables do not set one.
    pub page_size: u32,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
}

impl PaginationSettings {
    /// Takes page size and delay from `config`.
    #[must_use]
    pub const fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            page_size: config.page_size(),
            page_delay: config.page_delay(),
        }
    }
}

/// Supplies a replacement query after the API rejects one with GraphQL
/// errors.
#[async_trait]
pub trait QueryFallback: Send + Sync {
    /// Returns a fresh query for the `resource_key` connection.
    async fn regenerate(&self, resource_key: &str) -> Result<String, ExtractionError>;
}

/// Regenerates queries from the (cached) schema with [`QueryBuilder`].
#[derive(Clone, Debug)]
pub struct SchemaFallback {
    provider: SchemaProvider,
    options: QueryBuilderOptions,
}

impl SchemaFallback {
    /// Creates a fallback over `provider`.
    #[must_use]
    pub const fn new(provider: SchemaProvider, options: QueryBuilderOptions) -> Self {
        Self { provider, options }
    }
}

#[async_trait]
impl QueryFallback for SchemaFallback {
    async fn regenerate(&self, resource_key: &str) -> Result<String, ExtractionError> {
        let schema = self.provider.schema(false).await?;
        let generated = QueryBuilder::new(&schema, self.options).build(resource_key, None)?;
        Ok(generated.query)
    }
}

/// One page of a connection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageResult {
    /// The page's nodes in order.
    pub items: Vec<Value>,
    /// Whether another page follows.
    pub has_next_page: bool,
    /// Cursor of the last node.
    pub end_cursor: Option<String>,
}

impl PageResult {
    /// Reads `data[resource_key]` as a connection.
    ///
    /// Nodes come from `edges[].node`, or from `nodes` when there are no
    /// edges. A missing `pageInfo` reads as the last page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::MissingConnection`] if `data[resource_key]`
    /// is absent or null.
    pub fn from_response(
        response: &GraphqlResponse,
        resource_key: &str,
    ) -> Result<Self, ExtractionError> {
        let connection =
            response
                .data_field(resource_key)
                .ok_or_else(|| ExtractionError::MissingConnection {
                    resource_key: resource_key.to_string(),
                })?;

        let items = if let Some(edges) = connection.get("edges").and_then(Value::as_array) {
            edges.iter().filter_map(|e| e.get("node").cloned()).collect()
        } else {
            connection
                .get("nodes")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };

        let page_info = connection.get("pageInfo");
        Ok(Self {
            items,
            has_next_page: page_info
                .and_then(|p| p.get("hasNextPage"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            end_cursor: page_info
                .and_then(|p| p.get("endCursor"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Progress after `page` pages: 100 on the last page, otherwise
/// `90 * page / (page + 1)`, which rises with every page and stays below 90.
#[must_use]
pub fn page_progress(page: u32, has_next_page: bool) -> u8 {
    if !has_next_page {
        return 100;
    }
    let page = u64::from(page);
    u8::try_from(90 * page / (page + 1)).unwrap_or(89)
}

/// Sleeps for `delay` unless cancelled first.
pub(crate) async fn pause(
    cancel: &CancellationToken,
    delay: Duration,
) -> Result<(), ExtractionError> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        () = cancel.cancelled() => Err(ExtractionError::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Fetches every page of a connection query, in cursor order.
///
/// Each request sends the caller's variables plus `after` (the previous
/// page's end cursor, `null` at first) and `first` when the caller did not
/// set it. When a page comes back with GraphQL errors the query is
/// regenerated once through the [`QueryFallback`] and the same page retried;
/// a second rejection ends the fetch. If regeneration itself fails, the fetch
/// ends with the original rejection. Transport errors end it immediately.
///
/// A failed fetch returns no records. Pages already written through
/// [`with_page_store`](Self::with_page_store) stay on disk.
///
/// Progress follows [`page_progress`] within the configured range. The last
/// page maps to the top of that range, but the tracker holds at 99 until
/// [`ExtractionTracker::complete`] is called, so a standalone fetch ends at
/// 99 and the caller's completion reports 100.
pub struct Paginator<'a> {
    transport: &'a dyn GraphqlTransport,
    tracker: &'a ExtractionTracker,
    settings: PaginationSettings,
    fallback: Option<&'a dyn QueryFallback>,
    store: Option<&'a DataStore>,
    cancel: CancellationToken,
    range: ProgressRange,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator reporting into `tracker`.
    #[must_use]
    pub fn new(
        transport: &'a dyn GraphqlTransport,
        tracker: &'a ExtractionTracker,
        settings: PaginationSettings,
    ) -> Self {
        Self {
            transport,
            tracker,
            settings,
            fallback: None,
            store: None,
            cancel: CancellationToken::new(),
            range: ProgressRange::FULL,
        }
    }

    /// Enables one query regeneration per fetch.
    #[must_use]
    pub fn with_fallback(mut self, fallback: &'a dyn QueryFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Writes every page to `store` as it arrives.
    #[must_use]
    pub fn with_page_store(mut self, store: &'a DataStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Stops the fetch when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reports progress within `range` instead of 0-100.
    #[must_use]
    pub fn with_progress_range(mut self, range: ProgressRange) -> Self {
        self.range = range;
        self
    }

    pub(crate) const fn transport(&self) -> &'a dyn GraphqlTransport {
        self.transport
    }

    pub(crate) const fn tracker(&self) -> &'a ExtractionTracker {
        self.tracker
    }

    pub(crate) const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetches all pages and returns their nodes.
    ///
    /// # Errors
    ///
    /// See [`fetch_pages`](Self::fetch_pages).
    pub async fn fetch_all(
        &self,
        query: &str,
        variables: Option<Value>,
        resource_key: &str,
    ) -> Result<Vec<Value>, ExtractionError> {
        self.fetch_pages(query, variables, resource_key, |_| {})
            .await
    }

    /// Fetches all pages, handing each page's nodes to `on_page` before they
    /// are accumulated.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::Transport`] on a transport failure
    /// - [`ExtractionError::Graphql`] or [`ExtractionError::SchemaIncompatible`]
    ///   when the query is rejected and no regeneration is left
    /// - [`ExtractionError::MissingConnection`] when `data[resource_key]` is absent
    /// - [`ExtractionError::Cancelled`] when cancelled
    pub async fn fetch_pages<F>(
        &self,
        query: &str,
        variables: Option<Value>,
        resource_key: &str,
        mut on_page: F,
    ) -> Result<Vec<Value>, ExtractionError>
    where
        F: FnMut(&[Value]) + Send,
    {
        let mut base = match variables {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        base.entry("first")
            .or_insert_with(|| Value::from(self.settings.page_size));

        let mut query = query.to_string();
        let mut regenerated = false;
        let mut cursor: Option<String> = None;
        let mut records = Vec::new();
        let mut page_number = 0u32;

        loop {
            let mut page_variables = base.clone();
            page_variables.insert(
                "after".to_string(),
                cursor.clone().map_or(Value::Null, Value::String),
            );
            let page_variables = Value::Object(page_variables);

            let mut response = self.execute(&query, &page_variables).await?;
            if response.has_errors() {
                let error = ExtractionError::from_response(&response);
                match self.fallback {
                    Some(fallback) if !regenerated => {
                        regenerated = true;
                        self.tracker.warn(format!(
                            "{error}; regenerating the {resource_key} query from the schema"
                        ));
                        query = match fallback.regenerate(resource_key).await {
                            Ok(regenerated) => regenerated,
                            Err(ExtractionError::Cancelled) => return Err(ExtractionError::Cancelled),
                            Err(e) => {
                                self.tracker.error(format!(
                                    "Could not regenerate the {resource_key} query: {e}"
                                ));
                                return Err(error);
                            }
                        };
                        response = self.execute(&query, &page_variables).await?;
                        if response.has_errors() {
                            return Err(ExtractionError::from_response(&response));
                        }
                    }
                    _ => return Err(error),
                }
            }

            let page = PageResult::from_response(&response, resource_key)?;
            page_number += 1;
            let count = page.items.len();

            if let Some(store) = self.store {
                if let Err(e) = store.save_page(resource_key, page_number, &page.items) {
                    self.tracker
                        .warn(format!("Could not save page {page_number}: {e}"));
                }
            }

            on_page(&page.items);
            records.extend(page.items);

            self.tracker.set_records(records.len(), records.len());
            self.tracker
                .set_progress(self.range.map(page_progress(page_number, page.has_next_page)));
            self.tracker.info(format!(
                "Fetched page {page_number} of {resource_key}: {count} records ({} total)",
                records.len()
            ));

            if !page.has_next_page {
                break;
            }
            match page.end_cursor {
                Some(end_cursor) => cursor = Some(end_cursor),
                None => {
                    self.tracker.warn(format!(
                        "Page {page_number} of {resource_key} reports more pages but no end cursor; stopping"
                    ));
                    break;
                }
            }

            pause(&self.cancel, self.settings.page_delay).await?;
        }

        Ok(records)
    }

    async fn execute(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<GraphqlResponse, ExtractionError> {
        if self.cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ExtractionError::Cancelled),
            result = self.transport.execute(query, Some(variables.clone())) => {
                result.map_err(ExtractionError::from)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::GraphqlErrorEntry;
    use crate::extraction::LogLevel;
    use crate::schema::SchemaError;
    use crate::testing::{connection_page, transport_error, ScriptedTransport};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const QUERY: &str = "query($first: Int!, $after: String) { products(first: $first, after: $after) { pageInfo { hasNextPage endCursor } edges { node { id } } } }";

    fn settings() -> PaginationSettings {
        PaginationSettings {
            page_size: 3,
            page_delay: Duration::ZERO,
        }
    }

    fn products(ids: &[u32]) -> Vec<Value> {
        ids.iter().map(|id| json!({ "id": id })).collect()
    }

    struct StaticFallback {
        query: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryFallback for StaticFallback {
        async fn regenerate(&self, _resource_key: &str) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.query.to_string())
        }
    }

    fn fallback() -> StaticFallback {
        StaticFallback {
            query: "query Regenerated { products { edges { node { id } } } }",
            calls: AtomicUsize::new(0),
        }
    }

    fn rejected() -> GraphqlResponse {
        GraphqlResponse::with_errors(vec![GraphqlErrorEntry::new(
            "Field 'bodyHtml' doesn't exist on type 'Product'",
        )])
    }

    #[tokio::test]
    async fn test_fetch_all_accumulates_pages_in_order() {
        let transport = ScriptedTransport::new(vec![
            Ok(connection_page("products", products(&[1, 2, 3]), true, Some("c1"))),
            Ok(connection_page("products", products(&[4, 5]), false, Some("c2"))),
        ]);
        let tracker = ExtractionTracker::new();

        let records = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();

        assert_eq!(records, products(&[1, 2, 3, 4, 5]));

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].variables, Some(json!({"first": 3, "after": null})));
        assert_eq!(calls[1].variables, Some(json!({"first": 3, "after": "c1"})));
    }

    #[tokio::test]
    async fn test_caller_variables_are_kept_and_first_not_overridden() {
        let transport = ScriptedTransport::new(vec![Ok(connection_page(
            "products",
            products(&[1]),
            false,
            None,
        ))]);
        let tracker = ExtractionTracker::new();

        Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, Some(json!({"first": 100, "query": "status:active"})), "products")
            .await
            .unwrap();

        assert_eq!(
            transport.calls()[0].variables,
            Some(json!({"first": 100, "query": "status:active", "after": null}))
        );
    }

    #[tokio::test]
    async fn test_progress_rises_per_page_and_never_hits_100_early() {
        let tracker = ExtractionTracker::new();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let pages = Arc::new(Mutex::new(vec![
            connection_page("products", products(&[5]), false, None),
            connection_page("products", products(&[3, 4]), true, Some("c2")),
            connection_page("products", products(&[1, 2]), true, Some("c1")),
        ]));

        let transport = {
            let tracker = tracker.clone();
            let observed = Arc::clone(&observed);
            ScriptedTransport::with_handler(move |_, _| {
                observed.lock().unwrap().push(tracker.progress());
                Ok(pages.lock().unwrap().pop().unwrap())
            })
        };

        let records = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(*observed.lock().unwrap(), vec![0, 45, 60]);
        // 100 is reserved for completion.
        assert_eq!(tracker.progress(), 99);
        assert_eq!(tracker.snapshot().log.len(), 3);
    }

    #[tokio::test]
    async fn test_last_page_holds_at_99_until_completion() {
        let transport = ScriptedTransport::new(vec![Ok(connection_page(
            "products",
            products(&[1, 2]),
            false,
            None,
        ))]);
        let tracker = ExtractionTracker::new();

        let records = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();

        assert_eq!(ProgressRange::FULL.map(page_progress(1, false)), 100);
        assert_eq!(tracker.progress(), 99);
        tracker.complete(records, None);
        assert_eq!(tracker.progress(), 100);
    }

    #[test]
    fn test_page_progress_curve() {
        assert_eq!(page_progress(1, false), 100);
        assert_eq!(page_progress(1, true), 45);
        assert_eq!(page_progress(2, true), 60);
        let mut previous = 0;
        for page in 1..500 {
            let progress = page_progress(page, true);
            assert!(progress >= previous);
            assert!(progress < 90);
            previous = progress;
        }
    }

    #[tokio::test]
    async fn test_graphql_error_regenerates_once_and_retries_same_page() {
        let transport = ScriptedTransport::new(vec![
            Ok(connection_page("products", products(&[1]), true, Some("c1"))),
            Ok(rejected()),
            Ok(connection_page("products", products(&[2]), true, Some("c2"))),
            Ok(connection_page("products", products(&[3]), false, None)),
        ]);
        let tracker = ExtractionTracker::new();
        let fallback = fallback();

        let records = Paginator::new(&transport, &tracker, settings())
            .with_fallback(&fallback)
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();

        assert_eq!(records, products(&[1, 2, 3]));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);

        let calls = transport.calls();
        assert_eq!(calls[1].variables, calls[2].variables);
        assert_eq!(calls[2].query, fallback.query);
        assert_eq!(calls[3].query, fallback.query);
        assert!(tracker
            .snapshot()
            .log
            .iter()
            .any(|l| l.message.contains("regenerating the products query")));
    }

    #[tokio::test]
    async fn test_second_graphql_error_is_fatal() {
        let transport = ScriptedTransport::new(vec![
            Ok(connection_page("products", products(&[1]), true, Some("c1"))),
            Ok(rejected()),
            Ok(GraphqlResponse::with_errors(vec![GraphqlErrorEntry::new(
                "Internal error",
            )])),
        ]);
        let tracker = ExtractionTracker::new();
        let fallback = fallback();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_fallback(&fallback)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(result, Err(ExtractionError::Graphql { ref message, .. }) if message == "Internal error"));
        assert_eq!(transport.call_count(), 3);
    }

    struct RefusedFallback;

    #[async_trait]
    impl QueryFallback for RefusedFallback {
        async fn regenerate(&self, _resource_key: &str) -> Result<String, ExtractionError> {
            Err(ExtractionError::Schema(SchemaError::Graphql {
                message: "Access denied for __schema".to_string(),
            }))
        }
    }

    #[tokio::test]
    async fn test_failed_regeneration_keeps_the_original_error() {
        let transport = ScriptedTransport::new(vec![Ok(rejected())]);
        let tracker = ExtractionTracker::new();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_fallback(&RefusedFallback)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(
            result,
            Err(ExtractionError::SchemaIncompatible { ref message, .. }) if message.contains("bodyHtml")
        ));
        assert_eq!(transport.call_count(), 1);
        let last = tracker.snapshot().latest_log().cloned().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert!(last.message.contains("Access denied for __schema"));
    }

    #[tokio::test]
    async fn test_regeneration_is_not_repeated_on_a_later_page() {
        let transport = ScriptedTransport::new(vec![
            Ok(rejected()),
            Ok(connection_page("products", products(&[1]), true, Some("c1"))),
            Ok(rejected()),
        ]);
        let tracker = ExtractionTracker::new();
        let fallback = fallback();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_fallback(&fallback)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(result, Err(ExtractionError::SchemaIncompatible { .. })));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_graphql_error_without_fallback_is_fatal() {
        let transport = ScriptedTransport::new(vec![Ok(rejected())]);
        let tracker = ExtractionTracker::new();

        let result = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(result, Err(ExtractionError::SchemaIncompatible { .. })));
    }

    #[tokio::test]
    async fn test_transport_error_skips_fallback() {
        let transport = ScriptedTransport::new(vec![Err(transport_error())]);
        let tracker = ExtractionTracker::new();
        let fallback = fallback();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_fallback(&fallback)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(result, Err(ExtractionError::Transport(_))));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_connection_is_reported() {
        let transport =
            ScriptedTransport::new(vec![Ok(GraphqlResponse::with_data(json!({"orders": {}})))]);
        let tracker = ExtractionTracker::new();

        let result = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(
            result,
            Err(ExtractionError::MissingConnection { ref resource_key }) if resource_key == "products"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_any_request() {
        let transport = ScriptedTransport::new(vec![]);
        let tracker = ExtractionTracker::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_cancellation(cancel)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(matches!(result, Err(ExtractionError::Cancelled)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_during_page_delay() {
        let transport = ScriptedTransport::new(vec![Ok(connection_page(
            "products",
            products(&[1]),
            true,
            Some("c1"),
        ))]);
        let tracker = ExtractionTracker::new();
        let cancel = CancellationToken::new();
        let slow = PaginationSettings {
            page_size: 1,
            page_delay: Duration::from_secs(30),
        };

        let paginator = Paginator::new(&transport, &tracker, slow).with_cancellation(cancel.clone());
        let (result, ()) = tokio::join!(paginator.fetch_all(QUERY, None, "products"), async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            cancel.cancel();
        });

        assert!(matches!(result, Err(ExtractionError::Cancelled)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_separates_requests() {
        let starts = Arc::new(Mutex::new(Vec::new()));
        let transport = {
            let starts = Arc::clone(&starts);
            ScriptedTransport::with_handler(move |_, _| {
                let mut starts = starts.lock().unwrap();
                starts.push(tokio::time::Instant::now());
                let page = starts.len();
                let has_next = page < 3;
                let cursor = format!("c{page}");
                Ok(connection_page("products", products(&[1]), has_next, Some(cursor.as_str())))
            })
        };
        let tracker = ExtractionTracker::new();
        let delay = Duration::from_millis(250);
        let paced = PaginationSettings {
            page_size: 1,
            page_delay: delay,
        };

        let began = tokio::time::Instant::now();
        let records = Paginator::new(&transport, &tracker, paced)
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();
        let elapsed = began.elapsed();

        assert_eq!(records.len(), 3);
        let starts = starts.lock().unwrap();
        assert!(starts[1] - starts[0] >= delay);
        assert!(starts[2] - starts[1] >= delay);
        // No pause after the last page.
        assert!(elapsed >= delay * 2 && elapsed < delay * 3, "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_pages_are_persisted_even_when_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path());
        let transport = ScriptedTransport::new(vec![
            Ok(connection_page("products", products(&[1, 2]), true, Some("c1"))),
            Err(transport_error()),
        ]);
        let tracker = ExtractionTracker::new();

        let result = Paginator::new(&transport, &tracker, settings())
            .with_page_store(&store)
            .fetch_all(QUERY, None, "products")
            .await;

        assert!(result.is_err());
        let pages: Vec<_> = std::fs::read_dir(dir.path().join(crate::store::PAGES_DIR))
            .unwrap()
            .collect();
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn test_has_next_without_cursor_stops() {
        let transport = ScriptedTransport::new(vec![Ok(connection_page(
            "products",
            products(&[1]),
            true,
            None,
        ))]);
        let tracker = ExtractionTracker::new();

        let records = Paginator::new(&transport, &tracker, settings())
            .fetch_all(QUERY, None, "products")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_page_result_reads_nodes_shape() {
        let response = GraphqlResponse::with_data(json!({
            "locations": {"nodes": [{"id": "l1"}], "pageInfo": {"hasNextPage": false, "endCursor": null}}
        }));
        let page = PageResult::from_response(&response, "locations").unwrap();
        assert_eq!(page.items, vec![json!({"id": "l1"})]);
        assert!(!page.has_next_page);
        assert!(page.end_cursor.is_none());
    }
}
