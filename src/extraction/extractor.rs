//! Extraction sessions: start, poll, cancel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::clients::{GraphqlClient, GraphqlTransport};
use crate::config::ExtractorConfig;
use crate::extraction::{
    DependentExecutor, DependentQuery, ExtractionError, ExtractionSnapshot, ExtractionStatus,
    ExtractionTracker, PaginationSettings, Paginator, SchemaFallback,
};
use crate::query::{
    find_template, validate_and_update, QueryBuilder, QueryOrigin, QueryTemplate, ResolvedQuery,
};
use crate::schema::{SchemaCache, SchemaCacheInfo, SchemaProvider};
use crate::store::DataStore;

/// Identifies one extraction run.
pub type SessionId = Uuid;

/// What to extract.
///
/// Either `template` or `resource` must be set. `query` replaces the
/// template's or generated query as written; `fields` limits a generated
/// query to those node fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Root connection to page through, e.g. `products`.
    pub resource: Option<String>,
    /// Template id, e.g. `products_with_variants`.
    pub template: Option<String>,
    /// Explicit query text.
    pub query: Option<String>,
    /// Node fields for a generated query.
    pub fields: Option<Vec<String>>,
    /// Extra variables sent with every primary page.
    pub variables: Option<Value>,
}

impl ExtractionRequest {
    /// Extracts a resource with a generated query.
    #[must_use]
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    /// Extracts with a predefined template.
    #[must_use]
    pub fn template(id: impl Into<String>) -> Self {
        Self {
            template: Some(id.into()),
            ..Self::default()
        }
    }

    /// Uses `query` as written.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Limits a generated query to `fields`.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Sends `variables` with every primary page.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

#[derive(Clone, Copy, Debug)]
enum Target<'r> {
    Template(&'static QueryTemplate),
    Resource(&'r str),
}

impl<'r> Target<'r> {
    fn of(request: &'r ExtractionRequest) -> Result<Self, ExtractionError> {
        if let Some(id) = request.template.as_deref() {
            return find_template(id)
                .map(Self::Template)
                .ok_or_else(|| ExtractionError::UnknownTemplate { id: id.to_string() });
        }
        match request.resource.as_deref().map(str::trim) {
            Some(resource) if !resource.is_empty() => Ok(Self::Resource(resource)),
            _ => Err(ExtractionError::MissingParameter { name: "resource" }),
        }
    }

    const fn label(self) -> &'r str {
        match self {
            Self::Template(template) => template.id,
            Self::Resource(resource) => resource,
        }
    }

    const fn resource_key(self) -> &'r str {
        match self {
            Self::Template(template) => template.resource,
            Self::Resource(resource) => resource,
        }
    }
}

/// Finished sessions kept for [`Extractor::status`]; older ones are dropped
/// when a new session starts.
pub const RETAINED_SESSIONS: usize = 16;

struct Session {
    tracker: ExtractionTracker,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    started: u64,
}

struct Shared {
    config: ExtractorConfig,
    transport: Arc<dyn GraphqlTransport>,
    schema: SchemaProvider,
    store: DataStore,
}

/// Runs extractions in the background and tracks them by [`SessionId`].
///
/// Only one session may be in flight at a time; [`start`](Self::start)
/// rejects a new one until the previous session has finished.
///
/// Finished sessions stay queryable until [`forget`](Self::forget) or until
/// more than [`RETAINED_SESSIONS`] have piled up. Only the latest session
/// keeps its records in memory: starting a new one drops `data` from the
/// older snapshots, whose records remain in the file at `output_path`.
///
/// # Example
///
/// ```rust,no_run
/// use shopify_extract::extraction::{ExtractionRequest, Extractor};
/// use shopify_extract::{Credentials, ExtractorConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractorConfig::builder()
///     .credentials(Credentials::from_env()?)
///     .build()?;
/// let extractor = Extractor::new(config);
///
/// let session = extractor.start(ExtractionRequest::template("products_with_variants"))?;
/// let snapshot = extractor.wait(session).await?;
/// println!("{} -> {:?}", snapshot.status, snapshot.output_path);
/// # Ok(())
/// # }
/// ```
pub struct Extractor {
    shared: Arc<Shared>,
    sessions: Mutex<HashMap<SessionId, Session>>,
    started: AtomicU64,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// Creates an extractor talking to the Admin API.
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        let transport: Arc<dyn GraphqlTransport> = Arc::new(GraphqlClient::new(&config));
        Self::with_transport(config, transport)
    }

    /// Creates an extractor over any transport.
    #[must_use]
    pub fn with_transport(config: ExtractorConfig, transport: Arc<dyn GraphqlTransport>) -> Self {
        let schema = SchemaProvider::new(
            Arc::clone(&transport),
            SchemaCache::new(config.schema_cache_path()),
            config.credentials().api_version().clone(),
        );
        let store = DataStore::new(config.data_dir());
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                schema,
                store,
            }),
            sessions: Mutex::new(HashMap::new()),
            started: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.shared.config
    }

    /// Returns the output store.
    #[must_use]
    pub fn store(&self) -> &DataStore {
        &self.shared.store
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts an extraction in the background and returns its session id.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::UnknownTemplate`] or
    ///   [`ExtractionError::MissingParameter`] for an unusable request
    /// - [`ExtractionError::Busy`] while another session is in flight
    pub fn start(&self, request: ExtractionRequest) -> Result<SessionId, ExtractionError> {
        Target::of(&request)?;

        let mut sessions = self.sessions();
        if let Some((active, _)) = sessions
            .iter()
            .find(|(_, session)| session.tracker.status().is_active())
        {
            return Err(ExtractionError::Busy { active: *active });
        }

        retire(&mut sessions);

        let id = Uuid::new_v4();
        let tracker = ExtractionTracker::new();
        tracker.reset();
        let cancel = CancellationToken::new();

        let run = Run {
            shared: Arc::clone(&self.shared),
            tracker: tracker.clone(),
            cancel: cancel.clone(),
            request,
        };
        let handle = supervise(id, tracker.clone(), tokio::spawn(run.execute()));

        tracing::debug!("Started extraction session {}", id);
        sessions.insert(
            id,
            Session {
                tracker,
                cancel,
                handle: Some(handle),
                started: self.started.fetch_add(1, Ordering::Relaxed),
            },
        );
        Ok(id)
    }

    /// Returns the current state of a session.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownSession`] for an unknown id.
    pub fn status(&self, id: SessionId) -> Result<ExtractionSnapshot, ExtractionError> {
        self.sessions()
            .get(&id)
            .map(|session| session.tracker.snapshot())
            .ok_or(ExtractionError::UnknownSession { id })
    }

    /// Lists every session with its status.
    #[must_use]
    pub fn sessions_overview(&self) -> Vec<(SessionId, ExtractionStatus)> {
        self.sessions()
            .iter()
            .map(|(id, session)| (*id, session.tracker.status()))
            .collect()
    }

    /// Asks a session to stop. The run ends as cancelled at its next request
    /// or delay. Cancelling a finished session does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownSession`] for an unknown id.
    pub fn cancel(&self, id: SessionId) -> Result<(), ExtractionError> {
        let sessions = self.sessions();
        let session = sessions
            .get(&id)
            .ok_or(ExtractionError::UnknownSession { id })?;
        if session.tracker.status().is_active() {
            session.tracker.info("Cancellation requested");
            session.cancel.cancel();
        }
        Ok(())
    }

    /// Removes a finished session and returns its final state.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::UnknownSession`] for an unknown id
    /// - [`ExtractionError::Busy`] while the session is still in flight
    pub fn forget(&self, id: SessionId) -> Result<ExtractionSnapshot, ExtractionError> {
        let mut sessions = self.sessions();
        let session = sessions
            .get(&id)
            .ok_or(ExtractionError::UnknownSession { id })?;
        if session.tracker.status().is_active() {
            return Err(ExtractionError::Busy { active: id });
        }
        let snapshot = session.tracker.snapshot();
        sessions.remove(&id);
        Ok(snapshot)
    }

    /// Waits for a session to finish and returns its final state.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnknownSession`] for an unknown id.
    pub async fn wait(&self, id: SessionId) -> Result<ExtractionSnapshot, ExtractionError> {
        let (handle, tracker) = {
            let mut sessions = self.sessions();
            let session = sessions
                .get_mut(&id)
                .ok_or(ExtractionError::UnknownSession { id })?;
            (session.handle.take(), session.tracker.clone())
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracker.fail(format!("Extraction task stopped unexpectedly: {e}"));
            }
        }
        Ok(tracker.snapshot())
    }

    /// Returns the query an extraction of `target` would run: the template's
    /// (validated) query when `target` is a template id, otherwise a
    /// generated one.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Schema`] if the schema cannot be loaded or
    /// [`ExtractionError::QueryBuild`] if no query can be generated.
    pub async fn resolve_query(
        &self,
        target: &str,
        fields: Option<&[String]>,
    ) -> Result<ResolvedQuery, ExtractionError> {
        let schema = self.shared.schema.schema(false).await?;
        let options = *self.shared.config.query_builder();

        if let Some(template) = find_template(target) {
            return Ok(validate_and_update(
                &schema,
                template.resource,
                template.query,
                template.fields,
                options,
            )?);
        }

        let generated = QueryBuilder::new(&schema, options).build(target, fields)?;
        Ok(ResolvedQuery {
            query: generated.query,
            fields: generated.fields,
            origin: QueryOrigin::Generated,
        })
    }

    /// Summarizes the schema cache.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Schema`] if the cache cannot be read.
    pub fn schema_cache_info(&self) -> Result<Option<SchemaCacheInfo>, ExtractionError> {
        let provider = &self.shared.schema;
        Ok(provider.cache().info(provider.api_version())?)
    }

    /// Deletes the schema cache. Returns `true` if a cache existed.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Schema`] if the file cannot be removed.
    pub fn clear_schema_cache(&self) -> Result<bool, ExtractionError> {
        Ok(self.shared.schema.cache().clear()?)
    }

    /// Introspects the schema again and rewrites the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Schema`] if introspection fails.
    pub async fn refresh_schema(&self) -> Result<Option<SchemaCacheInfo>, ExtractionError> {
        self.shared.schema.schema(true).await?;
        self.schema_cache_info()
    }
}

/// Drops records from finished sessions and evicts the oldest ones so a new
/// session fits within [`RETAINED_SESSIONS`].
fn retire(sessions: &mut HashMap<SessionId, Session>) {
    for session in sessions.values() {
        session.tracker.release_data();
    }

    let mut finished: Vec<(u64, SessionId)> = sessions
        .iter()
        .filter(|(_, session)| session.tracker.status().is_terminal())
        .map(|(id, session)| (session.started, *id))
        .collect();
    finished.sort_unstable();

    let excess = (sessions.len() + 1).saturating_sub(RETAINED_SESSIONS);
    for (_, id) in finished.into_iter().take(excess) {
        tracing::debug!("Evicting extraction session {}", id);
        sessions.remove(&id);
    }
}

/// Waits on the run task and fails the session if the task dies without
/// recording an outcome.
fn supervise(
    id: SessionId,
    tracker: ExtractionTracker,
    worker: JoinHandle<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = worker.await {
            tracing::error!("Extraction session {} stopped unexpectedly: {}", id, e);
            tracker.fail(format!("Extraction task stopped unexpectedly: {e}"));
        }
    })
}

/// One background run.
struct Run {
    shared: Arc<Shared>,
    tracker: ExtractionTracker,
    cancel: CancellationToken,
    request: ExtractionRequest,
}

impl Run {
    async fn execute(self) {
        match self.run().await {
            Ok((records, path)) => self.tracker.complete(records, Some(path)),
            Err(ExtractionError::Cancelled) => self.tracker.cancelled(),
            Err(e) => self.tracker.fail(e.to_string()),
        }
    }

    async fn run(&self) -> Result<(Vec<Value>, PathBuf), ExtractionError> {
        let target = Target::of(&self.request)?;
        let shared = &*self.shared;
        let config = &shared.config;

        self.tracker.info(format!(
            "Starting extraction of {} (API {})",
            target.label(),
            config.credentials().api_version()
        ));
        let query = self.resolve(target).await?;

        let fallback = SchemaFallback::new(shared.schema.clone(), *config.query_builder());
        let mut paginator = Paginator::new(
            shared.transport.as_ref(),
            &self.tracker,
            PaginationSettings::from_config(config),
        )
        .with_fallback(&fallback)
        .with_cancellation(self.cancel.clone());
        if config.persist_pages() {
            paginator = paginator.with_page_store(&shared.store);
        }

        let resource_key = target.resource_key();
        let dependent = match target {
            Target::Template(template) => template.dependent,
            Target::Resource(_) => None,
        };

        let records = if let Some(dependent) = dependent {
            self.tracker.set_status(ExtractionStatus::Running);
            let mut request = DependentQuery::from_template(query, resource_key, dependent)
                .batch_size(config.batch_size())
                .batch_delay(config.batch_delay());
            if let Some(variables) = self.request.variables.clone() {
                request = request.variables(variables);
            }
            DependentExecutor::new(paginator).execute(request).await?
        } else {
            self.tracker.set_status(ExtractionStatus::Paginating);
            paginator
                .fetch_all(&query, self.request.variables.clone(), resource_key)
                .await?
        };

        self.tracker.set_status(ExtractionStatus::Processing);
        let path = shared.store.save_records(target.label(), &records)?;
        self.tracker
            .info(format!("Saved {} records to {}", records.len(), path.display()));
        Ok((records, path))
    }

    /// Picks the query to run. A supplied query wins; a template's query is
    /// checked against the schema when one can be loaded; a bare resource
    /// needs the schema to generate one.
    async fn resolve(&self, target: Target<'_>) -> Result<String, ExtractionError> {
        if let Some(query) = &self.request.query {
            self.tracker.info("Using the supplied query");
            return Ok(query.clone());
        }

        let shared = &*self.shared;
        let options = *shared.config.query_builder();

        match target {
            Target::Template(template) => {
                let schema = match shared.schema.schema(false).await {
                    Ok(schema) => schema,
                    Err(e) => {
                        self.tracker.warn(format!(
                            "Could not load the schema ({e}); running the {} template unchecked",
                            template.id
                        ));
                        return Ok(template.query.to_string());
                    }
                };
                match validate_and_update(
                    &schema,
                    template.resource,
                    template.query,
                    template.fields,
                    options,
                ) {
                    Ok(resolved) if resolved.origin == QueryOrigin::Generated => {
                        self.tracker.warn(format!(
                            "The {} template does not match the current schema; using a generated query",
                            template.id
                        ));
                        Ok(resolved.query)
                    }
                    Ok(resolved) => Ok(resolved.query),
                    Err(e) => {
                        self.tracker.warn(format!(
                            "The {} template does not match the current schema and no replacement could be generated ({e}); running it unchanged",
                            template.id
                        ));
                        Ok(template.query.to_string())
                    }
                }
            }
            Target::Resource(resource) => {
                let schema = shared.schema.schema(false).await?;
                let generated = QueryBuilder::new(&schema, options)
                    .build(resource, self.request.fields.as_deref())?;
                self.tracker.info(format!(
                    "Generated a query for {resource} with {} fields",
                    generated.fields.len()
                ));
                Ok(generated.query)
            }
        }
    }
}

const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Extractor>();
};
