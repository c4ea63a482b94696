//! Question-to-result pipeline
//!
//! # Request Flow (strict order)
//!
//! 1. Open one store session
//! 2. Introspect the schema
//! 3. Generate raw query text (bounded by `generator.timeout_ms`)
//! 4. Sanitize to the store's target syntax
//! 5. Parse and enrich; malformed text is recovered with a default query
//! 6. Execute and return a uniform table
//!
//! The session is dropped on every exit path.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{PipelineConfig, SqliteConfig};
use crate::enrichment::Enricher;
use crate::error::{PipelineError, PipelineResult};
use crate::executor::{
    execute_document, execute_key_value, execute_relational, Execution, ExecutionError,
    ExecutionStats, ResultTable,
};
use crate::generator::{GenerationError, QueryGenerator};
use crate::observability::{Event, MetricsRegistry};
use crate::query::StructuredQuery;
use crate::sanitizer::sanitize;
use crate::schema::{introspect_documents, introspect_key_value, introspect_relational, Schema};
use crate::store::{
    DocumentConnector, DocumentStore, KeyValueConnector, KeyValueStore, RelationalConnector,
    RelationalDialect, RelationalStore, SqliteConnector, StoreError, StoreKind,
};

/// The store a pipeline answers against, fixed at construction
#[derive(Clone)]
pub enum Backend {
    Relational {
        connector: Arc<dyn RelationalConnector>,
        dialect: RelationalDialect,
    },
    Document(Arc<dyn DocumentConnector>),
    KeyValue(Arc<dyn KeyValueConnector>),
}

impl Backend {
    /// SQLite backend opened from the `sqlite` config section
    pub fn sqlite(config: &SqliteConfig) -> Self {
        Backend::Relational {
            connector: Arc::new(SqliteConnector::from_config(config)),
            dialect: RelationalDialect::Sqlite,
        }
    }

    pub fn kind(&self) -> StoreKind {
        match self {
            Backend::Relational { dialect, .. } => dialect.store_kind(),
            Backend::Document(_) => StoreKind::Document,
            Backend::KeyValue(_) => StoreKind::KeyValue,
        }
    }

    fn open(&self) -> PipelineResult<Session> {
        Ok(match self {
            Backend::Relational { connector, dialect } => Session::Relational {
                store: connector.connect()?,
                dialect: *dialect,
            },
            Backend::Document(connector) => Session::Document(connector.connect()?),
            Backend::KeyValue(connector) => Session::KeyValue(connector.connect()?),
        })
    }
}

/// One open store session, owned by one request
enum Session {
    Relational {
        store: Box<dyn RelationalStore>,
        dialect: RelationalDialect,
    },
    Document(Box<dyn DocumentStore>),
    KeyValue(Box<dyn KeyValueStore>),
}

impl Session {
    fn introspect(&self) -> PipelineResult<Schema> {
        let schema = match self {
            Session::Relational { store, dialect } => introspect_relational(store.as_ref(), *dialect)?,
            Session::Document(store) => introspect_documents(store.as_ref())?,
            Session::KeyValue(store) => introspect_key_value(store.as_ref())?,
        };
        Ok(schema)
    }

    fn execute(
        &self,
        query: &StructuredQuery,
        question: &str,
        root_collection: &str,
    ) -> PipelineResult<Execution> {
        let execution = match (self, query) {
            (Session::Relational { store, .. }, StructuredQuery::Relational(q)) => {
                execute_relational(store.as_ref(), q)?
            }
            (Session::Document(store), StructuredQuery::Document(q)) => {
                execute_document(store.as_ref(), q, root_collection)?
            }
            (Session::KeyValue(store), StructuredQuery::KeyValue(q)) => {
                execute_key_value(store.as_ref(), q, question)?
            }
            (_, other) => {
                return Err(ExecutionError::new(
                    other.text(),
                    StoreError::Rejected("query does not target this store".to_string()),
                )
                .into())
            }
        };
        Ok(execution)
    }
}

/// Outcome of one answered question
#[derive(Debug, Clone)]
pub struct Answer {
    pub request_id: Uuid,
    /// Generator output before sanitization
    pub raw: String,
    /// The query that was executed
    pub query: StructuredQuery,
    pub table: ResultTable,
    /// True if the generator output was replaced by a default query
    pub recovered: bool,
    pub stats: ExecutionStats,
}

/// Answers questions against one backend.
///
/// A pipeline holds no per-request state; concurrent calls to
/// [`QueryPipeline::answer`] each open their own session.
pub struct QueryPipeline {
    config: PipelineConfig,
    generator: Arc<dyn QueryGenerator>,
    backend: Backend,
    enricher: Enricher,
    metrics: Arc<MetricsRegistry>,
}

impl QueryPipeline {
    pub fn new(config: PipelineConfig, generator: Arc<dyn QueryGenerator>, backend: Backend) -> Self {
        let enricher = Enricher::new(config.vocabulary.clone());
        Self {
            config,
            generator,
            backend,
            enricher,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Shares an existing registry instead of a private one
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn kind(&self) -> StoreKind {
        self.backend.kind()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Answers one natural-language question
    pub async fn answer(&self, question: &str) -> PipelineResult<Answer> {
        let request_id = Uuid::new_v4();
        let span = info_span!("query", request_id = %request_id, store = %self.kind());
        self.answer_in_span(request_id, question).instrument(span).await
    }

    async fn answer_in_span(&self, request_id: Uuid, question: &str) -> PipelineResult<Answer> {
        self.metrics.increment_queries_received();
        info!(event = %Event::QueryReceived, question = %question, "question received");

        let outcome = self.run(request_id, question).await;
        match &outcome {
            Ok(answer) => {
                self.metrics.increment_queries_executed();
                info!(
                    event = %Event::QueryExecuted,
                    rows = answer.table.len(),
                    recovered = answer.recovered,
                    "query complete"
                );
            }
            Err(error) => {
                self.metrics.increment_queries_rejected();
                warn!(event = %Event::QueryRejected, code = error.code(), error = %error, "query failed");
            }
        }
        outcome
    }

    async fn run(&self, request_id: Uuid, question: &str) -> PipelineResult<Answer> {
        let kind = self.kind();
        let session = self.backend.open()?;

        let schema = session.introspect()?;
        debug!(event = %Event::SchemaIntrospected, entities = schema.len(), "schema introspected");

        let raw = self.generate(question, &schema, kind).await?;

        let clean = sanitize(&raw, kind.target_syntax());
        debug!(event = %Event::QuerySanitized, query = %clean, "query sanitized");

        let enriched = self.enricher.resolve(kind, &clean, question, &schema);
        if enriched.recovered {
            self.metrics.increment_malformed_recoveries();
        }

        let execution = session.execute(&enriched.query, question, &self.config.document.root_collection)?;
        drop(session);

        self.record(&execution.stats);
        Ok(Answer {
            request_id,
            raw,
            query: enriched.query,
            table: execution.table,
            recovered: enriched.recovered,
            stats: execution.stats,
        })
    }

    async fn generate(&self, question: &str, schema: &Schema, kind: StoreKind) -> PipelineResult<String> {
        let bound = self.config.generator.timeout();
        let result = match tokio::time::timeout(bound, self.generator.generate(question, schema, kind)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(bound)),
        };

        match result {
            Ok(raw) => {
                debug!(event = %Event::QueryGenerated, raw = %raw, "query generated");
                Ok(raw)
            }
            Err(error) => {
                warn!(event = %Event::GenerationFailed, code = error.code(), error = %error, "generation failed");
                Err(PipelineError::Generation(error))
            }
        }
    }

    fn record(&self, stats: &ExecutionStats) {
        self.metrics.add_decode_fallbacks(stats.decode_warnings.len() as u64);
        self.metrics.add_records_skipped(stats.records_skipped);
        if stats.predicate_error.is_some() {
            self.metrics.increment_predicate_rejections();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyValueStore;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_pipeline_is_send_sync() {
        assert_send_sync::<QueryPipeline>();
    }

    #[test]
    fn test_backend_kind() {
        let backend = Backend::KeyValue(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(backend.kind(), StoreKind::KeyValue);
        assert_eq!(Backend::sqlite(&SqliteConfig::default()).kind(), StoreKind::Sqlite);
    }
}
