use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{QueryError, QueryResult};
use super::model::{DataQuery, QueryRequest};
use super::pipeline::run_query;
use super::response::{QueryDataResponse, QueryResponse, Responses};
use crate::config::{ExecutionConfig, PoolSettings};
use crate::frame::Frame;
use crate::metrics;
use crate::sql::{Database, DriverError};

/// Runs the sub-queries of a request concurrently against a shared pool
#[derive(Clone)]
pub struct QueryDispatcher {
    db: Arc<dyn Database>,
    config: ExecutionConfig,
    permits: Arc<Semaphore>,
}

impl QueryDispatcher {
    /// Sizes the concurrency bound from the datasource's pool settings
    pub fn for_pool(db: Arc<dyn Database>, pool: &PoolSettings) -> Self {
        Self::new(db, ExecutionConfig::for_pool(pool))
    }

    pub fn new(db: Arc<dyn Database>, config: ExecutionConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_queries.max(1)));
        Self {
            db,
            config,
            permits,
        }
    }

    /// Executes every sub-query in its own task and waits for all of them.
    ///
    /// Each sub-query gets exactly one entry in the result, keyed by ref id.
    /// A failing sub-query carries its error in its own entry and never
    /// affects the others.
    pub async fn query_data(
        &self,
        queries: Vec<DataQuery>,
        cancel: &CancellationToken,
    ) -> QueryDataResponse {
        let responses = Responses::new();
        let mut tasks = Vec::with_capacity(queries.len());

        for query in queries {
            let ref_id = query.resolved_ref_id();
            let dispatcher = self.clone();
            let responses = responses.clone();
            let cancel = cancel.clone();

            let task = tokio::spawn(async move {
                let ref_id = query.resolved_ref_id();
                let response = dispatcher.execute(query, &cancel).await;
                responses.set(ref_id, response).await;
            });
            tasks.push((ref_id, task));
        }

        // Wait for all tasks to complete
        for (ref_id, task) in tasks {
            if let Err(e) = task.await {
                warn!(ref_id = %ref_id, error = %e, "query task failed");
                metrics::record_query_error("execution");
                let err = QueryError::Execution(DriverError::new(format!("query task failed: {}", e)));
                responses.set(ref_id, QueryResponse::with_error(err)).await;
            }
        }

        responses.take().await
    }

    /// Decodes and runs a single sub-query, turning any failure into an
    /// error response
    pub async fn execute(&self, query: DataQuery, cancel: &CancellationToken) -> QueryResponse {
        let started = Instant::now();

        let request = match QueryRequest::decode(&query) {
            Ok(request) => request,
            Err(e) => return self.fail(&query.resolved_ref_id(), e),
        };

        // Hidden panels are not executed at all
        if request.hide {
            debug!(ref_id = %request.ref_id, "skipping hidden query");
            metrics::record_hidden_query();
            return QueryResponse::default();
        }

        let result = self.execute_request(&request, cancel).await;
        metrics::record_query(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(frames) => QueryResponse::with_frames(frames),
            Err(e) => self.fail(&request.ref_id, e),
        }
    }

    /// Runs a decoded request under the concurrency bound, the timeout and
    /// the caller's cancellation token
    async fn execute_request(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> QueryResult<Vec<Frame>> {
        let timeout = self.config.query_timeout;
        let run = async {
            let _permit = self.permits.acquire().await.map_err(|e| {
                QueryError::Connection(DriverError::new(format!("connection slots closed: {}", e)))
            })?;
            run_query(self.db.as_ref(), request).await
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            result = tokio::time::timeout(timeout, run) => {
                result.unwrap_or(Err(QueryError::Timeout(timeout)))
            }
        }
    }

    fn fail(&self, ref_id: &str, error: QueryError) -> QueryResponse {
        info!(ref_id = %ref_id, kind = error.kind(), error = %error, "query failed");
        metrics::record_query_error(error.kind());
        QueryResponse::with_error(error)
    }
}
