use crate::api::{InitializeSummary, ReadApi, StructureResponse};
use crate::crawler::SiteCrawler;
use crate::queue::QueueStats;
use crate::storage::Storage;
use crate::worker::{JobOutcome, WorkerPool};
use crate::AnalyzerError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared state behind every route
pub struct AppState<S, C> {
    pub api: ReadApi<S>,
    pub pool: Arc<WorkerPool<S, C>>,
    /// Batch size used when a process request does not name one
    pub default_batch_size: usize,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            pool: Arc::clone(&self.pool),
            default_batch_size: self.default_batch_size,
        }
    }
}

/// Error answer for the administrative routes
#[derive(Debug)]
pub struct ApiError(AnalyzerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AnalyzerError::Capacity { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnalyzerError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status != StatusCode::TOO_MANY_REQUESTS {
            error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<AnalyzerError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureQuery {
    company_id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct InitializeRequest {
    priority: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ProcessResponse {
    processed: usize,
    outcomes: Vec<JobOutcome>,
}

/// Builds the HTTP router
///
/// * `GET /website-structure?companyId=<id>` - cached structure, never waits on a crawl
/// * `POST /initialize-queue` - queue every company in the directory
/// * `POST /process-queue` - run one worker pass and report each job
/// * `GET /queue-stats` - job counts and average processing time
/// * `GET /health` - storage reachability
pub fn router<S: Storage, C: SiteCrawler>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/website-structure", get(website_structure::<S, C>))
        .route("/initialize-queue", post(initialize_queue::<S, C>))
        .route("/process-queue", post(process_queue::<S, C>))
        .route("/queue-stats", get(queue_stats::<S, C>))
        .route("/health", get(health::<S, C>))
        .with_state(state)
}

async fn website_structure<S: Storage, C: SiteCrawler>(
    State(state): State<AppState<S, C>>,
    Query(query): Query<StructureQuery>,
) -> Json<StructureResponse> {
    Json(state.api.website_structure(query.company_id))
}

async fn initialize_queue<S: Storage, C: SiteCrawler>(
    State(state): State<AppState<S, C>>,
    body: Option<Json<InitializeRequest>>,
) -> Result<Json<InitializeSummary>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let priority = request.priority.unwrap_or(state.api.initial_priority());
    Ok(Json(state.api.initialize_queue(priority)?))
}

async fn process_queue<S: Storage, C: SiteCrawler>(
    State(state): State<AppState<S, C>>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let batch_size = request.batch_size.unwrap_or(state.default_batch_size);

    let outcomes = state.pool.run_pass(batch_size).await?;
    Ok(Json(ProcessResponse {
        processed: outcomes.len(),
        outcomes,
    }))
}

async fn queue_stats<S: Storage, C: SiteCrawler>(
    State(state): State<AppState<S, C>>,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.api.queue().stats()?))
}

async fn health<S: Storage, C: SiteCrawler>(
    State(state): State<AppState<S, C>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.api.queue().stats() {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "inFlight": state.pool.in_flight(), "queued": stats.queued })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": e.to_string() })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::crawler::CrawlReport;
    use crate::queue::{AnalysisQueue, RetryPolicy};
    use crate::storage::{Company, DiscoveryMethod, SqliteStorage};
    use crate::worker::WorkerSettings;
    use crate::CrawlResult;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    struct EmptySiteCrawler;

    #[async_trait]
    impl SiteCrawler for EmptySiteCrawler {
        async fn crawl(&self, domain: &str) -> CrawlResult<CrawlReport> {
            Ok(CrawlReport {
                domain: domain.to_string(),
                candidates: vec![],
                subdomains: vec![],
                discovery_method: DiscoveryMethod::LinkCrawl,
                sitemap_url: None,
            })
        }
    }

    fn state() -> AppState<SqliteStorage, EmptySiteCrawler> {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_company(&Company {
                id: 1,
                name: "Acme".to_string(),
                domain: Some("acme.com".to_string()),
            })
            .unwrap();
        let storage = Arc::new(Mutex::new(storage));
        let config = Config::default();
        let queue = AnalysisQueue::new(Arc::clone(&storage), RetryPolicy::default());
        let pool = WorkerPool::new(
            queue.clone(),
            Arc::clone(&storage),
            Arc::new(EmptySiteCrawler),
            WorkerSettings::default(),
        );
        AppState {
            api: ReadApi::new(queue, storage, &config),
            pool: Arc::new(pool),
            default_batch_size: 5,
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_structure_miss_then_processed() {
        let state = state();

        let (status, body) = send(
            router(state.clone()),
            Request::builder()
                .uri("/website-structure?companyId=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "none");
        assert!(body.get("structure").is_none());

        let (status, body) = send(router(state.clone()), post_json("/process-queue", r#"{"batchSize": 3}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"], 1);
        assert_eq!(body["outcomes"][0]["outcome"], "succeeded");

        let (_, body) = send(
            router(state),
            Request::builder()
                .uri("/website-structure?companyId=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body["status"], "fresh");
        assert_eq!(body["structure"]["domain"], "acme.com");
        assert_eq!(body["structure"]["hasCareersPage"], false);
    }

    #[tokio::test]
    async fn test_structure_requires_company_id() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .uri("/website-structure")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_initialize_queue_and_stats() {
        let state = state();

        let (status, body) = send(router(state.clone()), post_json("/initialize-queue", r#"{"priority": 3}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enqueued"], 1);

        let (status, body) = send(
            router(state),
            Request::builder().uri("/queue-stats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queued"], 1);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_initialize_queue_without_body() {
        let state = state();
        let request = Request::builder()
            .method("POST")
            .uri("/initialize-queue")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enqueued"], 1);

        let job = state.api.queue().active_job_for(1).unwrap().unwrap();
        assert_eq!(job.priority, 5);
    }

    #[test]
    fn test_error_status_mapping() {
        let error = ApiError::from(AnalyzerError::Capacity { in_flight: 5 });
        assert_eq!(error.into_response().status(), StatusCode::TOO_MANY_REQUESTS);

        let error = ApiError::from(crate::storage::StorageError::Unavailable("locked".to_string()));
        assert_eq!(error.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            router(state()),
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
