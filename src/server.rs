//! HTTP API server.
//!
//! Exposes the feedback pipeline as a JSON API. Each inbound request is
//! handled on its own task; the only shared state is the record store and
//! the AI provider, both injected as trait objects so tests can
//! substitute deterministic fakes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/feedback` | Paginated, filtered listing |
//! | `GET`  | `/feedback/stats` | Corpus-wide statistics |
//! | `GET`  | `/feedback/{id}` | Single record |
//! | `POST` | `/feedback` | Create a record (sentiment auto-attached) |
//! | `POST` | `/feedback/{id}/reclassify` | Re-run sentiment classification |
//! | `POST` | `/feedback/summarize` | AI summary over ids or a filter |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "validation_error", "message": "invalid source: ..." } }
//! ```
//!
//! Codes: `validation_error` (400), `empty_batch` (400), `not_found` (404),
//! `ai_unavailable` (503), `store_unavailable` (503).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::ai::{create_provider, AiProvider};
use crate::config::Config;
use crate::db;
use crate::error::FeedbackError;
use crate::feedback::{create_feedback, get_feedback, reclassify_feedback, CreateFeedback};
use crate::filter::{FeedbackFilter, FilterParams};
use crate::models::{format_ts_iso, FeedbackRecord, Sentiment, Source};
use crate::query::fetch_page;
use crate::sqlite_store::SqliteStore;
use crate::stats::{compute_stats, StatsOverview};
use crate::store::FeedbackStore;
use crate::summarize::{summarize, SummarizeRequest, SummaryResult};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn FeedbackStore>,
    ai: Arc<dyn AiProvider>,
}

/// Start the HTTP server with the production store and provider.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn FeedbackStore> = Arc::new(SqliteStore::new(pool));
    let ai: Arc<dyn AiProvider> = Arc::from(create_provider(&config.ai)?);
    run_server_with(config, store, ai).await
}

/// Start the HTTP server with injected collaborators.
pub async fn run_server_with(
    config: &Config,
    store: Arc<dyn FeedbackStore>,
    ai: Arc<dyn AiProvider>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(AppState {
        config: Arc::new(config.clone()),
        store,
        ai,
    });

    println!("Feedback API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/feedback", get(handle_list).post(handle_create))
        .route("/feedback/stats", get(handle_stats))
        .route("/feedback/summarize", post(handle_summarize))
        .route("/feedback/{id}", get(handle_get))
        .route("/feedback/{id}/reclassify", post(handle_reclassify))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"validation_error"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::Validation { .. } => ApiError {
                status: StatusCode::BAD_REQUEST,
                code: "validation_error",
                message: err.to_string(),
            },
            FeedbackError::NotFound(_) => ApiError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: err.to_string(),
            },
            FeedbackError::EmptyBatch => ApiError {
                status: StatusCode::BAD_REQUEST,
                code: "empty_batch",
                message: err.to_string(),
            },
            FeedbackError::SummarizationUnavailable(cause) => {
                error!("summary generation failed: {:#}", cause);
                ApiError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "ai_unavailable",
                    message: "summary generation is temporarily unavailable, try again later"
                        .to_string(),
                }
            }
            FeedbackError::StoreUnavailable(cause) => {
                error!("feedback store failure: {:#}", cause);
                ApiError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "store_unavailable",
                    message: "feedback store is unavailable".to_string(),
                }
            }
        }
    }
}

// ============ Wire shapes ============

/// A feedback record as serialized to clients.
#[derive(Serialize)]
struct FeedbackBody {
    id: i64,
    text: String,
    source: Source,
    sentiment: Sentiment,
    created_at: String,
    metadata: Option<serde_json::Value>,
}

impl FeedbackBody {
    fn from_record(record: &FeedbackRecord) -> Self {
        Self {
            id: record.id,
            text: record.text.clone(),
            source: record.source,
            sentiment: record.sentiment,
            created_at: format_ts_iso(record.created_at),
            metadata: record.metadata.clone(),
        }
    }
}

#[derive(Serialize)]
struct FeedbackListBody {
    items: Vec<FeedbackBody>,
    total: i64,
    page: i64,
    page_size: i64,
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthBody {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /feedback ============

#[derive(Deserialize)]
struct ListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    search: Option<String>,
    source: Option<String>,
    sentiment: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl ListQuery {
    fn filter_params(&self) -> FilterParams {
        FilterParams {
            search: self.search.clone(),
            source: self.source.clone(),
            sentiment: self.sentiment.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<FeedbackListBody>, ApiError> {
    let filter = FeedbackFilter::from_params(&params.filter_params())?;
    let page = params.page.unwrap_or(1);
    let page_size = params
        .page_size
        .unwrap_or(state.config.pagination.default_page_size);

    let result = fetch_page(
        state.store.as_ref(),
        &filter,
        page,
        page_size,
        &state.config.pagination,
    )
    .await?;

    Ok(Json(FeedbackListBody {
        items: result.items.iter().map(FeedbackBody::from_record).collect(),
        total: result.total,
        page: result.page,
        page_size: result.page_size,
    }))
}

// ============ GET /feedback/stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsOverview>, ApiError> {
    let stats = compute_stats(
        state.store.as_ref(),
        state.config.stats.recent_window_days,
    )
    .await?;
    Ok(Json(stats))
}

// ============ GET /feedback/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FeedbackBody>, ApiError> {
    let record = get_feedback(state.store.as_ref(), id).await?;
    Ok(Json(FeedbackBody::from_record(&record)))
}

// ============ POST /feedback ============

#[derive(Deserialize)]
struct CreateBody {
    text: String,
    source: String,
    metadata: Option<serde_json::Value>,
}

async fn handle_create(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<FeedbackBody>), ApiError> {
    let record = create_feedback(
        state.store.as_ref(),
        state.ai.as_ref(),
        CreateFeedback {
            text: body.text,
            source: body.source,
            metadata: body.metadata,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(FeedbackBody::from_record(&record))))
}

// ============ POST /feedback/{id}/reclassify ============

async fn handle_reclassify(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FeedbackBody>, ApiError> {
    let record = reclassify_feedback(state.store.as_ref(), state.ai.as_ref(), id).await?;
    Ok(Json(FeedbackBody::from_record(&record)))
}

// ============ POST /feedback/summarize ============

#[derive(Deserialize)]
struct SummarizeBody {
    feedback_ids: Option<Vec<i64>>,
    filters: Option<FilterParams>,
}

async fn handle_summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeBody>,
) -> Result<Json<SummaryResult>, ApiError> {
    let filter = FeedbackFilter::from_params(&body.filters.unwrap_or_default())?;
    let request = SummarizeRequest {
        feedback_ids: body.feedback_ids,
        filter,
    };

    let result = summarize(
        state.store.as_ref(),
        state.ai.as_ref(),
        state.config.summary.max_batch_size,
        &request,
    )
    .await?;

    Ok(Json(result))
}
