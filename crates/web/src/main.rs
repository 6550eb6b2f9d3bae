mod metrics;
mod models;

use anyhow::Result;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::moralis::MoralisClient;
use metrics_exporter_prometheus::PrometheusHandle;
use models::{
    AnalyzeResponse, AnalyzeStats, DetailedStats, ErrorBody, FetchResponse, FetchStats,
    FetchedToken, HealthResponse, StatsResponse, WalletQuery, WalletRequest,
};
use profiler::context::normalize_address;
use profiler::persona_classification::classify_wallet;
use profiler::record_source::RemoteRecordSource;
use profiler::report::render_html_report;
use profiler::wallet_features::extract_wallet_features;
use profiler::{ProfileError, ProfilerContext};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub struct AppState<R = MoralisClient> {
    pub ctx: ProfilerContext<R>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
}

impl<R> AppState<R> {
    pub fn new(ctx: ProfilerContext<R>, prometheus: PrometheusHandle) -> Self {
        Self {
            ctx,
            prometheus,
            started_at: Instant::now(),
        }
    }
}

// --- Errors ---

/// JSON error response: `{error, wallet_address?}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                wallet_address: None,
            },
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        let (status, wallet_address) = match &err {
            ProfileError::InvalidAddress => (StatusCode::BAD_REQUEST, None),
            ProfileError::NotFound { address } => (StatusCode::NOT_FOUND, Some(address.clone())),
            ProfileError::Upstream { address, .. } => {
                (StatusCode::BAD_GATEWAY, Some(address.clone()))
            }
            ProfileError::Render(_) | ProfileError::Internal(_) => {
                tracing::error!(error = %format!("{err:#}"), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                wallet_address,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn wallet_body(body: std::result::Result<Json<WalletRequest>, JsonRejection>) -> ApiResult<(String, bool)> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let address = req
        .wallet_address
        .ok_or_else(|| ApiError::bad_request("wallet_address is required"))?;
    let address = normalize_address(&address)?.to_string();
    Ok((address, req.detailed))
}

// --- Handlers ---

async fn health<R: RemoteRecordSource>(State(state): State<Arc<AppState<R>>>) -> Json<HealthResponse> {
    let snapshot = state.ctx.snapshot();
    Json(HealthResponse {
        status: "healthy",
        data_loaded: !snapshot.is_empty(),
        wallets_indexed: snapshot.wallet_count(),
        narrator: state.ctx.narrator().kind(),
        model_loaded: state.ctx.narrator().uses_model(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn analyze<R: RemoteRecordSource>(
    State(state): State<Arc<AppState<R>>>,
    body: std::result::Result<Json<WalletRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let (address, detailed) = wallet_body(body)?;
    let record = state.ctx.profile(&address).await?;
    let persona = state.ctx.narrate(&record, detailed).await;
    Ok(Json(AnalyzeResponse {
        wallet_address: address,
        persona,
        stats: AnalyzeStats::from(&record.features),
        classifications: record.classifications,
        recommendations: record.recommendations,
    }))
}

async fn stats<R: RemoteRecordSource>(
    State(state): State<Arc<AppState<R>>>,
    query: std::result::Result<Query<WalletQuery>, QueryRejection>,
) -> ApiResult<Json<StatsResponse>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let address = query
        .wallet_address
        .ok_or_else(|| ApiError::bad_request("wallet_address is required"))?;
    let record = state.ctx.profile(&address).await?;
    Ok(Json(StatsResponse {
        wallet_address: record.address().to_string(),
        stats: DetailedStats::from(&record.features),
        classifications: record.classifications,
    }))
}

async fn report<R: RemoteRecordSource>(
    State(state): State<Arc<AppState<R>>>,
    body: std::result::Result<Json<WalletRequest>, JsonRejection>,
) -> ApiResult<Html<String>> {
    let (address, detailed) = wallet_body(body)?;
    let record = state.ctx.profile(&address).await?;
    let narrative = state.ctx.narrate(&record, detailed).await;
    Ok(Html(render_html_report(&record, &narrative)?))
}

async fn fetch<R: RemoteRecordSource>(
    State(state): State<Arc<AppState<R>>>,
    body: std::result::Result<Json<WalletRequest>, JsonRejection>,
) -> ApiResult<Json<FetchResponse>> {
    let (address, _) = wallet_body(body)?;
    let snapshot = state.ctx.fetch_remote(&address).await?;
    let features = extract_wallet_features(&address, &snapshot);
    let classifications = classify_wallet(&features);
    Ok(Json(FetchResponse {
        stats: FetchStats {
            total_networth: features.total_networth,
            native_balance: features.native_balance,
            token_balance_usd: features.token_balance_usd,
            chain: features.chain,
        },
        tokens: FetchedToken::from_snapshot(&snapshot, &address),
        wallet_address: address,
        classifications,
    }))
}

async fn prometheus_metrics<R>(State(state): State<Arc<AppState<R>>>) -> impl IntoResponse {
    state.prometheus.run_upkeep();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
}

// --- Router ---

pub fn create_router<R>(state: Arc<AppState<R>>) -> Router
where
    R: RemoteRecordSource + Send + Sync + 'static,
{
    Router::new()
        .route("/api/health", get(health::<R>))
        .route("/api/wallet/analyze", post(analyze::<R>))
        .route("/api/wallet/stats", get(stats::<R>))
        .route("/api/wallet/report", post(report::<R>))
        .route("/api/wallet/fetch", post(fetch::<R>))
        .route("/metrics", get(prometheus_metrics::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = common::config::Config::load()?;

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("web", &config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let prometheus = metrics::init_global()?;
    let ctx = ProfilerContext::from_config(&config)?;

    let web_port = config.web.as_ref().map_or(5000, |w| w.port);
    let web_host = config
        .web
        .as_ref()
        .map_or("0.0.0.0".to_string(), |w| w.host.clone());

    let state = Arc::new(AppState::new(ctx, prometheus));
    let app = create_router(state);
    let addr: SocketAddr = format!("{web_host}:{web_port}").parse()?;
    tracing::info!("persona service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
