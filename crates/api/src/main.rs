use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swingscan_core::criteria::{StrategyCriterion, STRATEGY_CRITERIA};
use swingscan_core::dashboard::{AddReport, Dashboard, ScanReport};
use swingscan_core::domain::ranked::{Picks, RankedEntry, ScoreBasis};
use swingscan_core::domain::stock::AiStock;
use swingscan_core::llm::anthropic::AnthropicClient;
use swingscan_core::storage::snapshots::{ExportOutcome, SnapshotExporter};
use swingscan_core::storage::watchlist::{JsonFileStore, WatchlistStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = swingscan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let gateway = AnthropicClient::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
    })?;
    let state_dir = settings.state_dir();
    let snapshot_dir = settings.snapshot_dir();
    tracing::info!(state_dir = %state_dir.display(), snapshot_dir = %snapshot_dir.display(), "storage configured");

    let dashboard = Dashboard::new(
        Arc::new(gateway),
        WatchlistStore::new(JsonFileStore::new(state_dir)),
        SnapshotExporter::new(snapshot_dir),
    );
    let state = AppState {
        dashboard: Arc::new(dashboard),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/criteria", get(get_criteria))
        .route("/picks", get(get_picks))
        .route("/picks/top", get(get_top_performers))
        .route("/picks/:ticker", post(add_ticker))
        .route("/scan", post(run_scan))
        .route("/evaluate/:ticker", get(evaluate_ticker))
        .route("/watchlist", get(get_watchlist).put(put_watchlist))
        .route("/watchlist/import", post(import_watchlist))
        .route("/snapshots", post(export_snapshot))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("{err:#}"),
        }
    }

    /// The model or storage behind the request failed.
    fn upstream(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_criteria() -> Json<&'static [StrategyCriterion]> {
    Json(&STRATEGY_CRITERIA[..])
}

async fn get_picks(State(state): State<AppState>) -> Json<Picks> {
    Json(state.dashboard.picks().await)
}

async fn get_top_performers(State(state): State<AppState>) -> Json<Vec<RankedEntry>> {
    Json(state.dashboard.top_performers().await)
}

#[derive(Debug, Deserialize)]
struct ScanParams {
    basis: Option<String>,
}

async fn run_scan(
    State(state): State<AppState>,
    Query(params): Query<ScanParams>,
) -> Result<Json<ScanReport>, ApiError> {
    let basis = match params.basis.as_deref() {
        Some(raw) => raw.parse::<ScoreBasis>().map_err(ApiError::bad_request)?,
        None => ScoreBasis::default(),
    };
    let report = state
        .dashboard
        .run_scan(basis)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(report))
}

async fn add_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<AddReport>, ApiError> {
    let report = state
        .dashboard
        .add_tickers(&[ticker])
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(report))
}

async fn evaluate_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<AiStock>, ApiError> {
    let stock = state
        .dashboard
        .evaluate_ticker(&ticker)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(stock))
}

async fn get_watchlist(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.dashboard.watchlist().load().await)
}

async fn put_watchlist(
    State(state): State<AppState>,
    Json(list): Json<Vec<String>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let saved = state
        .dashboard
        .watchlist()
        .replace(list)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(saved))
}

async fn import_watchlist(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<AddReport>, ApiError> {
    let report = state
        .dashboard
        .import_watchlist_csv(&body)
        .await
        .map_err(ApiError::upstream)?;
    Ok(Json(report))
}

async fn export_snapshot(State(state): State<AppState>) -> (StatusCode, Json<ExportOutcome>) {
    let outcome = state.dashboard.export_snapshot().await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &swingscan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
