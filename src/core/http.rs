//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_STATIC_DIR};
use crate::core::orchestrator::{send_bounded, PassOutcome, RefreshOrchestrator};
use crate::db::StockStore;
use crate::error::{NotifyError, StoreError};
use crate::metrics::Metrics;
use crate::models::snapshot::Snapshot;
use crate::models::stock::StockEntry;
use crate::services::market_data::{MarketDataProvider, SHORT_WINDOW_RANGE};
use crate::services::notifier::Notifier;
use crate::signals::alert::status_report;
use crate::signals::window;

/// Status reported for stocks that have never been refreshed
pub const PENDING_STATUS: &str = "PENDING";
pub const PENDING_DETAILS: &str = "No data yet";
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub store: Arc<dyn StockStore>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub provider: Arc<dyn MarketDataProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub base_url: String,
    pub static_dir: String,
}

impl AppState {
    pub fn new(
        metrics: Arc<Metrics>,
        store: Arc<dyn StockStore>,
        orchestrator: Arc<RefreshOrchestrator>,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            store,
            orchestrator,
            provider,
            notifier,
            base_url: DEFAULT_BASE_URL.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<String>) -> Self {
        self.static_dir = static_dir.into();
        self
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// JSON error body in the `{"detail": ...}` shape the dashboard expects
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Stock not found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Storage error while serving request");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable")
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "refresh_running": state.orchestrator.is_running(),
        "service": "stockwatch"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            "HTTP request error"
        );
    }

    response
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Stock Tracker API Running. Go to /static/index.html" }))
}

/// Dashboard row: registry entry merged with its latest snapshot
#[derive(Debug, Serialize)]
struct StockSummary {
    symbol: String,
    name: String,
    price: f64,
    change: f64,
    status: String,
    is_low: bool,
    details: String,
    timestamp: Option<DateTime<Utc>>,
    seven_day_avg: f64,
    two_fifty_day_low: f64,
    two_fifty_day_avg: f64,
}

impl StockSummary {
    fn new(entry: StockEntry, latest: Option<Snapshot>) -> Self {
        match latest {
            Some(s) => Self {
                symbol: entry.symbol,
                name: entry.name,
                price: s.price,
                change: s.change_percent,
                status: s.status.to_string(),
                is_low: s.is_low,
                details: s.details,
                timestamp: Some(s.timestamp),
                seven_day_avg: s.seven_day_avg.unwrap_or(0.0),
                two_fifty_day_low: s.two_fifty_day_low.unwrap_or(0.0),
                two_fifty_day_avg: s.two_fifty_day_avg.unwrap_or(0.0),
            },
            None => Self {
                symbol: entry.symbol,
                name: entry.name,
                price: 0.0,
                change: 0.0,
                status: PENDING_STATUS.to_string(),
                is_low: false,
                details: PENDING_DETAILS.to_string(),
                timestamp: None,
                seven_day_avg: 0.0,
                two_fifty_day_low: 0.0,
                two_fifty_day_avg: 0.0,
            },
        }
    }
}

/// List every tracked stock with its latest snapshot
async fn list_stocks(State(state): State<AppState>) -> ApiResult<Json<Vec<StockSummary>>> {
    let entries = state.store.list_stock_entries().await?;
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let latest = state.store.latest_snapshot(&entry.symbol).await?;
        results.push(StockSummary::new(entry, latest));
    }
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct CreateStockRequest {
    symbol: String,
    name: String,
}

/// Register a stock; existing entries are left untouched
async fn create_stock(
    State(state): State<AppState>,
    Json(request): Json<CreateStockRequest>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let symbol = request.symbol.trim();
    let name = request.name.trim();
    if symbol.is_empty() || name.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "symbol and name are required",
        ));
    }

    let entry = StockEntry::new(symbol, name);
    if state.store.upsert_stock_entry(&entry).await? {
        info!(symbol = %entry.symbol, "Registered {} ({})", entry.name, entry.symbol);
        return Ok((StatusCode::CREATED, Json(entry)));
    }

    // Report the stored entry, which may carry a different name
    let existing = state
        .store
        .get_stock_entry(symbol)
        .await?
        .unwrap_or(entry);
    Ok((StatusCode::OK, Json(existing)))
}

#[derive(Debug, Serialize)]
struct StockDetail {
    symbol: String,
    name: String,
    price: f64,
    change: f64,
    status: String,
    is_low: bool,
    details: String,
    market_cap: Option<f64>,
    volume: Option<i64>,
    open_price: Option<f64>,
    day_high: Option<f64>,
    day_low: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    pe_ratio: Option<f64>,
    timestamp: Option<DateTime<Utc>>,
    seven_day_avg: Option<f64>,
    seven_day_min: Option<f64>,
    seven_day_max: Option<f64>,
    seven_day_low: Option<f64>,
    two_fifty_day_low: Option<f64>,
    two_fifty_day_avg: Option<f64>,
}

#[derive(Debug, Default)]
struct ShortWindowStats {
    avg: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

/// Live 7-day stats; a provider failure leaves every field empty
async fn short_window_stats(provider: &dyn MarketDataProvider, symbol: &str) -> ShortWindowStats {
    match provider.fetch_series(symbol, SHORT_WINDOW_RANGE).await {
        Ok(series) => {
            let closes = series.closes();
            ShortWindowStats {
                avg: window::mean(&closes),
                min: window::min(&closes),
                max: window::max(&closes),
            }
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Failed to fetch 7-day stats for {}", symbol);
            ShortWindowStats::default()
        }
    }
}

/// Entry, latest snapshot and on-demand 7-day stats for one stock
async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<StockDetail>> {
    let entry = state
        .store
        .get_stock_entry(&symbol)
        .await?
        .ok_or_else(ApiError::not_found)?;
    let latest = state.store.latest_snapshot(&entry.symbol).await?;
    let stats = short_window_stats(state.provider.as_ref(), &entry.symbol).await;

    let detail = match latest {
        Some(s) => StockDetail {
            symbol: entry.symbol,
            name: entry.name,
            price: s.price,
            change: s.change_percent,
            status: s.status.to_string(),
            is_low: s.is_low,
            details: s.details,
            market_cap: s.market_cap,
            volume: s.volume,
            open_price: s.open_price,
            day_high: s.day_high,
            day_low: s.day_low,
            fifty_two_week_high: s.fifty_two_week_high,
            fifty_two_week_low: s.fifty_two_week_low,
            pe_ratio: s.pe_ratio,
            timestamp: Some(s.timestamp),
            seven_day_avg: stats.avg,
            seven_day_min: stats.min,
            seven_day_max: stats.max,
            seven_day_low: stats.min,
            two_fifty_day_low: s.two_fifty_day_low,
            two_fifty_day_avg: s.two_fifty_day_avg,
        },
        None => StockDetail {
            symbol: entry.symbol,
            name: entry.name,
            price: 0.0,
            change: 0.0,
            status: PENDING_STATUS.to_string(),
            is_low: false,
            details: PENDING_DETAILS.to_string(),
            market_cap: None,
            volume: None,
            open_price: None,
            day_high: None,
            day_low: None,
            fifty_two_week_high: None,
            fifty_two_week_low: None,
            pe_ratio: None,
            timestamp: None,
            seven_day_avg: stats.avg,
            seven_day_min: stats.min,
            seven_day_max: stats.max,
            seven_day_low: stats.min,
            two_fifty_day_low: None,
            two_fifty_day_avg: None,
        },
    };

    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
struct SnapshotQuery {
    limit: Option<usize>,
}

/// Stored snapshot history for one stock, newest first
async fn list_stock_snapshots(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<SnapshotQuery>,
) -> ApiResult<Json<Vec<Snapshot>>> {
    if state.store.get_stock_entry(&symbol).await?.is_none() {
        return Err(ApiError::not_found());
    }
    let limit = params.limit.unwrap_or(DEFAULT_SNAPSHOT_LIMIT);
    let snapshots = state.store.list_snapshots(&symbol, Some(limit)).await?;
    Ok(Json(snapshots))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    period: Option<String>,
    interval: Option<String>,
}

/// Chart data passthrough; provider failures yield an empty list
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Json<Value> {
    let period = params.period.as_deref().unwrap_or("5d");
    let interval = params.interval.as_deref().unwrap_or("60m");

    match state.provider.fetch_chart(&symbol, period, interval).await {
        Ok(points) => Json(json!(points)),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Failed to fetch history for {}", symbol);
            Json(json!([]))
        }
    }
}

/// Run a forced refresh pass and report its outcome
async fn trigger_refresh(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    match state.orchestrator.run_forced().await {
        PassOutcome::Completed(summary) => Ok(Json(json!({
            "message": "Update completed",
            "summary": summary
        }))),
        PassOutcome::AlreadyRunning => Err(ApiError::new(
            StatusCode::CONFLICT,
            "A refresh is already running",
        )),
        PassOutcome::MarketClosed => Ok(Json(json!({ "message": "Market closed" }))),
    }
}

/// Send a status report for one stock to the notification channel
async fn notify_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Value>> {
    let entry = state
        .store
        .get_stock_entry(&symbol)
        .await?
        .ok_or_else(ApiError::not_found)?;
    let latest = state
        .store
        .latest_snapshot(&entry.symbol)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "No data available for this stock",
            )
        })?;

    let message = status_report(&entry, &latest, &state.base_url);
    let limit = state.orchestrator.config().fetch_timeout;
    match send_bounded(state.notifier.as_ref(), &message, limit).await {
        Ok(()) => {
            state.metrics.alerts_sent_total.inc();
            Ok(Json(json!({ "message": "Notification sent successfully" })))
        }
        Err(NotifyError::NotConfigured) => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Notifications are not configured",
        )),
        Err(e) => {
            warn!(symbol = %entry.symbol, error = %e, "Manual notification failed");
            state.metrics.notification_failures_total.inc();
            Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Failed to send Telegram message",
            ))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/stocks", get(list_stocks).post(create_stock))
        .route("/api/stocks/{symbol}", get(get_stock))
        .route("/api/stocks/{symbol}/snapshots", get(list_stock_snapshots))
        .route("/api/history/{symbol}", get(get_history))
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/notify/{symbol}", post(notify_stock))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "HTTP server listening on {}", addr);
    info!("Dashboard available at http://{}/static/index.html", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
