//! HTTP transport for the Query Service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/inventory` | Filtered, sorted, paginated vehicle list |
//! | `GET`  | `/inventory/{key}` | One vehicle by stock number or VIN |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "page must be a positive integer, got 'x'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! A well-formed list request is always answered with 200 or 304; a
//! degraded data source shows up as an empty or stale list with
//! `diagnostics`, not as an error.
//!
//! # Caching
//!
//! Every list response carries an `ETag` derived from the data version,
//! the canonical request and the response's staleness. A matching
//! `If-None-Match` gets `304 Not Modified`. Fresh snapshot responses are
//! cacheable for `query.fresh_max_age_secs`; scans and stale responses for
//! `query.stale_max_age_secs` with `must-revalidate`.
//!
//! # Background refresh
//!
//! With `snapshot.refresh_interval_secs > 0` the server runs the Cache
//! Materializer on startup and then on that period. Runs that find the
//! snapshots current are no-ops.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lot_catalog_core::error::{CatalogError, Diagnostic};
use lot_catalog_core::models::VehicleRecord;
use lot_catalog_core::source::RecordSource;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::materialize::materialize_snapshots;
use crate::query::{parse_params, InventoryRequest, ListResponse, QueryService, ServedFrom};
use crate::sqlite_source::SqliteRecordSource;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    service: Arc<QueryService>,
}

/// Build the router over an existing Query Service.
pub fn build_router(config: Arc<Config>, service: Arc<QueryService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/inventory", get(handle_inventory))
        .route("/inventory/{key}", get(handle_vehicle))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { config, service })
}

/// Starts the HTTP server against the configured SQLite Record Source.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());
    let source: Arc<dyn RecordSource> = Arc::new(SqliteRecordSource::new(&config));
    let service = Arc::new(QueryService::new(config.clone(), source.clone())?);

    if config.snapshot.refresh_interval_secs > 0 {
        tokio::spawn(refresh_loop(config.clone(), source));
    }

    let app = build_router(config, service);

    println!("Inventory server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn refresh_loop(config: Arc<Config>, source: Arc<dyn RecordSource>) {
    let period = Duration::from_secs(config.snapshot.refresh_interval_secs);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = materialize_snapshots(&config, source.as_ref(), false).await {
            tracing::warn!(error = %format!("{:#}", e), "background materialization failed");
        }
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match &e {
            CatalogError::NotFound(_) => not_found(e.to_string()),
            _ => internal(e.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /inventory ============

/// `Cache-Control` value for a list response.
fn cache_control(config: &Config, resp: &ListResponse) -> String {
    if resp.served_from == ServedFrom::Snapshot && !resp.stale {
        format!("public, max-age={}", config.query.fresh_max_age_secs)
    } else {
        format!(
            "public, max-age={}, must-revalidate",
            config.query.stale_max_age_secs
        )
    }
}

/// Whether an `If-None-Match` header value names `etag`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// Handler for `GET /inventory`.
///
/// Returns `400` for malformed parameters and `304` when `If-None-Match`
/// matches the response fingerprint. Everything else is `200`.
async fn handle_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let request = parse_params(
        &params,
        state.config.query.default_per_page,
        state.config.query.max_per_page,
    )
    .map_err(bad_request)?;

    let resp = match request {
        InventoryRequest::List(req) => state.service.list(&req).await,
        InventoryRequest::Single(key) => state.service.list_one(&key).await,
    };

    let etag = format!("\"{}\"", resp.fingerprint);
    let cache = cache_control(&state.config, &resp);
    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));

    let response_headers = [(header::ETAG, etag), (header::CACHE_CONTROL, cache)];
    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, response_headers).into_response());
    }
    Ok((StatusCode::OK, response_headers, Json(resp)).into_response())
}

// ============ GET /inventory/{key} ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VehicleResponse {
    vehicle: VehicleRecord,
    served_from: ServedFrom,
    diagnostics: Vec<Diagnostic>,
}

/// Handler for `GET /inventory/{key}`. `404` when no vehicle has the key
/// as its stock number or VIN.
async fn handle_vehicle(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<VehicleResponse>, AppError> {
    let found = state.service.get_one(&key).await?;
    Ok(Json(VehicleResponse {
        vehicle: found.vehicle,
        served_from: found.served_from,
        diagnostics: found.diagnostics,
    }))
}
