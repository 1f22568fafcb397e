//! HTTP surface: routes, handlers, and error shapes.
//!
//! Upstream trouble never becomes a 5xx here; it degrades the record instead.
//! The only client errors are an identifier-less combined query (400) and a
//! market whose order book cannot be fetched (404).

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{METRICS_CACHE_TTL_SECS, MIN_TRADES_FOR_VWAP, VWAP_WINDOWS_HOURS};
use crate::metrics::{combined_metrics, market_metrics, MetricsError};
use crate::models::{CombinedMetrics, MarketMetrics, Venue};
use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, error: &str, hint: &str) -> ApiError {
    (status, Json(json!({ "error": error, "hint": hint })))
}

/// Build the service router with CORS and request logging applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/metrics/combined", get(get_combined_metrics))
        .route("/api/metrics/:venue/:id", get(get_market_metrics))
        .route("/metrics/:id", get(get_legacy_metrics))
        .fallback(not_found)
        .layer(cors)
        .layer(axum::middleware::from_fn(
            crate::middleware::logging::request_logging,
        ))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cache_ttl_seconds": METRICS_CACHE_TTL_SECS,
        "dome_api_configured": state.dome.is_configured(),
        "cache_configured": state.cache.is_configured(),
        "vwap_windows_hours": VWAP_WINDOWS_HOURS,
        "min_trades_for_vwap": MIN_TRADES_FOR_VWAP,
    }))
}

async fn index() -> Json<Value> {
    Json(json!({
        "service": "bellwether-backend",
        "endpoints": {
            "GET /health": "service status and configuration",
            "GET /api/metrics/{venue}/{id}": "per-market metrics (venue: polymarket | kalshi)",
            "GET /api/metrics/combined?pm_token=&k_ticker=": "cross-venue metrics (at least one id)",
            "GET /metrics/{id}": "legacy per-market metrics (polymarket)",
        },
        "price_tiers": {
            "1": "6h VWAP (>= 10 trades)",
            "2": "12h or 24h VWAP (>= 10 trades)",
            "3": "Order book midpoint",
            "4": "Last VWAP (stale) or no data",
        },
    }))
}

async fn get_market_metrics(
    Path((venue, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<MarketMetrics>, ApiError> {
    // An unknown venue is an unmatched route, not a bad request.
    let Some(venue) = Venue::parse(&venue) else {
        return Err(not_found().await);
    };
    serve_market(&state, venue, &id).await
}

/// The pre-venue route family treated everything as Polymarket.
async fn get_legacy_metrics(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MarketMetrics>, ApiError> {
    serve_market(&state, Venue::Polymarket, &id).await
}

async fn serve_market(
    state: &AppState,
    venue: Venue,
    id: &str,
) -> Result<Json<MarketMetrics>, ApiError> {
    match market_metrics(state, venue, id).await {
        Ok(m) => Ok(Json(m)),
        Err(MetricsError::OrderBookUnavailable) => Err(error_body(
            StatusCode::NOT_FOUND,
            "Orderbook unavailable",
            "no order book could be fetched for this market; check the id and the venue",
        )),
    }
}

#[derive(Debug, Deserialize)]
struct CombinedQuery {
    pm_token: Option<String>,
    k_ticker: Option<String>,
}

async fn get_combined_metrics(
    Query(q): Query<CombinedQuery>,
    State(state): State<AppState>,
) -> Result<Json<CombinedMetrics>, ApiError> {
    let pm = q.pm_token.as_deref().filter(|s| !s.is_empty());
    let k = q.k_ticker.as_deref().filter(|s| !s.is_empty());
    if pm.is_none() && k.is_none() {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "Missing identifiers",
            "provide pm_token and/or k_ticker as query parameters",
        ));
    }
    Ok(Json(combined_metrics(&state, pm, k).await))
}

async fn not_found() -> ApiError {
    error_body(
        StatusCode::NOT_FOUND,
        "Not found",
        "see GET / for the endpoint list",
    )
}
