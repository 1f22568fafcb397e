//! Bellwether backend library.
//!
//! Exposes the metrics service modules for the binary and for router-level
//! integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod scrapers;

use std::sync::Arc;

use cache::MetricsCache;
use scrapers::DomeRestClient;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub dome: Arc<DomeRestClient>,
    pub cache: Arc<MetricsCache>,
}
