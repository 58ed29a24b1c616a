use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use countymap_shared::GeometryCollection;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{upstream_connect_timeout, upstream_http_timeout};

/// Loaded county geometry. Written once by the loader; readers only ever see
/// "not loaded yet" or the complete collection.
#[derive(Debug, Clone, Default)]
pub struct GeometrySnapshot {
    pub collection: Option<Arc<GeometryCollection>>,
    /// Upstream document as received, served without re-serialization.
    pub document: Arc<Bytes>,
    pub etag: String,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl GeometrySnapshot {
    pub fn is_loaded(&self) -> bool {
        self.collection.is_some()
    }

    pub fn region_count(&self) -> usize {
        self.collection.as_ref().map_or(0, |c| c.len())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub geometry: Arc<RwLock<GeometrySnapshot>>,
    pub http_client: reqwest::Client,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    counties_requests_total: AtomicU64,
    geometry_load_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub counties_requests_total: u64,
    pub geometry_load_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            counties_requests_total: self.counties_requests_total.load(Ordering::Relaxed),
            geometry_load_failures_total: self
                .geometry_load_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_counties_request(&self) {
        self.counties_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_geometry_load_failure(&self) {
        self.geometry_load_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("countymap/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            geometry: Arc::new(RwLock::new(GeometrySnapshot::default())),
            http_client,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}
