use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::COUNTIES_CACHE_CONTROL;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.geometry.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "geometry_loaded": snapshot.is_loaded(),
        "regions": snapshot.region_count(),
        "loaded_at": snapshot.loaded_at.map(|t| t.to_rfc3339()),
        "last_error": snapshot.last_error,
    }))
}

/// Serve the county GeoJSON exactly as received from upstream.
pub async fn get_counties(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.observability.record_counties_request();
    let (loaded, etag, document, last_error) = {
        let snapshot = state.geometry.read().await;
        (
            snapshot.is_loaded(),
            snapshot.etag.clone(),
            Arc::clone(&snapshot.document),
            snapshot.last_error.clone(),
        )
    };

    if !loaded {
        let error = last_error.unwrap_or_else(|| "county geometry is still loading".to_owned());
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CACHE_CONTROL, "no-store")],
            Json(serde_json::json!({ "error": error })),
        )
            .into_response();
    }

    if if_none_match_matches(&headers, &etag) {
        return not_modified_response(&etag);
    }

    json_bytes_response((*document).clone(), &etag)
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (regions, loaded) = {
        let snapshot = state.geometry.read().await;
        (snapshot.region_count(), snapshot.is_loaded())
    };
    let body = render_prometheus_metrics(regions, loaded, state.observability.snapshot());

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    regions: usize,
    geometry_loaded: bool,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP countymap_regions Number of regions in the loaded geometry."
    );
    let _ = writeln!(body, "# TYPE countymap_regions gauge");
    let _ = writeln!(body, "countymap_regions {regions}");

    let _ = writeln!(
        body,
        "# HELP countymap_geometry_loaded Whether the county geometry has been loaded (1) or not (0)."
    );
    let _ = writeln!(body, "# TYPE countymap_geometry_loaded gauge");
    let _ = writeln!(
        body,
        "countymap_geometry_loaded {}",
        u8::from(geometry_loaded)
    );

    let _ = writeln!(
        body,
        "# HELP countymap_counties_requests_total Total /api/counties requests."
    );
    let _ = writeln!(body, "# TYPE countymap_counties_requests_total counter");
    let _ = writeln!(
        body,
        "countymap_counties_requests_total {}",
        observability.counties_requests_total
    );

    let _ = writeln!(
        body,
        "# HELP countymap_geometry_load_failures_total Failed upstream geometry loads."
    );
    let _ = writeln!(body, "# TYPE countymap_geometry_load_failures_total counter");
    let _ = writeln!(
        body,
        "countymap_geometry_load_failures_total {}",
        observability.geometry_load_failures_total
    );

    body
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag)
}

fn not_modified_response(etag: &str) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    insert_cache_headers(response.headers_mut(), etag);
    response
}

fn json_bytes_response(body: Bytes, etag: &str) -> Response {
    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    insert_cache_headers(response.headers_mut(), etag);
    response
}

fn insert_cache_headers(headers: &mut HeaderMap, etag: &str) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(COUNTIES_CACHE_CONTROL),
    );
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
}
