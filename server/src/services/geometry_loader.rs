use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use countymap_shared::{GeometryCollection, GeometryError, GeometrySource, parse_collection};
use tracing::{info, warn};

use crate::config::{counties_url, geometry_retry_interval};
use crate::state::AppState;

/// County GeoJSON fetched over HTTP.
pub struct UpstreamGeometrySource {
    client: reqwest::Client,
    url: String,
}

impl UpstreamGeometrySource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch and parse, keeping the raw document for serving.
    pub async fn fetch(&self) -> Result<(GeometryCollection, Bytes), GeometryError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeometryError::Fetch(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GeometryError::Status(status.as_u16()));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| GeometryError::Fetch(e.to_string()))?;
        let collection = parse_collection(&body)?;
        Ok((collection, body))
    }
}

impl GeometrySource for UpstreamGeometrySource {
    fn load(&self) -> impl Future<Output = Result<GeometryCollection, GeometryError>> {
        async move { self.fetch().await.map(|(collection, _)| collection) }
    }
}

/// Load the geometry once. Failures are recorded and retried after the
/// configured interval; the task ends after the first success.
pub async fn run(state: AppState) {
    let source = UpstreamGeometrySource::new(state.http_client.clone(), counties_url());
    let retry_interval = geometry_retry_interval();

    loop {
        match load_once(&state, &source).await {
            Ok(regions) => {
                info!(regions, url = %source.url, "loaded county geometry");
                return;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    url = %source.url,
                    retry_secs = retry_interval.as_secs(),
                    "failed to load county geometry"
                );
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}

pub(crate) async fn load_once(
    state: &AppState,
    source: &UpstreamGeometrySource,
) -> Result<usize, GeometryError> {
    match source.fetch().await {
        Ok((collection, document)) => {
            let regions = collection.len();
            let etag = document_etag(&document);
            let mut snapshot = state.geometry.write().await;
            snapshot.collection = Some(Arc::new(collection));
            snapshot.document = Arc::new(document);
            snapshot.etag = etag;
            snapshot.loaded_at = Some(Utc::now());
            snapshot.last_error = None;
            Ok(regions)
        }
        Err(e) => {
            state.observability.record_geometry_load_failure();
            state.geometry.write().await.last_error = Some(e.to_string());
            Err(e)
        }
    }
}

/// Strong validator from the document's CRC32 and length.
fn document_etag(document: &[u8]) -> String {
    format!(
        "\"counties-{:08x}-{}\"",
        crc32fast::hash(document),
        document.len()
    )
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    const ONE_COUNTY: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"06037","properties":{"NAME":"Los Angeles"},"geometry":{"type":"Polygon","coordinates":[[[-118.9,34.8],[-117.6,34.8],[-117.6,33.7],[-118.9,34.8]]]}}]}"#;

    async fn spawn_test_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn load_once_publishes_collection_and_document() {
        let upstream = Router::new().route("/counties.json", get(|| async { ONE_COUNTY }));
        let (addr, handle) = spawn_test_server(upstream).await;
        let state = AppState::new();
        let source = UpstreamGeometrySource::new(
            state.http_client.clone(),
            format!("http://{addr}/counties.json"),
        );

        let regions = load_once(&state, &source).await.expect("load geometry");
        assert_eq!(regions, 1);

        let snapshot = state.geometry.read().await;
        assert!(snapshot.is_loaded());
        assert_eq!(snapshot.region_count(), 1);
        assert_eq!(snapshot.document.as_ref(), ONE_COUNTY.as_bytes());
        assert!(snapshot.etag.starts_with("\"counties-"));
        assert!(snapshot.loaded_at.is_some());
        assert!(snapshot.last_error.is_none());
        drop(snapshot);

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn upstream_error_status_is_recorded() {
        let upstream = Router::new().route(
            "/counties.json",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let (addr, handle) = spawn_test_server(upstream).await;
        let state = AppState::new();
        let source = UpstreamGeometrySource::new(
            state.http_client.clone(),
            format!("http://{addr}/counties.json"),
        );

        let err = load_once(&state, &source).await.expect_err("429 fails");
        assert_eq!(err, GeometryError::Status(429));

        let snapshot = state.geometry.read().await;
        assert!(!snapshot.is_loaded());
        assert_eq!(snapshot.last_error.as_deref(), Some("HTTP 429"));
        drop(snapshot);
        assert_eq!(
            state.observability.snapshot().geometry_load_failures_total,
            1
        );

        handle.abort();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn malformed_document_is_a_parse_failure() {
        let upstream =
            Router::new().route("/counties.json", get(|| async { "<html>moved</html>" }));
        let (addr, handle) = spawn_test_server(upstream).await;
        let state = AppState::new();
        let source = UpstreamGeometrySource::new(
            state.http_client.clone(),
            format!("http://{addr}/counties.json"),
        );

        let err = source.load().await.expect_err("not geojson");
        assert!(matches!(err, GeometryError::Parse(_)));

        handle.abort();
        let _ = handle.await;
    }

    #[test]
    fn etag_changes_with_content() {
        assert_eq!(document_etag(b"abc"), document_etag(b"abc"));
        assert_ne!(document_etag(b"abc"), document_etag(b"abd"));
    }

    #[test]
    fn etag_is_crc32_and_length() {
        // CRC32 check value for "123456789"
        assert_eq!(document_etag(b"123456789"), "\"counties-cbf43926-9\"");
    }
}
