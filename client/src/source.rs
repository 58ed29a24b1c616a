use std::future::Future;
use std::sync::Arc;

use countymap_shared::{GeometryCollection, GeometryError, GeometrySource, parse_collection};
use gloo_net::http::Request;
use leptos::prelude::*;

/// Same-origin endpoint serving the county GeoJSON.
pub const COUNTIES_ENDPOINT: &str = "/api/counties";

/// Where the one-shot geometry load stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready { regions: usize },
    Failed(String),
}

/// County boundaries fetched from the server with the browser's fetch API.
pub struct HttpGeometrySource {
    url: String,
}

impl HttpGeometrySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl GeometrySource for HttpGeometrySource {
    fn load(&self) -> impl Future<Output = Result<GeometryCollection, GeometryError>> {
        let url = self.url.clone();
        async move {
            let resp = Request::get(&url)
                .send()
                .await
                .map_err(|e| GeometryError::Fetch(e.to_string()))?;
            if !resp.ok() {
                return Err(GeometryError::Status(resp.status()));
            }
            let body = resp
                .binary()
                .await
                .map_err(|e| GeometryError::Fetch(e.to_string()))?;
            parse_collection(&body)
        }
    }
}

/// Fetch the geometry once and publish it. A result that lands after the
/// owning component is gone is dropped.
pub fn start_load(
    geometry: RwSignal<Option<Arc<GeometryCollection>>>,
    status: RwSignal<LoadState>,
) {
    status.set(LoadState::Loading);
    wasm_bindgen_futures::spawn_local(async move {
        let result = HttpGeometrySource::new(COUNTIES_ENDPOINT).load().await;
        if geometry.is_disposed() || status.is_disposed() {
            return;
        }
        match result {
            Ok(collection) => {
                let regions = collection.len();
                web_sys::console::info_1(&format!("loaded {regions} county regions").into());
                geometry.set(Some(Arc::new(collection)));
                status.set(LoadState::Ready { regions });
            }
            Err(e) => {
                web_sys::console::error_1(
                    &format!("failed to load county geometry: {e}").into(),
                );
                status.set(LoadState::Failed(e.to_string()));
            }
        }
    });
}
