use serde::{Deserialize, Serialize};

/// Background style used behind the region layer.
pub const BASEMAP_STYLE_URL: &str = "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json";

/// Camera placement when the map first opens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

/// Continental United States.
pub const INITIAL_VIEW_STATE: InitialViewState = InitialViewState {
    longitude: -98.5,
    latitude: 39.0,
    zoom: 4.0,
    bearing: 0.0,
    pitch: 0.0,
    min_zoom: 3.0,
    max_zoom: 14.0,
};

impl Default for InitialViewState {
    fn default() -> Self {
        INITIAL_VIEW_STATE
    }
}

impl InitialViewState {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
