use countymap_shared::InitialViewState;
use countymap_shared::projection::{WORLD_SIZE, project};

const ZOOM_SENSITIVITY: f64 = 0.002;

/// Pan/zoom transform from projected world coordinates to CSS pixels:
/// `screen = world * scale + offset`, where `scale = 2^zoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    min_scale: f64,
    max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        let (w, h) = crate::app::canvas_dimensions();
        Self::from_view_state(&InitialViewState::default(), w, h)
    }
}

impl Viewport {
    /// Center the view's longitude/latitude in a canvas of the given CSS size.
    pub fn from_view_state(view: &InitialViewState, canvas_w: f64, canvas_h: f64) -> Self {
        let scale = view.clamp_zoom(view.zoom).exp2();
        let (cx, cy) = project(view.longitude, view.latitude);
        Self {
            offset_x: canvas_w / 2.0 - cx * scale,
            offset_y: canvas_h / 2.0 - cy * scale,
            scale,
            min_scale: view.min_zoom.exp2(),
            max_scale: view.max_zoom.exp2(),
        }
    }

    #[cfg(test)]
    pub fn zoom(&self) -> f64 {
        self.scale.log2()
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Longitude/latitude under a screen point.
    #[cfg(test)]
    pub fn screen_to_lng_lat(&self, sx: f64, sy: f64) -> (f64, f64) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        countymap_shared::projection::unproject(wx, wy)
    }

    /// Zoom toward a focus point (screen coordinates), within the zoom bounds.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        let ratio = new_scale / self.scale;

        // Keep the point under the cursor fixed
        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Keep the same world point at the canvas center when the canvas resizes.
    pub fn resize(&mut self, old_w: f64, old_h: f64, new_w: f64, new_h: f64) {
        self.offset_x += (new_w - old_w) / 2.0;
        self.offset_y += (new_h - old_h) / 2.0;
    }

    /// Visible world rectangle for a canvas of the given size.
    pub fn visible_world(&self, canvas_w: f64, canvas_h: f64) -> (f64, f64, f64, f64) {
        let (min_x, min_y) = self.screen_to_world(0.0, 0.0);
        let (max_x, max_y) = self.screen_to_world(canvas_w, canvas_h);
        (
            min_x.max(0.0),
            min_y.max(0.0),
            max_x.min(WORLD_SIZE),
            max_y.min(WORLD_SIZE),
        )
    }
}
