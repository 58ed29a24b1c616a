//! Web Mercator projection into a square world of [`WORLD_SIZE`] units, with
//! y growing southward. Zoom level `z` renders that world at `WORLD_SIZE * 2^z`
//! screen pixels.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use crate::region::{Boundary, Position};

pub const WORLD_SIZE: f64 = 512.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude/latitude in degrees to world coordinates.
pub fn project(lng: f64, lat: f64) -> (f64, f64) {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lng + 180.0) / 360.0 * WORLD_SIZE;
    let y = (PI - (FRAC_PI_4 + phi / 2.0).tan().ln()) / TAU * WORLD_SIZE;
    (x, y)
}

/// World coordinates back to longitude/latitude in degrees.
pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lng = x / WORLD_SIZE * 360.0 - 180.0;
    let lat = (2.0 * (PI - y / WORLD_SIZE * TAU).exp().atan() - FRAC_PI_2).to_degrees();
    (lng, lat)
}

/// Axis-aligned bounds in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min_x: f64::MAX,
        min_y: f64::MAX,
        max_x: f64::MIN,
        max_y: f64::MIN,
    };

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A region outline projected to world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedShape {
    pub rings: Vec<Vec<(f64, f64)>>,
    pub bounds: Bounds,
}

impl ProjectedShape {
    /// Project every ring of a boundary. Rings with fewer than three usable
    /// positions are dropped; `None` when nothing drawable remains.
    pub fn from_boundary(boundary: &Boundary) -> Option<Self> {
        let mut bounds = Bounds::EMPTY;
        let rings: Vec<Vec<(f64, f64)>> = boundary
            .rings()
            .into_iter()
            .map(project_ring)
            .filter(|ring| ring.len() >= 3)
            .inspect(|ring| {
                for &(x, y) in ring {
                    bounds.include(x, y);
                }
            })
            .collect();

        if rings.is_empty() {
            return None;
        }
        Some(Self { rings, bounds })
    }

    /// Even-odd containment across all rings, so holes are excluded.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let mut inside = false;
        for ring in &self.rings {
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

fn project_ring(ring: &[Position]) -> Vec<(f64, f64)> {
    ring.iter()
        .filter_map(|position| match position.as_slice() {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(project(*lng, *lat)),
            _ => None,
        })
        .collect()
}
