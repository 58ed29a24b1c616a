use serde::{Deserialize, Serialize};

use crate::region::RegionId;

/// Fill alpha for every region. Semi-transparent so basemap labels stay legible.
pub const FILL_ALPHA: u8 = 160;

/// Stroke color shared by every region outline.
pub const LINE_COLOR: Rgba = Rgba::new(100, 100, 100, 180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(r, g, b, a)
    }

    /// Format as a CSS color string, alpha scaled to 0..1.
    pub fn to_css(self) -> String {
        let Self(r, g, b, a) = self;
        let alpha = f64::from(a) / 255.0;
        format!("rgba({r},{g},{b},{alpha:.3})")
    }
}

/// Deterministic fill color for a region identifier. Absent ids map like 0.
///
/// Each channel is an affine hash confined to its own sub-range, so fills
/// never approach pure black or white:
/// red 40..=239, green 40..=219, blue 60..=219.
pub fn color_for(id: Option<&RegionId>) -> Rgba {
    let n = id.map(RegionId::to_integer).unwrap_or(0);
    Rgba(
        channel(n, 37, 200, 40),
        channel(n, 73, 180, 40),
        channel(n, 113, 160, 60),
        FILL_ALPHA,
    )
}

fn channel(n: i64, multiplier: i64, modulus: i64, base: i64) -> u8 {
    // Reduce first: (k * n) mod m == (k * (n mod m)) mod m, and this cannot overflow.
    let value = (multiplier * n.rem_euclid(modulus)) % modulus + base;
    value as u8
}
