use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// GeoJSON position. Only the first two ordinates (longitude, latitude) are used.
pub type Position = Vec<f64>;

/// Feature identifier as it appears in the source: a JSON number or a string
/// such as the 5-digit county code `"06037"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionId {
    Number(serde_json::Number),
    Text(String),
}

impl RegionId {
    /// Integer form used for color derivation. Numbers truncate toward zero,
    /// strings parse after trimming; anything unparseable becomes 0.
    pub fn to_integer(&self) -> i64 {
        match self {
            Self::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(truncate_finite))
                .unwrap_or(0),
            Self::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return 0;
                }
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(truncate_finite))
                    .unwrap_or(0)
            }
        }
    }
}

fn truncate_finite(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    // Saturating float -> int cast.
    Some(value.trunc() as i64)
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&number_text(n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// JSON number as label text. Integral floats drop the fraction, so `1.0`
/// reads `1`.
pub(crate) fn number_text(n: &serde_json::Number) -> String {
    let Some(value) = n.as_f64().filter(|_| n.is_f64()) else {
        return n.to_string();
    };
    if value == 0.0 {
        "0".to_owned()
    } else if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{value:.0}")
    } else {
        n.to_string()
    }
}

impl From<i64> for RegionId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Region outline. Anything other than polygons is carried but never drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Boundary {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl Boundary {
    /// All linear rings, outer and inner, across every polygon part.
    pub fn rings(&self) -> Vec<&[Position]> {
        match self {
            Self::Polygon { coordinates } => coordinates.iter().map(Vec::as_slice).collect(),
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter().map(Vec::as_slice))
                .collect(),
            Self::Unsupported => Vec::new(),
        }
    }
}

/// One mapped area (a GeoJSON `Feature`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RegionId>,
    #[serde(rename = "geometry", default)]
    pub boundary: Option<Boundary>,
    #[serde(rename = "properties", default, deserialize_with = "null_as_empty")]
    pub attributes: Map<String, Value>,
}

impl Region {
    pub fn new(id: Option<RegionId>) -> Self {
        Self {
            id,
            boundary: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered, write-once set of regions (a GeoJSON `FeatureCollection`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct GeometryCollection {
    #[serde(default)]
    features: Vec<Arc<Region>>,
}

impl GeometryCollection {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            features: regions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn regions(&self) -> &[Arc<Region>] {
        &self.features
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Region>> {
        self.features.get(index)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
