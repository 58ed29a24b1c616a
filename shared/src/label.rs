use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::region::{Region, number_text};

/// Resolved hover text for a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLabel {
    pub name: String,
    pub subdivision: String,
}

impl RegionLabel {
    /// `"Los Angeles (CA)"`, or just the name when there is no subdivision.
    pub fn display_text(&self) -> String {
        if self.subdivision.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.subdivision)
        }
    }
}

/// Attribute lookup chains for hover labels.
///
/// The defaults match the US county datasets (`NAME`, `name`, `NAMELSAD`, then
/// the FIPS code); other geometry sources can supply their own keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelResolver {
    pub name_keys: Vec<String>,
    pub subdivision_keys: Vec<String>,
    pub fallback_prefix: String,
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self {
            name_keys: ["NAME", "name", "NAMELSAD"].map(String::from).to_vec(),
            subdivision_keys: ["STATE", "state"].map(String::from).to_vec(),
            fallback_prefix: "FIPS".to_owned(),
        }
    }
}

impl LabelResolver {
    pub fn resolve(&self, region: &Region) -> RegionLabel {
        let name = first_present(region, &self.name_keys).unwrap_or_else(|| {
            let id = region
                .id
                .as_ref()
                .map_or_else(|| "undefined".to_owned(), ToString::to_string);
            format!("{} {id}", self.fallback_prefix)
        });
        let subdivision = first_present(region, &self.subdivision_keys).unwrap_or_default();
        RegionLabel { name, subdivision }
    }
}

/// Label using the default county schema.
pub fn label_for(region: &Region) -> RegionLabel {
    LabelResolver::default().resolve(region)
}

fn first_present(region: &Region, keys: &[String]) -> Option<String> {
    keys.iter()
        .find_map(|key| region.attribute(key).and_then(attribute_text))
}

/// Text of a usable attribute value. Empty strings, zero, false, null and
/// nested structures count as missing.
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(number_text(n)),
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}
