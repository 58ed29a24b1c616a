use std::sync::Arc;

use crate::colors::{LINE_COLOR, Rgba, color_for};
use crate::region::GeometryCollection;

pub const COUNTIES_LAYER_ID: &str = "counties";

/// Declarative description of one drawable layer: the geometry plus how each
/// feature is filled and stroked.
#[derive(Debug, Clone)]
pub struct StyledLayer {
    pub id: &'static str,
    pub data: Arc<GeometryCollection>,
    pub filled: bool,
    pub stroked: bool,
    /// Reports pointer events for its features.
    pub pickable: bool,
    pub line_width: f64,
    pub line_width_min_pixels: f64,
    pub line_color: Rgba,
    /// One fill per feature, in collection order.
    pub fill_colors: Arc<[Rgba]>,
    /// Bumped every time the fills are re-derived from a new collection.
    pub fill_revision: u64,
}

impl StyledLayer {
    pub fn fill_for(&self, index: usize) -> Option<Rgba> {
        self.fill_colors.get(index).copied()
    }

    /// Stroke width in device pixels, never thinner than the minimum.
    pub fn stroke_pixels(&self) -> f64 {
        self.line_width.max(self.line_width_min_pixels)
    }
}

#[derive(Debug, Clone)]
struct FillCache {
    source: Arc<GeometryCollection>,
    fills: Arc<[Rgba]>,
    revision: u64,
}

/// Turns the loaded collection into layers, memoizing per-feature fills for
/// as long as the collection reference stays the same.
#[derive(Debug, Clone, Default)]
pub struct LayerBuilder {
    cache: Option<FillCache>,
    revisions: u64,
}

impl LayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero layers while nothing is loaded, otherwise exactly one.
    pub fn build(&mut self, collection: Option<&Arc<GeometryCollection>>) -> Vec<StyledLayer> {
        let Some(collection) = collection else {
            return Vec::new();
        };

        let (fill_colors, fill_revision) = self.fills_for(collection);
        vec![StyledLayer {
            id: COUNTIES_LAYER_ID,
            data: Arc::clone(collection),
            filled: true,
            stroked: true,
            pickable: true,
            line_width: 1.0,
            line_width_min_pixels: 0.5,
            line_color: LINE_COLOR,
            fill_colors,
            fill_revision,
        }]
    }

    fn fills_for(&mut self, collection: &Arc<GeometryCollection>) -> (Arc<[Rgba]>, u64) {
        if let Some(cache) = &self.cache
            && Arc::ptr_eq(&cache.source, collection)
        {
            return (Arc::clone(&cache.fills), cache.revision);
        }

        self.revisions += 1;
        let fills: Arc<[Rgba]> = collection
            .regions()
            .iter()
            .map(|region| color_for(region.id.as_ref()))
            .collect();
        self.cache = Some(FillCache {
            source: Arc::clone(collection),
            fills: Arc::clone(&fills),
            revision: self.revisions,
        });
        (fills, self.revisions)
    }
}

/// One-shot build without memoization.
pub fn build_layers(collection: Option<&Arc<GeometryCollection>>) -> Vec<StyledLayer> {
    LayerBuilder::new().build(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, RegionId};

    fn collection(ids: &[i64]) -> Arc<GeometryCollection> {
        Arc::new(GeometryCollection::new(
            ids.iter()
                .map(|&id| Region::new(Some(RegionId::from(id))))
                .collect(),
        ))
    }

    #[test]
    fn absent_collection_builds_no_layers() {
        assert!(build_layers(None).is_empty());
    }

    #[test]
    fn single_region_builds_one_layer_referencing_collection() {
        let data = collection(&[6037]);
        let layers = build_layers(Some(&data));

        assert_eq!(layers.len(), 1);
        let layer = &layers[0];
        assert_eq!(layer.id, COUNTIES_LAYER_ID);
        assert!(Arc::ptr_eq(&layer.data, &data));
        assert!(layer.filled && layer.stroked && layer.pickable);
        assert_eq!(layer.line_color, Rgba(100, 100, 100, 180));
        assert_eq!(layer.line_width_min_pixels, 0.5);
        assert_eq!(layer.fill_for(0), Some(color_for(Some(&RegionId::from(6037)))));
        assert_eq!(layer.fill_for(1), None);
    }

    #[test]
    fn stroke_pixels_respects_minimum() {
        let data = collection(&[1]);
        let mut layer = build_layers(Some(&data)).remove(0);
        assert_eq!(layer.stroke_pixels(), 1.0);
        layer.line_width = 0.1;
        assert_eq!(layer.stroke_pixels(), 0.5);
    }

    #[test]
    fn fills_are_reused_for_same_collection() {
        let data = collection(&[1, 2, 3]);
        let mut builder = LayerBuilder::new();

        let first = builder.build(Some(&data)).remove(0);
        let second = builder.build(Some(&data)).remove(0);

        assert_eq!(first.fill_revision, second.fill_revision);
        assert!(Arc::ptr_eq(&first.fill_colors, &second.fill_colors));
    }

    #[test]
    fn new_collection_reference_recomputes_fills() {
        let mut builder = LayerBuilder::new();
        let first = builder.build(Some(&collection(&[1, 2]))).remove(0);
        // Equal contents, different reference: still a reload.
        let second = builder.build(Some(&collection(&[1, 2]))).remove(0);
        let third = builder.build(Some(&collection(&[7]))).remove(0);

        assert!(second.fill_revision > first.fill_revision);
        assert!(third.fill_revision > second.fill_revision);
        assert_eq!(third.fill_colors.len(), 1);
        assert_eq!(third.fill_for(0), Some(color_for(Some(&RegionId::from(7)))));
    }
}
