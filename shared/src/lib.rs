pub mod colors;
pub mod hover;
pub mod label;
pub mod layer;
pub mod projection;
pub mod region;
pub mod source;
pub mod view;

pub use colors::{Rgba, color_for};
pub use hover::{HoverController, HoverState, HoverTransition, LabelOverlay, PointerEvent};
pub use label::{LabelResolver, RegionLabel, label_for};
pub use layer::{LayerBuilder, StyledLayer, build_layers};
pub use region::{Boundary, GeometryCollection, Region, RegionId};
pub use source::{GeometryError, GeometrySource, StaticGeometrySource, parse_collection};
pub use view::{INITIAL_VIEW_STATE, InitialViewState};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::executor::block_on;

    use super::*;

    const TWO_COUNTIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 1,
                "properties": {"NAME": "First", "STATE": "AA"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
            },
            {
                "type": "Feature",
                "id": 2,
                "properties": {"name": "Second"},
                "geometry": {"type": "Polygon", "coordinates": [[[2, 2], [3, 2], [3, 3], [2, 2]]]}
            }
        ]
    }"#;

    #[derive(Debug, PartialEq)]
    enum Observed {
        Empty,
        Active(Option<RegionId>),
    }

    fn observe(state: &HoverState) -> Observed {
        match state {
            HoverState::Empty => Observed::Empty,
            HoverState::Active(active) => Observed::Active(active.region.id.clone()),
        }
    }

    #[test]
    fn load_style_and_hover_end_to_end() {
        let source = StaticGeometrySource::new(TWO_COUNTIES);
        let collection = Arc::new(block_on(source.load()).expect("load two counties"));

        let layers = LayerBuilder::new().build(Some(&collection));
        assert_eq!(layers.len(), 1);
        let layer = &layers[0];
        let first_fill = layer.fill_for(0).expect("fill for region 1");
        let second_fill = layer.fill_for(1).expect("fill for region 2");
        assert_ne!(first_fill, second_fill);

        let mut controller = HoverController::default();
        let mut sequence = vec![observe(controller.state())];

        let region_one = Arc::clone(&collection.regions()[0]);
        controller.handle(PointerEvent::over(region_one, 40.0, 60.0));
        sequence.push(observe(controller.state()));

        assert_eq!(
            controller.tooltip().map(|overlay| overlay.text),
            Some("First (AA)".to_owned())
        );

        controller.handle(PointerEvent::off(400.0, 600.0));
        sequence.push(observe(controller.state()));

        assert_eq!(
            sequence,
            vec![
                Observed::Empty,
                Observed::Active(Some(RegionId::from(1))),
                Observed::Empty,
            ]
        );
    }
}
