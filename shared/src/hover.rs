use std::sync::Arc;

use crate::label::{LabelResolver, RegionLabel};
use crate::region::Region;

/// Label offset from the pointer, in CSS pixels.
pub const LABEL_OFFSET_X: f64 = 12.0;
pub const LABEL_OFFSET_Y: f64 = -12.0;

/// Pointer report from the map surface: the region under the cursor, if any,
/// and the cursor's screen position.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    pub region: Option<Arc<Region>>,
    pub screen_x: f64,
    pub screen_y: f64,
}

impl PointerEvent {
    pub fn over(region: Arc<Region>, screen_x: f64, screen_y: f64) -> Self {
        Self {
            region: Some(region),
            screen_x,
            screen_y,
        }
    }

    pub fn off(screen_x: f64, screen_y: f64) -> Self {
        Self {
            region: None,
            screen_x,
            screen_y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActiveHover {
    pub region: Arc<Region>,
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub label: RegionLabel,
}

#[derive(Debug, Clone, Default)]
pub enum HoverState {
    #[default]
    Empty,
    Active(ActiveHover),
}

impl HoverState {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn active(&self) -> Option<&ActiveHover> {
        match self {
            Self::Active(active) => Some(active),
            Self::Empty => None,
        }
    }
}

/// What a single pointer event did to the hover state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTransition {
    /// Empty -> Active.
    Entered,
    /// Active -> Active on the same region; only the position changed.
    Moved,
    /// Active -> Active on a different region.
    Switched,
    /// Active -> Empty.
    Cleared,
    /// Empty -> Empty.
    Idle,
}

/// Floating label ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelOverlay {
    pub text: String,
    pub left: f64,
    pub top: f64,
}

/// Tracks which region is under the pointer. Every event is applied as it
/// arrives: no debouncing, no timers, the last event wins.
#[derive(Debug, Clone, Default)]
pub struct HoverController {
    resolver: LabelResolver,
    state: HoverState,
}

impl HoverController {
    pub fn new(resolver: LabelResolver) -> Self {
        Self {
            resolver,
            state: HoverState::Empty,
        }
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn handle(&mut self, event: PointerEvent) -> HoverTransition {
        let Some(region) = event.region else {
            return self.clear();
        };

        let (transition, label) = match &self.state {
            HoverState::Active(current) if Arc::ptr_eq(&current.region, &region) => {
                (HoverTransition::Moved, current.label.clone())
            }
            HoverState::Active(_) => (HoverTransition::Switched, self.resolver.resolve(&region)),
            HoverState::Empty => (HoverTransition::Entered, self.resolver.resolve(&region)),
        };

        self.state = HoverState::Active(ActiveHover {
            region,
            pointer_x: event.screen_x,
            pointer_y: event.screen_y,
            label,
        });
        transition
    }

    /// Pointer left the map surface entirely.
    pub fn pointer_leave(&mut self) -> HoverTransition {
        self.clear()
    }

    fn clear(&mut self) -> HoverTransition {
        match std::mem::take(&mut self.state) {
            HoverState::Active(_) => HoverTransition::Cleared,
            HoverState::Empty => HoverTransition::Idle,
        }
    }

    pub fn tooltip(&self) -> Option<LabelOverlay> {
        let active = self.state.active()?;
        Some(LabelOverlay {
            text: active.label.display_text(),
            left: active.pointer_x + LABEL_OFFSET_X,
            top: active.pointer_y + LABEL_OFFSET_Y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::label_for;
    use crate::region::RegionId;

    fn county(id: i64, name: &str) -> Arc<Region> {
        Arc::new(
            Region::new(Some(RegionId::from(id)))
                .with_attribute("NAME", name)
                .with_attribute("STATE", "06"),
        )
    }

    #[test]
    fn starts_empty() {
        let controller = HoverController::default();
        assert!(controller.state().is_empty());
        assert!(controller.tooltip().is_none());
    }

    #[test]
    fn move_over_region_enters_active() {
        let mut controller = HoverController::default();
        let r = county(6037, "Los Angeles");

        let transition = controller.handle(PointerEvent::over(r.clone(), 100.0, 50.0));

        assert_eq!(transition, HoverTransition::Entered);
        let active = controller.state().active().expect("active hover");
        assert!(Arc::ptr_eq(&active.region, &r));
        assert_eq!((active.pointer_x, active.pointer_y), (100.0, 50.0));
        assert_eq!(active.label, label_for(&r));
    }

    #[test]
    fn move_off_regions_clears() {
        let mut controller = HoverController::default();
        controller.handle(PointerEvent::over(county(1, "A"), 1.0, 1.0));

        assert_eq!(
            controller.handle(PointerEvent::off(5.0, 5.0)),
            HoverTransition::Cleared
        );
        assert!(controller.state().is_empty());
        assert_eq!(
            controller.handle(PointerEvent::off(6.0, 6.0)),
            HoverTransition::Idle
        );
    }

    #[test]
    fn pointer_leave_clears() {
        let mut controller = HoverController::default();
        controller.handle(PointerEvent::over(county(1, "A"), 1.0, 1.0));
        assert_eq!(controller.pointer_leave(), HoverTransition::Cleared);
        assert!(controller.state().is_empty());
    }

    #[test]
    fn new_region_overwrites_without_clearing() {
        let mut controller = HoverController::default();
        controller.handle(PointerEvent::over(county(1, "Alpha"), 10.0, 10.0));

        let r2 = county(2, "Beta");
        let transition = controller.handle(PointerEvent::over(r2.clone(), 20.0, 30.0));

        assert_eq!(transition, HoverTransition::Switched);
        let active = controller.state().active().expect("still active");
        assert!(Arc::ptr_eq(&active.region, &r2));
        assert_eq!(active.label.name, "Beta");
        assert_eq!((active.pointer_x, active.pointer_y), (20.0, 30.0));
    }

    #[test]
    fn every_move_within_region_updates_position() {
        let mut controller = HoverController::default();
        let r = county(1, "Alpha");
        controller.handle(PointerEvent::over(r.clone(), 10.0, 10.0));

        for step in 1..=3 {
            let x = 10.0 + f64::from(step);
            assert_eq!(
                controller.handle(PointerEvent::over(r.clone(), x, 10.0)),
                HoverTransition::Moved
            );
            let active = controller.state().active().expect("active");
            assert_eq!(active.pointer_x, x);
        }
    }

    #[test]
    fn distinct_region_sharing_an_id_gets_its_own_label() {
        let mut controller = HoverController::default();
        let north = county(5, "North");
        let south = county(5, "South");
        controller.handle(PointerEvent::over(north, 1.0, 1.0));

        let transition = controller.handle(PointerEvent::over(south.clone(), 2.0, 2.0));

        assert_eq!(transition, HoverTransition::Switched);
        let active = controller.state().active().expect("active");
        assert!(Arc::ptr_eq(&active.region, &south));
        assert_eq!(active.label, label_for(&south));
        assert_eq!(active.label.name, "South");
    }

    #[test]
    fn label_resolved_with_configured_schema() {
        let resolver = LabelResolver {
            name_keys: vec!["title".into()],
            subdivision_keys: vec![],
            fallback_prefix: "Area".into(),
        };
        let mut controller = HoverController::new(resolver);
        let r = Arc::new(Region::new(Some(RegionId::from(4))).with_attribute("NAME", "Ignored"));

        controller.handle(PointerEvent::over(r, 0.0, 0.0));
        let label = &controller.state().active().expect("active").label;
        assert_eq!(label.name, "Area 4");
    }

    #[test]
    fn tooltip_offsets_from_pointer() {
        let mut controller = HoverController::default();
        controller.handle(PointerEvent::over(county(6037, "Los Angeles"), 100.0, 50.0));

        assert_eq!(
            controller.tooltip(),
            Some(LabelOverlay {
                text: "Los Angeles (06)".into(),
                left: 112.0,
                top: 38.0,
            })
        );
    }
}
