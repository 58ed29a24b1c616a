use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use countymap_shared::projection::ProjectedShape;
use countymap_shared::{LayerBuilder, PointerEvent as MapPointer, StyledLayer};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule, PointerEvent, WheelEvent};

use crate::app::{Geometry, Hover, WindowSize};
use crate::render_loop::FrameScheduler;
use crate::spatial::RegionIndex;
use crate::viewport::Viewport;

const BACKGROUND: &str = "#f2f0eb";

/// Pointer travel (CSS px) before a press turns into a pan.
const DRAG_THRESHOLD: f64 = 3.0;

/// CSS color strings for one layer's fills, refreshed when the fill revision moves.
#[derive(Default)]
struct FillCss {
    revision: Option<u64>,
    colors: Vec<String>,
}

impl FillCss {
    fn refresh(&mut self, layer: &StyledLayer) {
        if self.revision == Some(layer.fill_revision) {
            return;
        }
        self.colors = layer.fill_colors.iter().map(|c| c.to_css()).collect();
        self.revision = Some(layer.fill_revision);
    }
}

struct DragState {
    pressed: bool,
    panning: bool,
    start: (f64, f64),
    last: (f64, f64),
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
}

/// Canvas 2D choropleth: fills and outlines every region, reports hover to
/// the shared controller, pans on drag and zooms on wheel.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let Geometry(geometry) = expect_context();
    let Hover(hover) = expect_context();
    let WindowSize(window_size) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let layers: RwSignal<Vec<StyledLayer>> = RwSignal::new(Vec::new());

    let index = Rc::new(RefCell::new(RegionIndex::empty()));
    let builder = Rc::new(RefCell::new(LayerBuilder::new()));
    let fill_css = Rc::new(RefCell::new(FillCss::default()));
    // CSS size the viewport was last laid out for
    let laid_out = Rc::new(Cell::new(crate::app::canvas_dimensions()));
    let drag = Rc::new(RefCell::new(DragState {
        pressed: false,
        panning: false,
        start: (0.0, 0.0),
        last: (0.0, 0.0),
    }));

    // New collection: rebuild the hit index and restyle
    Effect::new({
        let index = index.clone();
        let builder = builder.clone();
        move || {
            let built = geometry.with(|data| {
                *index.borrow_mut() = RegionIndex::build(data.as_ref());
                builder.borrow_mut().build(data.as_ref())
            });
            layers.set(built);
        }
    });

    let scheduler = Rc::new(FrameScheduler::new({
        let index = index.clone();
        let fill_css = fill_css.clone();
        let laid_out = laid_out.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let Some(parent) = canvas.parent_element() else {
                return;
            };
            let css_w = parent.client_width() as f64;
            let css_h = parent.client_height() as f64;
            if css_w <= 0.0 || css_h <= 0.0 {
                return;
            }

            let (old_w, old_h) = laid_out.replace((css_w, css_h));
            if old_w != css_w || old_h != css_h {
                viewport.update(|vp| vp.resize(old_w, old_h, css_w, css_h));
            }

            let dpr = device_pixel_ratio();
            let px_w = (css_w * dpr).round().max(1.0) as u32;
            let px_h = (css_h * dpr).round().max(1.0) as u32;
            if canvas.width() != px_w || canvas.height() != px_h {
                canvas.set_width(px_w);
                canvas.set_height(px_h);
            }

            let Some(ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };
            if ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).is_err() {
                return;
            }

            let vp = viewport.get_untracked();
            let index = index.borrow();
            let mut fill_css = fill_css.borrow_mut();
            layers.with_untracked(|layers| {
                draw_layers(&ctx, &vp, &index, layers, &mut fill_css, css_w, css_h);
            });
        }
    }));

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            layers.track();
            viewport.track();
            window_size.track();
            scheduler.request();
        }
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let drag = drag.clone();
        move |e: PointerEvent| {
            let at = (e.client_x() as f64, e.client_y() as f64);
            *drag.borrow_mut() = DragState {
                pressed: true,
                panning: false,
                start: at,
                last: at,
            };
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let drag = drag.clone();
        let index = index.clone();
        move |e: PointerEvent| {
            let at = (e.client_x() as f64, e.client_y() as f64);
            {
                let mut drag = drag.borrow_mut();
                if drag.pressed {
                    if !drag.panning
                        && (at.0 - drag.start.0).hypot(at.1 - drag.start.1) >= DRAG_THRESHOLD
                    {
                        drag.panning = true;
                        set_cursor(&e, "grabbing");
                    }
                    if drag.panning {
                        let (dx, dy) = (at.0 - drag.last.0, at.1 - drag.last.1);
                        drag.last = at;
                        viewport.update(|vp| vp.pan(dx, dy));
                        return;
                    }
                }
            }

            let (x, y) = canvas_ref
                .get_untracked()
                .map(|el| {
                    let rect = el.get_bounding_client_rect();
                    (at.0 - rect.left(), at.1 - rect.top())
                })
                .unwrap_or((e.offset_x() as f64, e.offset_y() as f64));
            let (wx, wy) = viewport.with_untracked(|vp| vp.screen_to_world(x, y));
            let event = match index.borrow().region_at(wx, wy) {
                Some(region) => MapPointer::over(region, x, y),
                None => MapPointer::off(x, y),
            };
            hover.update(|controller| {
                controller.handle(event);
            });
        }
    };

    let on_pointer_up = {
        let drag = drag.clone();
        move |e: PointerEvent| {
            let mut drag = drag.borrow_mut();
            if drag.panning {
                set_cursor(&e, "grab");
            }
            drag.pressed = false;
            drag.panning = false;
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        hover.update(|controller| {
            controller.pointer_leave();
        });
    };

    view! {
        <div
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}

fn set_cursor(e: &PointerEvent, cursor: &str) {
    if let Some(target) = e.target()
        && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
    {
        el.style().set_property("cursor", cursor).ok();
    }
}

fn draw_layers(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    index: &RegionIndex,
    layers: &[StyledLayer],
    fill_css: &mut FillCss,
    css_w: f64,
    css_h: f64,
) {
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, css_w, css_h);
    ctx.set_line_join("round");

    let (min_x, min_y, max_x, max_y) = vp.visible_world(css_w, css_h);

    for layer in layers {
        // Shapes in the index belong to exactly one collection
        if !index
            .collection()
            .is_some_and(|data| Arc::ptr_eq(data, &layer.data))
        {
            continue;
        }
        if layer.filled {
            fill_css.refresh(layer);
        }
        ctx.set_stroke_style_str(&layer.line_color.to_css());
        ctx.set_line_width(layer.stroke_pixels());

        for (idx, shape) in index.shapes() {
            let b = &shape.bounds;
            if b.max_x < min_x || b.min_x > max_x || b.max_y < min_y || b.min_y > max_y {
                continue;
            }
            trace_shape(ctx, vp, shape);
            if layer.filled
                && let Some(css) = fill_css.colors.get(idx)
            {
                ctx.set_fill_style_str(css);
                ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
            }
            if layer.stroked {
                ctx.stroke();
            }
        }
    }
}

fn trace_shape(ctx: &CanvasRenderingContext2d, vp: &Viewport, shape: &ProjectedShape) {
    ctx.begin_path();
    for ring in &shape.rings {
        let mut points = ring.iter().map(|&(wx, wy)| vp.world_to_screen(wx, wy));
        let Some((x, y)) = points.next() else {
            continue;
        };
        ctx.move_to(x, y);
        for (x, y) in points {
            ctx.line_to(x, y);
        }
        ctx.close_path();
    }
}
