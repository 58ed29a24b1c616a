use std::cell::RefCell;
use std::sync::Arc;

use countymap_shared::view::BASEMAP_STYLE_URL;
use countymap_shared::{GeometryCollection, HoverController};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::canvas::MapCanvas;
use crate::source::{self, LoadState};
use crate::viewport::Viewport;

/// Window size, or a desktop default when there is no window.
pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

struct ResizeBinding {
    window: web_sys::Window,
    callback: Closure<dyn Fn()>,
}

impl Drop for ResizeBinding {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "resize",
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

// Context newtypes so same-shaped signals don't shadow each other.
#[derive(Clone, Copy)]
pub(crate) struct Geometry(pub RwSignal<Option<Arc<GeometryCollection>>>);
#[derive(Clone, Copy)]
pub(crate) struct Hover(pub RwSignal<HoverController>);
#[derive(Clone, Copy)]
pub(crate) struct LoadStatus(pub RwSignal<LoadState>);
#[derive(Clone, Copy)]
pub(crate) struct WindowSize(pub RwSignal<(f64, f64)>);

#[component]
pub fn App() -> impl IntoView {
    let geometry: RwSignal<Option<Arc<GeometryCollection>>> = RwSignal::new(None);
    let hover = RwSignal::new(HoverController::default());
    let load_status = RwSignal::new(LoadState::Loading);
    let window_size = RwSignal::new(canvas_dimensions());
    let viewport = RwSignal::new(Viewport::default());

    provide_context(Geometry(geometry));
    provide_context(Hover(hover));
    provide_context(LoadStatus(load_status));
    provide_context(WindowSize(window_size));
    provide_context(viewport);

    // Geometry is fetched once per mount
    Effect::new(move || {
        source::start_load(geometry, load_status);
    });

    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        let cb = Closure::<dyn Fn()>::new(move || {
            window_size.set(canvas_dimensions());
        });
        if window
            .add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
            .is_err()
        {
            return;
        }
        RESIZE_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(ResizeBinding {
                window,
                callback: cb,
            });
        });
        on_cleanup(|| {
            RESIZE_BINDING.with(|slot| {
                slot.borrow_mut().take();
            });
        });
    });

    view! {
        <div style="position: relative; width: 100vw; height: 100vh; overflow: hidden; background: #f2f0eb;">
            <MapCanvas />
            <HoverLabel />
            <LoadOverlay />
            <a
                href=BASEMAP_STYLE_URL
                target="_blank"
                rel="noopener"
                style="position: absolute; right: 6px; bottom: 4px; z-index: 1; font: 11px system-ui, sans-serif; color: #666; text-decoration: none;"
            >
                {move || match load_status.get() {
                    LoadState::Ready { regions } => format!("{regions} counties \u{00B7} Basemap: CARTO Positron"),
                    _ => "Basemap: CARTO Positron".to_owned(),
                }}
            </a>
        </div>
    }
}

/// Floating label for the region under the pointer, offset from the cursor.
#[component]
fn HoverLabel() -> impl IntoView {
    let Hover(hover) = expect_context();

    let overlay = Memo::new(move |_| hover.with(|controller| controller.tooltip()));

    move || {
        let Some(overlay) = overlay.get() else {
            return ().into_any();
        };
        view! {
            <div
                style:left=format!("{}px", overlay.left)
                style:top=format!("{}px", overlay.top)
                style="position: absolute; z-index: 1; pointer-events: none; background: rgba(0, 0, 0, 0.8); color: #fff; padding: 6px 10px; border-radius: 4px; font-size: 13px; font-family: system-ui, sans-serif; white-space: nowrap;"
            >
                {overlay.text}
            </div>
        }
        .into_any()
    }
}

/// Loading notice, or the load error with a retry button.
#[component]
fn LoadOverlay() -> impl IntoView {
    let Geometry(geometry) = expect_context();
    let LoadStatus(load_status) = expect_context();

    move || match load_status.get() {
        LoadState::Ready { .. } => ().into_any(),
        LoadState::Loading => view! {
            <div style="position: absolute; top: 12px; left: 12px; z-index: 2; padding: 6px 10px; border-radius: 4px; background: rgba(255, 255, 255, 0.9); color: #333; font: 13px system-ui, sans-serif;">
                "Loading county boundaries\u{2026}"
            </div>
        }
        .into_any(),
        LoadState::Failed(message) => view! {
            <div style="position: absolute; top: 12px; left: 12px; z-index: 2; max-width: 360px; padding: 10px 12px; border-radius: 4px; background: rgba(255, 255, 255, 0.95); border: 1px solid #d9534f; color: #333; font: 13px system-ui, sans-serif;">
                <div style="font-weight: 600; color: #b52b27;">"Could not load county boundaries"</div>
                <div style="margin-top: 4px; word-break: break-word;">{message}</div>
                <button
                    style="margin-top: 8px; padding: 4px 12px; border: 1px solid #999; border-radius: 3px; background: #fff; cursor: pointer;"
                    on:click=move |_| source::start_load(geometry, load_status)
                >
                    "Retry"
                </button>
            </div>
        }
        .into_any(),
    }
}
