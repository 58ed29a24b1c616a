use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into a single `requestAnimationFrame` callback.
/// The map only changes in response to input or data, so nothing is drawn
/// unless `request()` was called since the last frame.
pub struct FrameScheduler {
    shared: Rc<Shared>,
}

struct Shared {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameScheduler {
    pub fn new(draw: impl Fn() + 'static) -> Self {
        let shared = Rc::new(Shared {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_shared = Rc::clone(&shared);
        let cb = Closure::<dyn FnMut()>::new(move || {
            frame_shared.pending.set(None);
            draw();
        });
        *shared.callback.borrow_mut() = Some(cb);

        Self { shared }
    }

    /// Ask for a repaint on the next frame. Repeated calls before that frame
    /// collapse into one draw.
    pub fn request(&self) {
        if self.shared.pending.get().is_some() {
            return;
        }
        let Some(window) = self.shared.window.as_ref() else {
            return;
        };
        let callback = self.shared.callback.borrow();
        let Some(cb) = callback.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.shared.pending.set(Some(id));
        }
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.shared.pending.take()
            && let Some(window) = self.shared.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        // The closure holds an Rc back to `shared`
        self.shared.callback.borrow_mut().take();
    }
}
