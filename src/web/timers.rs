//! Browser timers: `setTimeout` for hover collapse, animation frames for scroll

use std::rc::Rc;

use tracing::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::core::{CapsuleId, TimerHandle, Timers};

pub type FiredFn = Rc<dyn Fn(TimerHandle, CapsuleId)>;

/// `Timers` over `setTimeout`. The browser timeout id is the handle, so
/// clearing a fired id is already a no-op.
pub struct BrowserTimers {
    window: web_sys::Window,
    on_fired: FiredFn,
}

impl BrowserTimers {
    pub fn new(window: web_sys::Window, on_fired: FiredFn) -> Self {
        Self { window, on_fired }
    }
}

impl Timers for BrowserTimers {
    fn schedule(&mut self, delay_ms: f64, capsule: CapsuleId) -> TimerHandle {
        let on_fired = self.on_fired.clone();
        let handle_cell = Rc::new(std::cell::Cell::new(None::<TimerHandle>));
        let handle_for_cb = handle_cell.clone();

        let callback = Closure::once_into_js(move || {
            if let Some(handle) = handle_for_cb.get() {
                on_fired(handle, capsule);
            }
        });

        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms as i32)
            .unwrap_or_else(|e| {
                error!(?e, "setTimeout failed");
                0
            });
        let handle = TimerHandle::new(id as u64);
        handle_cell.set(Some(handle));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.raw() as i32);
    }
}

/// Run `f` on the next animation frame
pub fn request_frame(window: &web_sys::Window, f: impl FnOnce() + 'static) {
    let callback = Closure::once_into_js(move |_timestamp: f64| f());
    if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
        error!(?e, "requestAnimationFrame failed");
    }
}
