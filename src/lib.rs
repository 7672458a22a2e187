//! The Trailprint Atlas - hike map, trip timeline and trail history
//!
//! `core` holds the layout, hover, viewport and trail-group logic shared by
//! the browser front end (`wasm` feature) and the CLI (`cli` feature).

pub mod core;
pub mod theme;
pub mod time;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();

    wasm_bindgen_futures::spawn_local(web::run());
}
