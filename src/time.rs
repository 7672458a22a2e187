//! Platform-agnostic time utilities
//!
//! Seconds since start-up, from `performance.now()` in the browser and a
//! process-wide `Instant` natively. Used to time dataset loads and settles.

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub fn now_seconds() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm")))]
pub fn now_seconds() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Milliseconds elapsed since `started` (a `now_seconds` reading)
pub fn elapsed_ms(started: f64) -> f64 {
    ((now_seconds() - started) * 1000.0).max(0.0)
}
