//! Platform-agnostic time utilities
//!
//! Sample timestamps are wall-clock epoch milliseconds so seeded series
//! from the server line up with locally appended samples.

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm")))]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
