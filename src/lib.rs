//! Circuit cluster dashboard - real-time circuit-breaker health visualization
//!
//! Consumes a stream of cluster metric snapshots and keeps one visual
//! element per circuit in sync with it:
//! - Circle: sized and placed by request rate per host, colored by errors
//! - Sparkline: request rate over the last two minutes
//!
//! `core` is platform-agnostic and shared by the WASM dashboard and the CLI.

pub mod core;
pub mod time;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod app;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod eventsource_wasm;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod stream_state;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod theme;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::app::CircuitApp;

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();

        // Initialize tracing for browser console
        tracing_wasm::set_as_global_default();

        let web_options = eframe::WebOptions::default();

        wasm_bindgen_futures::spawn_local(async {
            let canvas = web_sys::window()
                .expect("no window")
                .document()
                .expect("no document")
                .get_element_by_id("canvas")
                .expect("no canvas element")
                .dyn_into::<web_sys::HtmlCanvasElement>()
                .expect("not a canvas element");

            eframe::WebRunner::new()
                .start(
                    canvas,
                    web_options,
                    Box::new(|cc| Ok(Box::new(CircuitApp::new(cc)))),
                )
                .await
                .expect("Failed to start eframe");
        });
    }
}
