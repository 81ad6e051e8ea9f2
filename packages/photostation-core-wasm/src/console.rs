#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This allows us to access console.log / console.warn from JS
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    // Use `js_namespace` to bind `console.log(..)` instead of just `log(..)`
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    pub fn warn(s: &str);
}

// Imported JS functions cannot be called off wasm32, so native builds
// (unit tests, tooling) go through the `log` facade instead.
#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    log::debug!("{}", s);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(s: &str) {
    log::warn!("{}", s);
}

// Note: The console_log / console_warn macros are defined in lib.rs to avoid duplication
