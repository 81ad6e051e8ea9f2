use wasm_bindgen::prelude::*;
use serde_wasm_bindgen::to_value;

// Create a console module for logging
pub mod console;
// Crate error type
pub mod error;
// Viewer tuning and constants
pub mod config;
// Wire structures of the building API
pub mod models;
// Typed station and geometry records
pub mod geometry;
// Geographic to station-frame projection
pub mod projection;
// Shape construction
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;
// Placement of records in the station frame
pub mod projector;
// Camera, lights and floor
pub mod environment;
// First person movement
pub mod navigation;
// REST client for the station endpoints
pub mod api;
// Viewer session owning all of the above
pub mod session;

use config::ViewerConfig;
use geometry::Station;
use models::{decode_camera, decode_dxf_records};
use projection::LocalFrame;
use projector::SceneProjector;
use session::ViewerSession;

// Use the macros from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => (crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("Photostation WASM module initialized");
    });
}

// An absent config object means all defaults
fn config_from_js(value: JsValue) -> Result<ViewerConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ViewerConfig::default());
    }
    if let Some(json) = value.as_string() {
        return Ok(ViewerConfig::from_json(&json)?);
    }
    let config: ViewerConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid viewer config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// 3D walkthrough of one photo station, driven from the host page.
#[wasm_bindgen]
pub struct StationViewer {
    session: ViewerSession,
}

#[wasm_bindgen]
impl StationViewer {
    /// Fetch camera and geometry for `station_id` and build the scene.
    pub async fn load(station_id: u32, config: JsValue) -> Result<StationViewer, JsValue> {
        let config = config_from_js(config)?;
        let session = ViewerSession::load(config, station_id).await?;
        Ok(StationViewer { session })
    }

    /// Build from payloads the host already fetched.
    #[wasm_bindgen(js_name = fromPayloads)]
    pub fn from_payloads(camera_json: &str, dxf_json: &str, config: JsValue) -> Result<StationViewer, JsValue> {
        let config = config_from_js(config)?;
        let station = Station::from_camera(&decode_camera(camera_json)?)?;
        let batch = decode_dxf_records(dxf_json)?;
        let session = ViewerSession::from_dxf(config, station, &batch)?;
        Ok(StationViewer { session })
    }

    pub fn environment(&self) -> Result<JsValue, JsValue> {
        Ok(to_value(self.session.environment())?)
    }

    pub fn objects(&self) -> Result<JsValue, JsValue> {
        Ok(to_value(&self.session.scene().objects)?)
    }

    #[wasm_bindgen(js_name = skippedRecords)]
    pub fn skipped_records(&self) -> u32 {
        let scene = self.session.scene();
        (scene.skipped_empty + scene.skipped_invalid) as u32
    }

    pub fn lock(&mut self) {
        self.session.navigation_mut().lock();
    }

    pub fn unlock(&mut self) {
        self.session.navigation_mut().unlock();
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self) -> bool {
        self.session.navigation().is_locked()
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, code: &str) -> bool {
        self.session.navigation_mut().key_down(code)
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, code: &str) -> bool {
        self.session.navigation_mut().key_up(code)
    }

    /// Advance one animation frame, `now_ms` from `performance.now()`.
    pub fn update(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        let motion = self.session.navigation_mut().update(now_ms);
        Ok(to_value(&motion)?)
    }
}

/// One-shot projection of a camera payload and a geometry list; returns
/// the placed objects plus skip counts.
#[wasm_bindgen]
pub fn project_station_geometry(camera_json: &str, dxf_json: &str, config: JsValue) -> Result<JsValue, JsValue> {
    let config = config_from_js(config)?;
    let station = Station::from_camera(&decode_camera(camera_json)?)?;
    let batch = decode_dxf_records(dxf_json)?;
    let projector = SceneProjector::new(LocalFrame::new(&station, &config));
    let scene = projector.project_dxf(&batch)?;
    Ok(to_value(&scene)?)
}
