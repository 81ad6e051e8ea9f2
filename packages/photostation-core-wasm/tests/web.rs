//! Tests for the JS-facing surface, run with `wasm-pack test --headless`.
#![cfg(target_arch = "wasm32")]

use photostation_core_wasm::{project_station_geometry, StationViewer};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const CAMERA: &str = r#"{"camera_position": {"lat": 45.0, "long": 9.0, "z": 1.6}, "floor": 0.0}"#;

const GEOMETRY: &str = r##"[
    {"id": 1, "geomjson": null},
    {"id": 2, "color_field": "#336699", "thickness": 2, "geomjson": {
        "type": "polygon", "geodata": {"lat": 45.0, "long": 9.0},
        "normal": [0, 0, 1], "vert": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]
    }},
    {"id": 3, "geomjson": {
        "type": "line", "geodata": {"lat": 45.0001, "long": 9.0},
        "vert": [[0, 0, 0], [0, 2, 0]]
    }}
]"##;

#[wasm_bindgen_test]
fn viewer_builds_from_payloads() {
    let mut viewer = StationViewer::from_payloads(CAMERA, GEOMETRY, JsValue::UNDEFINED).unwrap();
    assert_eq!(viewer.skipped_records(), 1);

    let objects = viewer.objects().unwrap();
    let array = js_sys::Array::from(&objects);
    assert_eq!(array.length(), 2);

    assert!(!viewer.is_locked());
    viewer.lock();
    assert!(viewer.key_down("KeyW"));
    viewer.update(0.0).unwrap();
    let motion = viewer.update(16.0).unwrap();
    let forward = js_sys::Reflect::get(&motion, &JsValue::from_str("moveForward"))
        .unwrap()
        .as_f64()
        .unwrap();
    assert!(forward > 0.0);
}

#[wasm_bindgen_test]
fn one_shot_projection_reports_skips() {
    let scene = project_station_geometry(CAMERA, GEOMETRY, JsValue::NULL).unwrap();
    let skipped = js_sys::Reflect::get(&scene, &JsValue::from_str("skippedEmpty"))
        .unwrap()
        .as_f64()
        .unwrap();
    assert_eq!(skipped, 1.0);
}

#[wasm_bindgen_test]
fn malformed_record_is_skipped_not_fatal() {
    let geometry = r#"[
        {"id": 1, "geomjson": {"type": "line", "geodata": {"lat": 45.0, "long": 9.0},
            "vert": [[0, 0, 0], [1, 0, 0]]}},
        {"id": 2, "geomjson": {"type": "line", "geodata": {"lat": 45.0, "long": 9.0},
            "vert": [[0, 0], [1, 0]]}}
    ]"#;
    let viewer = StationViewer::from_payloads(CAMERA, geometry, JsValue::UNDEFINED).unwrap();
    assert_eq!(viewer.skipped_records(), 1);
    assert_eq!(js_sys::Array::from(&viewer.objects().unwrap()).length(), 1);
}

#[wasm_bindgen_test]
fn malformed_payload_is_an_error() {
    let err = project_station_geometry("{}", GEOMETRY, JsValue::UNDEFINED).unwrap_err();
    assert!(err.as_string().unwrap().contains("station camera"));
}
