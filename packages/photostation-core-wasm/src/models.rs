// Wire structures returned by the /build-api station endpoints
use serde::{Deserialize, Serialize};

use crate::console_warn;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub lat: f64,
    pub long: f64,
    pub z: f64,
}

// GET /build-api/station/{id}/camera/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraResponse {
    pub camera_position: CameraPosition,
    #[serde(default)]
    pub floor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoData {
    pub lat: f64,
    pub long: f64,
}

// The `geomjson` payload of a DXF import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    pub r#type: String,
    pub geodata: GeoData,
    #[serde(default)]
    pub normal: Option<[f64; 3]>,
    #[serde(default)]
    pub vert: Vec<[f64; 3]>,
}

// One element of GET /build-api/station/{id}/dxf/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DxfRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub layer: Option<String>,
    pub geomjson: Option<RawGeometry>,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub color_field: Option<String>,
}

pub fn decode_camera(json: &str) -> Result<CameraResponse> {
    serde_json::from_str(json).map_err(|e| ViewerError::decode("station camera", e))
}

/// Geometry list of a station with the elements that failed to decode
/// already dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxfBatch {
    pub records: Vec<DxfRecord>,
    pub malformed: usize,
}

impl DxfBatch {
    pub fn len(&self) -> usize {
        self.records.len() + self.malformed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Only a body that is not a JSON array fails; each element is decoded on
/// its own and a malformed one is logged and counted.
pub fn decode_dxf_records(json: &str) -> Result<DxfBatch> {
    let elements: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ViewerError::decode("station geometry list", e))?;
    let mut batch = DxfBatch::default();
    for (index, element) in elements.into_iter().enumerate() {
        let id = element.get("id").and_then(serde_json::Value::as_u64);
        match serde_json::from_value::<DxfRecord>(element) {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                console_warn!("Skipping malformed record {} (id {:?}): {}", index, id, err);
                batch.malformed += 1;
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camera_payload() {
        let camera = decode_camera(
            r#"{"camera_position": {"lat": 45.0, "long": 9.0, "z": 3.2}, "floor": 1.6}"#,
        )
        .unwrap();
        assert_eq!(camera.camera_position.lat, 45.0);
        assert_eq!(camera.camera_position.z, 3.2);
        assert_eq!(camera.floor, 1.6);
    }

    #[test]
    fn camera_without_position_is_rejected() {
        let err = decode_camera(r#"{"floor": 0}"#).unwrap_err();
        assert!(err.to_string().contains("station camera"));
    }

    #[test]
    fn decodes_records_with_null_geometry() {
        let records = decode_dxf_records(
            r##"[
                {"id": 1, "layer": "walls", "geomjson": null, "thickness": null, "color_field": "#ff0000"},
                {"id": 2, "geomjson": {
                    "type": "polyline",
                    "geodata": {"lat": 45.0, "long": 9.0},
                    "vert": [[0, 0, 0], [1, 0, 0]]
                }}
            ]"##,
        )
        .unwrap()
        .records;
        assert_eq!(records.len(), 2);
        assert!(records[0].geomjson.is_none());
        assert_eq!(records[0].layer.as_deref(), Some("walls"));
        let geom = records[1].geomjson.as_ref().unwrap();
        assert_eq!(geom.r#type, "polyline");
        assert_eq!(geom.normal, None);
        assert_eq!(geom.vert.len(), 2);
        assert_eq!(records[1].color_field, None);
    }

    #[test]
    fn malformed_element_is_dropped_alone() {
        let batch = decode_dxf_records(
            r#"[
                {"id": 1, "geomjson": {"type": "line", "geodata": {"lat": 0, "long": 0},
                    "vert": [[0, 0, 0], [1, 0, 0]]}},
                {"id": 2, "geomjson": {"type": "line", "geodata": {"lat": 0, "long": 0},
                    "vert": [[0, 0], [1, 0]]}},
                {"id": 3, "geomjson": {"type": "line", "vert": [[0, 0, 0], [1, 0, 0]]}},
                {"id": 4, "geomjson": null}
            ]"#,
        )
        .unwrap();
        assert_eq!(batch.malformed, 2);
        assert_eq!(batch.len(), 4);
        let ids: Vec<_> = batch.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(4)]);
    }

    #[test]
    fn body_that_is_not_a_list_is_rejected() {
        let err = decode_dxf_records(r#"{"geomjson": null}"#).unwrap_err();
        assert!(matches!(err, ViewerError::Decode { .. }));
        assert!(err.to_string().contains("station geometry list"));
    }
}
