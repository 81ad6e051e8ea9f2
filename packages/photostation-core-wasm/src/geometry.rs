use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::error::{Result, ViewerError};
use crate::models::{CameraResponse, DxfRecord, RawGeometry};

const DEFAULT_COLOR: &str = "#b3b3b3";
const GREY: f32 = 0xb3 as f32 / 255.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub long: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.long.is_finite()
    }
}

/// The capture point the scene is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Station {
    pub position: GeoPoint,
    /// Camera elevation in meters, building-local datum.
    pub elevation: f64,
    /// Floor level in meters, same datum.
    pub floor: f64,
}

impl Station {
    pub fn new(position: GeoPoint, elevation: f64, floor: f64) -> Self {
        Self {
            position,
            elevation,
            floor,
        }
    }

    pub fn from_camera(camera: &CameraResponse) -> Result<Self> {
        let pos = camera.camera_position;
        let station = Self::new(GeoPoint::new(pos.lat, pos.long), pos.z, camera.floor);
        if !station.position.is_finite() || !station.elevation.is_finite() || !station.floor.is_finite() {
            return Err(ViewerError::InvalidGeometry(
                "station camera position must be finite".to_string(),
            ));
        }
        Ok(station)
    }
}

// Struct to represent a color. `hex` is the string handed to the host
// material, which also understands CSS names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub hex: String,
}

impl Color {
    // Parse #RRGGBB or #RGB. Anything else renders grey here but keeps its
    // original string.
    pub fn parse(color_str: &str) -> Color {
        let trimmed = color_str.trim();
        if trimmed.is_empty() {
            return Color::default();
        }
        let rgb = match trimmed.strip_prefix('#') {
            Some(digits) if digits.len() == 6 => parse_channels(digits, 2),
            Some(digits) if digits.len() == 3 => parse_channels(digits, 1)
                .map(|[r, g, b]| [r * 17, g * 17, b * 17]),
            _ => None,
        };
        match rgb {
            Some([r, g, b]) => Color {
                r: r as f32 / 255.0,
                g: g as f32 / 255.0,
                b: b as f32 / 255.0,
                hex: trimmed.to_ascii_lowercase(),
            },
            None => Color {
                r: GREY,
                g: GREY,
                b: GREY,
                hex: trimmed.to_string(),
            },
        }
    }
}

fn parse_channels(digits: &str, width: usize) -> Option<[u8; 3]> {
    let channel = |i: usize| {
        digits
            .get(i * width..(i + 1) * width)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    Some([channel(0)?, channel(1)?, channel(2)?])
}

impl Default for Color {
    fn default() -> Self {
        Color::parse(DEFAULT_COLOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Polygon,
    Polyline,
    Line,
}

/// Shape of a surveyed record, vertices in the record's own Z-up frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Closed boundary lying in the plane described by `normal`.
    Polygon {
        normal: Vector3<f64>,
        vertices: Vec<Point3<f64>>,
        /// Extrusion depth; `None` draws a flat surface.
        thickness: Option<f64>,
    },
    Polyline { vertices: Vec<Point3<f64>> },
    Line { vertices: Vec<Point3<f64>> },
}

/// One surveyed feature, immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub id: Option<u64>,
    pub layer: Option<String>,
    pub anchor: GeoPoint,
    pub shape: Shape,
    pub color: Color,
}

impl GeometryRecord {
    pub fn polygon(
        anchor: GeoPoint,
        normal: Vector3<f64>,
        vertices: Vec<Point3<f64>>,
        thickness: Option<f64>,
        color: Color,
    ) -> Result<Self> {
        check_anchor(&anchor)?;
        check_vertices(&vertices, 3, "polygon")?;
        let length = normal.norm();
        if !length.is_finite() || length <= f64::EPSILON {
            return Err(ViewerError::InvalidGeometry(
                "polygon normal must be a non-zero finite vector".to_string(),
            ));
        }
        let thickness = thickness.filter(|t| t.is_finite() && *t != 0.0);
        Ok(Self {
            id: None,
            layer: None,
            anchor,
            shape: Shape::Polygon {
                normal: normal / length,
                vertices,
                thickness,
            },
            color,
        })
    }

    pub fn polyline(anchor: GeoPoint, vertices: Vec<Point3<f64>>, color: Color) -> Result<Self> {
        check_anchor(&anchor)?;
        check_vertices(&vertices, 2, "polyline")?;
        Ok(Self {
            id: None,
            layer: None,
            anchor,
            shape: Shape::Polyline { vertices },
            color,
        })
    }

    pub fn line(anchor: GeoPoint, vertices: Vec<Point3<f64>>, color: Color) -> Result<Self> {
        check_anchor(&anchor)?;
        check_vertices(&vertices, 2, "line")?;
        Ok(Self {
            id: None,
            layer: None,
            anchor,
            shape: Shape::Line { vertices },
            color,
        })
    }

    pub fn with_source(mut self, id: Option<u64>, layer: Option<String>) -> Self {
        self.id = id;
        self.layer = layer;
        self
    }

    pub fn kind(&self) -> GeometryKind {
        match self.shape {
            Shape::Polygon { .. } => GeometryKind::Polygon,
            Shape::Polyline { .. } => GeometryKind::Polyline,
            Shape::Line { .. } => GeometryKind::Line,
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        match &self.shape {
            Shape::Polygon { vertices, .. }
            | Shape::Polyline { vertices }
            | Shape::Line { vertices } => vertices,
        }
    }

    /// Convert a wire record. `Ok(None)` means the record carries no
    /// geometry and is skipped.
    pub fn from_dxf(record: &DxfRecord) -> Result<Option<Self>> {
        let Some(geom) = &record.geomjson else {
            return Ok(None);
        };
        let color = record
            .color_field
            .as_deref()
            .map(Color::parse)
            .unwrap_or_default();
        let built = Self::from_raw(geom, record.thickness, color)?;
        Ok(Some(built.with_source(record.id, record.layer.clone())))
    }

    fn from_raw(geom: &RawGeometry, thickness: Option<f64>, color: Color) -> Result<Self> {
        let anchor = GeoPoint::new(geom.geodata.lat, geom.geodata.long);
        let vertices: Vec<Point3<f64>> = geom
            .vert
            .iter()
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        match geom.r#type.as_str() {
            "polygon" => {
                let normal = geom.normal.ok_or_else(|| {
                    ViewerError::InvalidGeometry("polygon record without a normal".to_string())
                })?;
                Self::polygon(
                    anchor,
                    Vector3::new(normal[0], normal[1], normal[2]),
                    vertices,
                    thickness,
                    color,
                )
            }
            "polyline" => Self::polyline(anchor, vertices, color),
            "line" => Self::line(anchor, vertices, color),
            other => Err(ViewerError::UnknownGeometryKind(other.to_string())),
        }
    }
}

fn check_anchor(anchor: &GeoPoint) -> Result<()> {
    if anchor.is_finite() {
        Ok(())
    } else {
        Err(ViewerError::InvalidGeometry(
            "geodata anchor must be finite".to_string(),
        ))
    }
}

fn check_vertices(vertices: &[Point3<f64>], min: usize, kind: &str) -> Result<()> {
    if vertices.len() < min {
        return Err(ViewerError::InvalidGeometry(format!(
            "{} needs at least {} vertices, got {}",
            kind,
            min,
            vertices.len()
        )));
    }
    if vertices.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
        return Err(ViewerError::InvalidGeometry(format!(
            "{} has non-finite vertex coordinates",
            kind
        )));
    }
    Ok(())
}
