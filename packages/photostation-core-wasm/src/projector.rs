use nalgebra::{
    Isometry3, Point3, Quaternion, Similarity3, Translation3, UnitQuaternion, Vector3,
};
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{Result, ViewerError};
use crate::extrude::{extrude_shape, flat_shape, line_path, BufferGeometry, LinePath};
use crate::geometry::{Color, GeometryKind, GeometryRecord, Shape};
use crate::models::DxfBatch;
use crate::projection::LocalFrame;
use crate::{console_log, console_warn};

/// Composed placement of a scene object, in the order Three.js applies it:
/// scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectTransform {
    pub position: [f64; 3],
    /// `[x, y, z, w]`
    pub quaternion: [f64; 4],
    pub scale: f64,
}

impl ObjectTransform {
    fn from_similarity(sim: &Similarity3<f64>) -> Self {
        let t = sim.isometry.translation.vector;
        let q = sim.isometry.rotation;
        Self {
            position: [t.x, t.y, t.z],
            quaternion: [q.i, q.j, q.k, q.w],
            scale: sim.scaling(),
        }
    }

    pub fn similarity(&self) -> Similarity3<f64> {
        let [x, y, z, w] = self.quaternion;
        Similarity3::from_parts(
            Translation3::new(self.position[0], self.position[1], self.position[2]),
            UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
            self.scale,
        )
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.similarity().transform_point(point)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectGeometry {
    Mesh(BufferGeometry),
    Line(LinePath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MaterialKind {
    Standard,
    LineBasic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    pub double_sided: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// A record placed in the station frame, ready for the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: Option<u64>,
    pub layer: Option<String>,
    pub kind: GeometryKind,
    pub material: Material,
    pub geometry: ObjectGeometry,
    pub transform: ObjectTransform,
}

impl SceneObject {
    /// Vertex positions after the object transform.
    pub fn world_vertices(&self) -> Vec<Point3<f64>> {
        let sim = self.transform.similarity();
        match &self.geometry {
            ObjectGeometry::Mesh(mesh) => mesh.positions().map(|p| sim.transform_point(&p)).collect(),
            ObjectGeometry::Line(line) => line.positions().map(|p| sim.transform_point(&p)).collect(),
        }
    }
}

/// Rotation taking a polygon's plane onto the horizontal working plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    to_working: UnitQuaternion<f64>,
    back: UnitQuaternion<f64>,
}

impl Orientation {
    /// `None` when the normal already points up and no rotation is needed.
    pub fn for_normal(normal: &Vector3<f64>) -> Option<Self> {
        let up = Vector3::z();
        if *normal == up {
            return None;
        }
        let to_working = UnitQuaternion::rotation_between(normal, &up)
            .unwrap_or_else(|| half_turn_about_orthogonal(normal));
        Some(Self {
            to_working,
            back: to_working.inverse(),
        })
    }

    pub fn to_working(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.to_working * v
    }

    pub fn from_working(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.back * v
    }

    pub fn back(&self) -> UnitQuaternion<f64> {
        self.back
    }
}

// Normal pointing straight down: any axis orthogonal to it works
fn half_turn_about_orthogonal(normal: &Vector3<f64>) -> UnitQuaternion<f64> {
    let axis = if normal.x.abs() > normal.z.abs() {
        Vector3::new(-normal.y, normal.x, 0.0)
    } else {
        Vector3::new(0.0, -normal.z, normal.y)
    };
    UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(axis), PI)
}

/// Outcome of projecting a full geometry list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedScene {
    pub objects: Vec<SceneObject>,
    /// Records without a geometry payload.
    pub skipped_empty: usize,
    /// Records that could not be decoded or built.
    pub skipped_invalid: usize,
}

/// Places surveyed records in the station-centred scene.
pub struct SceneProjector {
    frame: LocalFrame,
    // Z-up survey frame to Y-up engine frame
    axis_change: UnitQuaternion<f64>,
}

impl SceneProjector {
    pub fn new(frame: LocalFrame) -> Self {
        Self {
            frame,
            axis_change: UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2),
        }
    }

    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    // Anchor placement, axis change and world scale shared by every kind
    fn record_placement(&self, record: &GeometryRecord) -> Similarity3<f64> {
        Similarity3::from_parts(
            Translation3::from(self.frame.placement_of(&record.anchor)),
            self.axis_change,
            self.frame.world_scale(),
        )
    }

    pub fn project(&self, record: &GeometryRecord) -> Result<SceneObject> {
        let placement = self.record_placement(record);
        match &record.shape {
            Shape::Polygon {
                normal,
                vertices,
                thickness,
            } => {
                let origin = *vertices.first().ok_or_else(|| {
                    ViewerError::InvalidGeometry("polygon has no vertices".to_string())
                })?;
                let orientation = Orientation::for_normal(normal);
                let contour: Vec<[f64; 2]> = vertices
                    .iter()
                    .map(|v| {
                        let relative = v - origin;
                        let working = match &orientation {
                            Some(o) => o.to_working(&relative),
                            None => relative,
                        };
                        [working.x, working.y]
                    })
                    .collect();

                let mesh = match thickness {
                    Some(depth) => extrude_shape(&contour, *depth)?,
                    None => flat_shape(&contour)?,
                };
                let back = orientation
                    .map(|o| o.back())
                    .unwrap_or_else(UnitQuaternion::identity);
                let local = Isometry3::from_parts(Translation3::from(origin.coords), back);

                Ok(SceneObject {
                    id: record.id,
                    layer: record.layer.clone(),
                    kind: GeometryKind::Polygon,
                    material: Material {
                        kind: MaterialKind::Standard,
                        color: record.color.clone(),
                        double_sided: thickness.is_none(),
                        cast_shadow: true,
                        receive_shadow: true,
                    },
                    geometry: ObjectGeometry::Mesh(mesh),
                    transform: ObjectTransform::from_similarity(&(placement * local)),
                })
            }
            Shape::Polyline { vertices } | Shape::Line { vertices } => Ok(SceneObject {
                id: record.id,
                layer: record.layer.clone(),
                kind: record.kind(),
                material: Material {
                    kind: MaterialKind::LineBasic,
                    color: record.color.clone(),
                    double_sided: false,
                    cast_shadow: false,
                    receive_shadow: false,
                },
                geometry: ObjectGeometry::Line(line_path(vertices)),
                transform: ObjectTransform::from_similarity(&placement),
            }),
        }
    }

    /// Project already decoded records, skipping those whose shape cannot
    /// be built.
    pub fn project_all(&self, records: &[GeometryRecord]) -> ProjectedScene {
        let mut scene = ProjectedScene::default();
        for record in records {
            match self.project(record) {
                Ok(object) => scene.objects.push(object),
                Err(err) => {
                    console_warn!("Skipping record {:?}: {}", record.id, err);
                    scene.skipped_invalid += 1;
                }
            }
        }
        scene
    }

    /// Decode and project the raw geometry list of a station. Elements
    /// dropped while decoding the list count as invalid.
    pub fn project_dxf(&self, batch: &DxfBatch) -> Result<ProjectedScene> {
        let mut scene = ProjectedScene {
            skipped_invalid: batch.malformed,
            ..ProjectedScene::default()
        };
        for raw in &batch.records {
            let record = match GeometryRecord::from_dxf(raw) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    scene.skipped_empty += 1;
                    continue;
                }
                Err(err) if err.is_record_level() => {
                    console_warn!("Skipping record {:?}: {}", raw.id, err);
                    scene.skipped_invalid += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            match self.project(&record) {
                Ok(object) => scene.objects.push(object),
                Err(err) if err.is_record_level() => {
                    console_warn!("Skipping record {:?}: {}", raw.id, err);
                    scene.skipped_invalid += 1;
                }
                Err(err) => return Err(err),
            }
        }
        console_log!(
            "Projected {} objects ({} empty, {} invalid records skipped)",
            scene.objects.len(),
            scene.skipped_empty,
            scene.skipped_invalid
        );
        Ok(scene)
    }
}
