use earcutr::earcut;
use nalgebra::Point3;
use serde::Serialize;

use crate::error::{Result, ViewerError};

const EPSILON: f64 = 1e-10;

/// Simple 2D vector struct
#[derive(Clone, Copy, Debug, PartialEq)]
struct Vector2 {
    x: f64,
    y: f64,
}

impl Vector2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Attribute layout of a Three.js `BufferGeometry`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BufferGeometry {
    pub vertices: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub indices: Option<Vec<u32>>,
    pub has_data: bool,
}

impl BufferGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
    }
}

/// Vertex positions of a Three.js `Line`, no closing segment.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LinePath {
    pub points: Vec<f32>,
}

impl LinePath {
    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.points
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
    }
}

// Shoelace formula, positive for counter-clockwise rings
fn signed_area(points: &[Vector2]) -> f64 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Merge overlapping points in a contour, including a repeated closing point
fn merge_overlapping_points(points: &mut Vec<Vector2>) {
    points.dedup_by(|b, a| (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON);
    while points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first.x - last.x).abs() < EPSILON && (first.y - last.y).abs() < EPSILON {
            points.pop();
        } else {
            break;
        }
    }
}

// Clean up a raw boundary and force counter-clockwise winding
fn prepare_contour(contour: &[[f64; 2]]) -> Result<Vec<Vector2>> {
    let mut points: Vec<Vector2> = contour.iter().map(|p| Vector2::new(p[0], p[1])).collect();
    merge_overlapping_points(&mut points);

    if points.len() < 3 {
        return Err(ViewerError::Triangulation(format!(
            "boundary has {} distinct points, need at least 3",
            points.len()
        )));
    }
    let area = signed_area(&points);
    if !area.is_finite() || area.abs() < EPSILON {
        return Err(ViewerError::Triangulation(
            "boundary encloses no area".to_string(),
        ));
    }
    if area < 0.0 {
        points.reverse();
    }
    Ok(points)
}

// Triangulate a counter-clockwise contour, every triangle wound counter-clockwise
fn triangulate(contour: &[Vector2]) -> Result<Vec<[usize; 3]>> {
    let data: Vec<f64> = contour.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&data, &[], 2)
        .map_err(|e| ViewerError::Triangulation(format!("{:?}", e)))?;
    if indices.is_empty() {
        return Err(ViewerError::Triangulation(
            "earcut produced no triangles".to_string(),
        ));
    }

    let faces = indices
        .chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (contour[t[0]], contour[t[1]], contour[t[2]]);
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if cross < 0.0 {
                [t[0], t[2], t[1]]
            } else {
                [t[0], t[1], t[2]]
            }
        })
        .collect();
    Ok(faces)
}

struct MeshBuilder {
    vertices: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn vertex(&mut self, p: Vector2, z: f64, normal: [f32; 3]) -> u32 {
        let index = (self.vertices.len() / 3) as u32;
        self.vertices.extend_from_slice(&[p.x as f32, p.y as f32, z as f32]);
        self.normals.extend_from_slice(&normal);
        index
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32, flip: bool) {
        if flip {
            self.indices.extend_from_slice(&[a, c, b]);
        } else {
            self.indices.extend_from_slice(&[a, b, c]);
        }
    }

    // Triangulated cap at height z, facing +Z unless `flip`
    fn cap(&mut self, contour: &[Vector2], faces: &[[usize; 3]], z: f64, flip: bool) {
        let nz = if flip { -1.0 } else { 1.0 };
        let base: Vec<u32> = contour
            .iter()
            .map(|p| self.vertex(*p, z, [0.0, 0.0, nz]))
            .collect();
        for face in faces {
            self.triangle(base[face[0]], base[face[1]], base[face[2]], flip);
        }
    }

    fn build(self) -> BufferGeometry {
        BufferGeometry {
            vertices: self.vertices,
            normals: Some(self.normals),
            indices: Some(self.indices),
            has_data: true,
        }
    }
}

/// Flat surface at z = 0 for a closed 2D boundary.
pub fn flat_shape(contour: &[[f64; 2]]) -> Result<BufferGeometry> {
    let contour = prepare_contour(contour)?;
    let faces = triangulate(&contour)?;

    let mut mesh = MeshBuilder::new();
    mesh.cap(&contour, &faces, 0.0, false);
    Ok(mesh.build())
}

/// Solid slab: the boundary at z = 0 swept to z = `depth`, no bevel.
/// A negative depth sweeps towards -Z with faces still pointing outwards.
pub fn extrude_shape(contour: &[[f64; 2]], depth: f64) -> Result<BufferGeometry> {
    if !depth.is_finite() || depth == 0.0 {
        return Err(ViewerError::Triangulation(format!(
            "extrusion depth must be finite and non-zero, got {}",
            depth
        )));
    }
    let contour = prepare_contour(contour)?;
    let faces = triangulate(&contour)?;
    let flip = depth < 0.0;

    let mut mesh = MeshBuilder::new();

    // Bottom faces
    mesh.cap(&contour, &faces, 0.0, !flip);
    // Top faces
    mesh.cap(&contour, &faces, depth, flip);

    // Side walls, one quad per edge with its own outward normal
    let sign = if flip { -1.0 } else { 1.0 };
    for i in 0..contour.len() {
        let p = contour[i];
        let q = contour[(i + 1) % contour.len()];
        let (dx, dy) = (q.x - p.x, q.y - p.y);
        let len = (dx * dx + dy * dy).sqrt();
        let normal = [
            (sign * dy / len) as f32,
            (sign * -dx / len) as f32,
            0.0,
        ];
        let a = mesh.vertex(p, 0.0, normal);
        let b = mesh.vertex(q, 0.0, normal);
        let c = mesh.vertex(q, depth, normal);
        let d = mesh.vertex(p, depth, normal);
        mesh.triangle(a, b, c, flip);
        mesh.triangle(a, c, d, flip);
    }

    Ok(mesh.build())
}

/// Open path through `points` in order.
pub fn line_path(points: &[Point3<f64>]) -> LinePath {
    LinePath {
        points: points
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [[f64; 2]; 4] = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];

    fn face_normal(geometry: &BufferGeometry, face: &[u32]) -> [f64; 3] {
        let p: Vec<Point3<f64>> = geometry.positions().collect();
        let (a, b, c) = (p[face[0] as usize], p[face[1] as usize], p[face[2] as usize]);
        let n = (b - a).cross(&(c - a));
        [n.x, n.y, n.z]
    }

    #[test]
    fn flat_square_is_two_upward_triangles() {
        let geometry = flat_shape(&SQUARE).unwrap();
        let indices = geometry.indices.as_ref().unwrap();
        assert_eq!(indices.len(), 6);
        assert_eq!(geometry.vertex_count(), 4);
        assert!(geometry.positions().all(|p| p.z == 0.0));
        for face in indices.chunks(3) {
            assert!(face_normal(&geometry, face)[2] > 0.0);
        }
    }

    #[test]
    fn clockwise_input_is_rewound() {
        let mut reversed = SQUARE;
        reversed.reverse();
        let geometry = flat_shape(&reversed).unwrap();
        for face in geometry.indices.as_ref().unwrap().chunks(3) {
            assert!(face_normal(&geometry, face)[2] > 0.0);
        }
    }

    #[test]
    fn closing_point_is_merged() {
        let closed = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
        assert_eq!(flat_shape(&closed).unwrap().vertex_count(), 4);
    }

    #[test]
    fn concave_boundary_triangulates() {
        let l_shape = [
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ];
        let geometry = flat_shape(&l_shape).unwrap();
        assert_eq!(geometry.indices.unwrap().len(), 4 * 3);
    }

    #[test]
    fn degenerate_boundaries_fail() {
        assert!(flat_shape(&[[0.0, 0.0], [1.0, 1.0]]).is_err());
        assert!(flat_shape(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).is_err());
        assert!(extrude_shape(&SQUARE, 0.0).is_err());
    }

    #[test]
    fn extrusion_spans_depth_with_outward_faces() {
        let geometry = extrude_shape(&SQUARE, 2.0).unwrap();
        let zs: Vec<f64> = geometry.positions().map(|p| p.z).collect();
        let min = zs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = zs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 2.0);
        // 2 caps of 2 triangles + 4 walls of 2 triangles
        assert_eq!(geometry.indices.as_ref().unwrap().len(), 12 * 3);

        let centre = Point3::new(1.0, 1.0, 1.0);
        let positions: Vec<Point3<f64>> = geometry.positions().collect();
        for face in geometry.indices.as_ref().unwrap().chunks(3) {
            let n = face_normal(&geometry, face);
            let outward = positions[face[0] as usize] - centre;
            assert!(n[0] * outward.x + n[1] * outward.y + n[2] * outward.z > 0.0);
        }
    }

    #[test]
    fn negative_depth_stays_outward() {
        let geometry = extrude_shape(&SQUARE, -1.0).unwrap();
        let centre = Point3::new(1.0, 1.0, -0.5);
        let positions: Vec<Point3<f64>> = geometry.positions().collect();
        for face in geometry.indices.as_ref().unwrap().chunks(3) {
            let n = face_normal(&geometry, face);
            let outward = positions[face[0] as usize] - centre;
            assert!(n[0] * outward.x + n[1] * outward.y + n[2] * outward.z > 0.0);
        }
    }

    #[test]
    fn line_path_keeps_order_without_closing() {
        let path = line_path(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.5),
            Point3::new(1.0, 2.0, 0.5),
        ]);
        assert_eq!(path.points.len(), 9);
        assert_eq!(&path.points[3..6], &[1.0, 0.0, 0.5]);
        assert_eq!(path.positions().last(), Some(Point3::new(1.0, 2.0, 0.5)));
    }
}
