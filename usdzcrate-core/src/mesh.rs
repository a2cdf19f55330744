//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use crate::traits::Drawable;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Signed volumes smaller than this fraction of the bounding cube are treated
/// as "no enclosed volume" when computing the center of mass.
const VOLUME_EPSILON: f64 = 1e-9;

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// True when every face index addresses an existing vertex.
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len();
        self.faces.iter().all(|f| f.iter().all(|&i| i < n))
    }

    /// Like [`has_valid_indices`](Self::has_valid_indices) but reports the first offending face.
    pub fn validate_indices(&self) -> Result<()> {
        let n = self.vertices.len();
        match self
            .faces
            .iter()
            .enumerate()
            .find(|(_, f)| f.iter().any(|&i| i >= n))
        {
            Some((fi, face)) => Err(Error::InvalidData(format!(
                "face {} references {:?} but the mesh has {} vertices",
                fi, face, n
            ))),
            None => Ok(()),
        }
    }

    /// Append another mesh, offsetting its indices past the current vertices.
    /// When `transform` is given it is applied to the appended vertices only.
    pub fn append(&mut self, other: &TriangleMesh, transform: Option<&Transform3D>) {
        let offset = self.vertices.len();
        match transform {
            Some(t) => self
                .vertices
                .extend(other.vertices.iter().map(|v| t.transform_point(v))),
            None => self.vertices.extend_from_slice(&other.vertices),
        }
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Merge several meshes into one. Shared vertices are not deduplicated.
    pub fn concatenate<I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = TriangleMesh>,
    {
        let mut merged = TriangleMesh::new();
        for mesh in meshes {
            merged.append(&mesh, None);
        }
        merged
    }

    /// Build a new mesh restricted to the given faces, in the given order.
    ///
    /// Vertices not referenced by the selection are dropped; the survivors keep
    /// their relative order so the result does not depend on selection order.
    pub fn submesh(&self, face_indices: &[usize]) -> TriangleMesh {
        let faces = face_indices
            .iter()
            .filter_map(|&fi| self.faces.get(fi).copied())
            .collect();
        let mut mesh = TriangleMesh::from_vertices_and_faces(self.vertices.clone(), faces);
        mesh.remove_unreferenced_vertices();
        mesh
    }

    /// Drop vertices that no face refers to and reindex the faces.
    pub fn remove_unreferenced_vertices(&mut self) {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        for face in &self.faces {
            for &i in face {
                remap[i] = 0;
            }
        }

        let mut next = 0usize;
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (i, slot) in remap.iter_mut().enumerate() {
            if *slot != usize::MAX {
                *slot = next;
                next += 1;
                kept.push(self.vertices[i]);
            }
        }

        for face in &mut self.faces {
            for i in face.iter_mut() {
                *i = remap[*i];
            }
        }
        self.vertices = kept;
    }

    /// Drop faces that repeat a vertex index. Returns how many were removed.
    pub fn remove_degenerate_faces(&mut self) -> usize {
        let before = self.faces.len();
        self.faces
            .retain(|&[a, b, c]| a != b && b != c && a != c);
        before - self.faces.len()
    }

    /// Merge vertices closer than `epsilon` and drop the faces that collapse.
    ///
    /// Each cluster is represented by its lowest index, so surviving vertices
    /// keep their relative order. Returns the number of vertices merged.
    pub fn weld_vertices(&mut self, epsilon: f32) -> usize {
        if self.vertices.is_empty() || !(epsilon > 0.0) {
            return 0;
        }

        let cell_size = epsilon * 2.0;
        let cell_of = |p: &Point3f| {
            (
                (p.x / cell_size).floor() as i64,
                (p.y / cell_size).floor() as i64,
                (p.z / cell_size).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        for (i, v) in self.vertices.iter().enumerate() {
            grid.entry(cell_of(v)).or_default().push(i);
        }

        let mut remap: Vec<usize> = (0..self.vertices.len()).collect();
        let mut merged = 0usize;
        for (i, v) in self.vertices.iter().enumerate() {
            if remap[i] != i {
                continue;
            }
            let (cx, cy, cz) = cell_of(v);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(candidates) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &j in candidates {
                            if j <= i || remap[j] != j {
                                continue;
                            }
                            if (self.vertices[j] - v).norm() < epsilon {
                                remap[j] = i;
                                merged += 1;
                            }
                        }
                    }
                }
            }
        }

        if merged == 0 {
            return 0;
        }

        for face in &mut self.faces {
            for i in face.iter_mut() {
                *i = remap[*i];
            }
        }
        let collapsed = self.remove_degenerate_faces();
        self.remove_unreferenced_vertices();
        debug!(
            "Welded {} vertices (epsilon = {:e}), {} faces collapsed",
            merged, epsilon, collapsed
        );
        merged
    }

    /// Total surface area
    pub fn area(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = self.corners(f);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Signed enclosed volume, positive for outward facing winding.
    pub fn volume(&self) -> f64 {
        let origin = self.reference_point();
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = self.corners(f);
                let (a, b, c) = (a - origin, b - origin, c - origin);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Center of mass of the mesh.
    ///
    /// Uses the volumetric centroid when the surface encloses a volume, the
    /// area weighted triangle centroid for open or flat surfaces, and the
    /// plain vertex mean when every triangle is degenerate.
    pub fn center_mass(&self) -> Point3f {
        if self.vertices.is_empty() {
            return Point3f::origin();
        }

        let origin = self.reference_point();
        let (min, max) = self.bounding_box();
        let scale = ((max - min).norm() as f64).max(f64::MIN_POSITIVE);

        let mut volume = 0.0f64;
        let mut weighted = Vector3d::zeros();
        for f in &self.faces {
            let [a, b, c] = self.corners(f);
            let (a, b, c) = (a - origin, b - origin, c - origin);
            let v = a.dot(&b.cross(&c)) / 6.0;
            volume += v;
            weighted += (a + b + c) * (v / 4.0);
        }
        if volume.abs() > VOLUME_EPSILON * scale.powi(3) {
            let c = origin + weighted / volume;
            return Point3f::new(c.x as f32, c.y as f32, c.z as f32);
        }

        let mut area = 0.0f64;
        let mut weighted = Vector3d::zeros();
        for f in &self.faces {
            let [a, b, c] = self.corners(f);
            let w = (b - a).cross(&(c - a)).norm() * 0.5;
            area += w;
            weighted += ((a - origin) + (b - origin) + (c - origin)) * (w / 3.0);
        }
        if area > 0.0 {
            let c = origin + weighted / area;
            return Point3f::new(c.x as f32, c.y as f32, c.z as f32);
        }

        self.vertex_centroid()
    }

    /// Arithmetic mean of the vertex positions
    pub fn vertex_centroid(&self) -> Point3f {
        if self.vertices.is_empty() {
            return Point3f::origin();
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3d::zeros(), |acc, v| acc + to_f64(v).coords);
        let mean = sum / self.vertices.len() as f64;
        Point3f::new(mean.x as f32, mean.y as f32, mean.z as f32)
    }

    /// Per-axis size of the axis-aligned bounding box
    pub fn extents(&self) -> Vector3f {
        let (min, max) = self.bounding_box();
        max - min
    }

    fn corners(&self, face: &[usize; 3]) -> [Point3d; 3] {
        [
            to_f64(&self.vertices[face[0]]),
            to_f64(&self.vertices[face[1]]),
            to_f64(&self.vertices[face[2]]),
        ]
    }

    // Accumulating relative to a vertex keeps far-from-origin meshes precise.
    fn reference_point(&self) -> Point3d {
        self.vertices.first().map(to_f64).unwrap_or_else(Point3d::origin)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
