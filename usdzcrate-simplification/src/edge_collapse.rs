//! Edge collapse simplification
//!
//! Quadric error metric (QEM) decimation over a half-edge view of the mesh.
//! Each vertex accumulates the plane quadrics of its incident faces; the
//! cheapest legal edge is collapsed into its error-minimizing point until the
//! face budget is met. This is the primary decimation path. Non-manifold or
//! malformed input is refused, never patched up.

use crate::{Decimation, DecimationError, MeshDecimator};
use nalgebra::{Matrix4, Vector4};
use priority_queue::PriorityQueue;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use usdzcrate_core::{Point3f, TriangleMesh};

/// Missing twin, face or vertex link.
const INVALID: usize = usize::MAX;

/// Minimum number of collapses between two queue rebuilds.
const MIN_REBUILD_INTERVAL: usize = 100;

#[derive(Debug, Clone)]
struct HalfEdge {
    target: usize,
    twin: usize,
    next: usize,
    prev: usize,
    face: usize,
}

/// Connectivity plus per-vertex quadrics for one decimation run.
struct HalfEdgeMesh {
    edges: Vec<HalfEdge>,
    /// Some live outgoing half-edge per vertex
    outgoing: Vec<usize>,
    /// First half-edge of each face, INVALID once collapsed away
    face_start: Vec<usize>,
    live_faces: usize,
    positions: Vec<Point3f>,
    quadrics: Vec<Matrix4<f64>>,
    retired: Vec<bool>,
}

/// Plane `(n, d)` with `n . p + d = 0` through a triangle.
fn plane_of(a: &Point3f, b: &Point3f, c: &Point3f) -> Vector4<f64> {
    let n = (b - a).cross(&(c - a)).normalize();
    if n.iter().any(|x| !x.is_finite()) {
        // Zero-area face; any unit plane keeps the quadric well formed.
        return Vector4::z();
    }
    let d = -n.dot(&a.coords);
    Vector4::new(n.x as f64, n.y as f64, n.z as f64, d as f64)
}

/// Squared distance to `plane` as a quadric form.
fn fundamental_quadric(plane: &Vector4<f64>) -> Matrix4<f64> {
    plane * plane.transpose()
}

impl HalfEdgeMesh {
    fn build(mesh: &TriangleMesh) -> Result<Self, DecimationError> {
        let vertex_count = mesh.vertices.len();
        let face_count = mesh.faces.len();

        let mut edges = Vec::with_capacity(face_count * 3);
        let mut outgoing = vec![INVALID; vertex_count];
        let mut face_start = Vec::with_capacity(face_count);
        let mut directed: HashMap<(usize, usize), usize> = HashMap::with_capacity(face_count * 3);

        for (fi, face) in mesh.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i >= vertex_count) {
                return Err(DecimationError::IndexOutOfRange { face: fi, index });
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                return Err(DecimationError::DegenerateFace(fi));
            }

            let first = edges.len();
            face_start.push(first);
            for corner in 0..3 {
                let from = face[corner];
                let to = face[(corner + 1) % 3];
                let he = first + corner;
                // A directed edge seen twice means more than two faces meet
                // there or the winding flips.
                if directed.insert((from, to), he).is_some() {
                    return Err(DecimationError::NonManifoldEdge(from, to));
                }
                edges.push(HalfEdge {
                    target: to,
                    twin: INVALID,
                    next: first + (corner + 1) % 3,
                    prev: first + (corner + 2) % 3,
                    face: fi,
                });
                if outgoing[from] == INVALID {
                    outgoing[from] = he;
                }
            }
        }

        for (&(from, to), &he) in &directed {
            if let Some(&opposite) = directed.get(&(to, from)) {
                edges[he].twin = opposite;
            }
        }

        let mut quadrics = vec![Matrix4::zeros(); vertex_count];
        for face in &mesh.faces {
            let [a, b, c] = face.map(|i| mesh.vertices[i]);
            let q = fundamental_quadric(&plane_of(&a, &b, &c));
            for &v in face {
                quadrics[v] += q;
            }
        }

        Ok(HalfEdgeMesh {
            edges,
            outgoing,
            face_start,
            live_faces: face_count,
            positions: mesh.vertices.clone(),
            quadrics,
            retired: vec![false; vertex_count],
        })
    }

    #[inline]
    fn origin(&self, he: usize) -> usize {
        self.edges[self.edges[he].prev].target
    }

    #[inline]
    fn is_live(&self, he: usize) -> bool {
        he != INVALID && self.edges[he].face != INVALID
    }

    /// Outgoing half-edges around `v`, walking both ways on open fans.
    fn fan(&self, v: usize) -> Vec<usize> {
        let start = self.outgoing[v];
        if start == INVALID {
            return Vec::new();
        }

        // Bounded by the edge count in case twin links ever form a cycle
        // that misses `start`.
        let limit = self.edges.len();
        let mut fan = vec![start];
        let mut he = self.edges[self.edges[start].prev].twin;
        while he != INVALID && he != start && fan.len() <= limit {
            fan.push(he);
            he = self.edges[self.edges[he].prev].twin;
        }
        if he == start {
            return fan;
        }

        let mut he = self.edges[start].twin;
        while he != INVALID && fan.len() <= limit {
            let around = self.edges[he].next;
            if around == start {
                break;
            }
            fan.push(around);
            he = self.edges[around].twin;
        }
        fan
    }

    fn ring(&self, v: usize) -> HashSet<usize> {
        self.fan(v).into_iter().map(|he| self.edges[he].target).collect()
    }

    fn on_boundary(&self, v: usize) -> bool {
        self.fan(v).into_iter().any(|he| self.edges[he].twin == INVALID)
    }

    fn edge_between(&self, from: usize, to: usize) -> Option<usize> {
        self.fan(from).into_iter().find(|&he| self.edges[he].target == to)
    }

    /// Link condition: the two rings may only share the apices of the faces
    /// on the edge, two inside the surface and one on its border.
    fn link_allows_collapse(&self, keep: usize, drop: usize) -> bool {
        let Some(he) = self.edge_between(keep, drop) else {
            return false;
        };
        let apices = if self.edges[he].twin == INVALID { 1 } else { 2 };
        self.ring(keep).intersection(&self.ring(drop)).count() == apices
    }

    /// Point minimizing the summed quadric of both ends, with its error.
    /// Falls back to the midpoint when the system is singular.
    fn placement(&self, keep: usize, drop: usize) -> (Point3f, f64) {
        let q = self.quadrics[keep] + self.quadrics[drop];
        let point = match q.fixed_view::<3, 3>(0, 0).try_inverse() {
            Some(inv) => {
                let p = -inv * q.fixed_view::<3, 1>(0, 3);
                Point3f::new(p[0] as f32, p[1] as f32, p[2] as f32)
            }
            None => nalgebra::center(&self.positions[keep], &self.positions[drop]),
        };
        let h = Vector4::new(point.x as f64, point.y as f64, point.z as f64, 1.0);
        (point, h.dot(&(q * h)).max(0.0))
    }

    fn scan_outgoing(&self, v: usize) -> usize {
        (0..self.edges.len())
            .find(|&he| self.is_live(he) && self.origin(he) == v)
            .unwrap_or(INVALID)
    }

    /// Point `v` at a live outgoing half-edge again if its current one died.
    fn repair_outgoing(&mut self, v: usize, candidate: usize) {
        if v == INVALID {
            return;
        }
        let current = self.outgoing[v];
        if current == INVALID || self.is_live(current) {
            return;
        }
        self.outgoing[v] = if self.is_live(candidate) {
            candidate
        } else {
            self.scan_outgoing(v)
        };
    }

    /// Remove the face owning `he` and glue its two other sides together.
    /// Returns the former twins of `he.next` and `he.prev`.
    fn retire_face(&mut self, he: usize) -> (usize, usize) {
        let next = self.edges[he].next;
        let prev = self.edges[he].prev;
        let next_twin = self.edges[next].twin;
        let prev_twin = self.edges[prev].twin;
        if next_twin != INVALID {
            self.edges[next_twin].twin = prev_twin;
        }
        if prev_twin != INVALID {
            self.edges[prev_twin].twin = next_twin;
        }

        let face = self.edges[he].face;
        for side in [he, next, prev] {
            self.edges[side].face = INVALID;
        }
        self.face_start[face] = INVALID;
        self.live_faces -= 1;
        (next_twin, prev_twin)
    }

    /// Merge `drop` into `keep`, moving `keep` to `point`.
    fn collapse(&mut self, keep: usize, drop: usize, point: Point3f) -> bool {
        let Some(he) = self.edge_between(keep, drop) else {
            return false;
        };
        let twin = self.edges[he].twin;
        let apex = self.edges[self.edges[he].next].target;
        let far_apex = if twin == INVALID {
            INVALID
        } else {
            self.edges[self.edges[twin].next].target
        };
        let dropped_fan = self.fan(drop);

        let (apex_in, keep_out) = self.retire_face(he);
        let far_in = if twin == INVALID {
            INVALID
        } else {
            self.retire_face(twin).0
        };

        for &out in &dropped_fan {
            let into = self.edges[out].prev;
            self.edges[into].target = keep;
            let back = self.edges[out].twin;
            if self.is_live(back) {
                self.edges[back].target = keep;
            }
        }

        self.repair_outgoing(keep, keep_out);
        self.repair_outgoing(apex, apex_in);
        if far_apex != apex {
            self.repair_outgoing(far_apex, far_in);
        }

        self.outgoing[drop] = INVALID;
        self.retired[drop] = true;
        self.positions[keep] = point;
        let absorbed = self.quadrics[drop];
        self.quadrics[keep] += absorbed;
        true
    }

    /// Compact the surviving vertices and faces into a plain mesh.
    fn to_mesh(&self) -> TriangleMesh {
        let mut remap = vec![INVALID; self.positions.len()];
        let mut vertices = Vec::new();
        for v in 0..self.positions.len() {
            if !self.retired[v] && self.outgoing[v] != INVALID {
                remap[v] = vertices.len();
                vertices.push(self.positions[v]);
            }
        }

        let faces = self
            .face_start
            .iter()
            .filter(|&&he| he != INVALID)
            .filter_map(|&he| {
                let corners = [
                    self.origin(he),
                    self.edges[he].target,
                    self.edges[self.edges[he].next].target,
                ]
                .map(|v| remap[v]);
                let [a, b, c] = corners;
                let distinct = a != b && b != c && c != a;
                (distinct && !corners.contains(&INVALID)).then_some(corners)
            })
            .collect();

        // Vertices only referenced by dropped degenerate faces go too.
        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.remove_unreferenced_vertices();
        mesh
    }
}

/// Queued collapse of `drop` into `keep`.
#[derive(Debug, Clone)]
struct Candidate {
    keep: usize,
    drop: usize,
    cost: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Reversed so the cheapest collapse has the highest priority.
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost)
    }
}

/// QEM edge collapse decimator.
///
/// Boundary edges are either left alone (`preserve_boundary`) or made more
/// expensive by `boundary_weight`. `error_threshold` stops the run early once
/// the cheapest remaining collapse costs more than that.
#[derive(Debug, Clone)]
pub struct EdgeCollapseSimplifier {
    pub error_threshold: Option<f64>,
    pub preserve_boundary: bool,
    pub boundary_weight: f64,
}

impl Default for EdgeCollapseSimplifier {
    fn default() -> Self {
        Self {
            error_threshold: None,
            preserve_boundary: true,
            boundary_weight: 100.0,
        }
    }
}

impl EdgeCollapseSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(
        error_threshold: Option<f64>,
        preserve_boundary: bool,
        boundary_weight: f64,
    ) -> Self {
        Self {
            error_threshold,
            preserve_boundary,
            boundary_weight,
        }
    }

    /// Queue every live edge once, keyed from `first_id` upwards.
    fn build_queue(&self, hem: &HalfEdgeMesh, first_id: usize) -> PriorityQueue<usize, Candidate> {
        let mut queue = PriorityQueue::new();
        let mut queued: HashSet<(usize, usize)> = HashSet::new();

        for keep in 0..hem.positions.len() {
            if hem.retired[keep] || hem.outgoing[keep] == INVALID {
                continue;
            }
            for he in hem.fan(keep) {
                if !hem.is_live(he) {
                    continue;
                }
                let drop = hem.edges[he].target;
                if !queued.insert((keep.min(drop), keep.max(drop))) {
                    continue;
                }

                let boundary = hem.on_boundary(keep) || hem.on_boundary(drop);
                if boundary && self.preserve_boundary {
                    continue;
                }
                let (_, mut cost) = hem.placement(keep, drop);
                if boundary {
                    cost += self.boundary_weight;
                }
                queue.push(first_id + queue.len(), Candidate { keep, drop, cost });
            }
        }
        queue
    }

    /// Collapse edges until at most `target_faces` faces remain or no legal
    /// collapse is left.
    pub fn collapse_to(
        &self,
        mesh: &TriangleMesh,
        target_faces: usize,
    ) -> Result<TriangleMesh, DecimationError> {
        if mesh.is_empty() {
            return Err(DecimationError::EmptyMesh);
        }
        if target_faces >= mesh.faces.len() {
            return Ok(mesh.clone());
        }

        let mesh = without_degenerate_faces(mesh);
        if mesh.faces.is_empty() {
            return Err(DecimationError::EmptyMesh);
        }
        if target_faces >= mesh.faces.len() {
            return Ok(mesh.into_owned());
        }

        let mut hem = HalfEdgeMesh::build(&mesh)?;
        let rebuild_interval = MIN_REBUILD_INTERVAL.max(mesh.faces.len() / 50);
        let mut next_id = 0;
        let mut queue = self.build_queue(&hem, next_id);
        next_id += queue.len();
        let mut collapses = 0usize;
        let mut collapses_at_rebuild = 0usize;

        while hem.live_faces > target_faces {
            let Some((_, candidate)) = queue.pop() else {
                // Stale entries may have drained the queue; retry only if
                // something changed since the last rebuild.
                if collapses == collapses_at_rebuild {
                    break;
                }
                queue = self.build_queue(&hem, next_id);
                next_id += queue.len();
                collapses_at_rebuild = collapses;
                continue;
            };

            if self.error_threshold.is_some_and(|limit| candidate.cost > limit) {
                break;
            }

            let Candidate { keep, drop, .. } = candidate;
            let stale = [keep, drop]
                .iter()
                .any(|&v| hem.retired[v] || hem.outgoing[v] == INVALID);
            if stale || !hem.link_allows_collapse(keep, drop) {
                continue;
            }

            // Quadrics move as neighbors collapse; place with current ones.
            let (point, _) = hem.placement(keep, drop);
            if !hem.collapse(keep, drop, point) {
                continue;
            }
            collapses += 1;
            if collapses % rebuild_interval == 0 {
                queue = self.build_queue(&hem, next_id);
                next_id += queue.len();
                collapses_at_rebuild = collapses;
            }
        }

        debug!(
            "Edge collapse finished: {} collapses, {} -> {} faces (target {})",
            collapses,
            mesh.faces.len(),
            hem.live_faces,
            target_faces
        );

        Ok(hem.to_mesh())
    }
}

/// Drop faces that repeat a vertex index; they carry no area and have no
/// place in the half-edge structure.
fn without_degenerate_faces(mesh: &TriangleMesh) -> Cow<'_, TriangleMesh> {
    let degenerate = |f: &[usize; 3]| f[0] == f[1] || f[1] == f[2] || f[0] == f[2];
    if !mesh.faces.iter().any(degenerate) {
        return Cow::Borrowed(mesh);
    }
    let mut cleaned = mesh.clone();
    let removed = cleaned.remove_degenerate_faces();
    debug!("Skipping {} degenerate faces before collapse", removed);
    Cow::Owned(cleaned)
}

impl MeshDecimator for EdgeCollapseSimplifier {
    fn decimate(&self, mesh: &TriangleMesh, target_faces: usize) -> Decimation {
        match self.collapse_to(mesh, target_faces) {
            Ok(reduced) if reduced.is_empty() => Decimation::ReductionUnavailable(
                "edge collapse removed every face".to_string(),
            ),
            Ok(reduced) => Decimation::Reduced(reduced),
            Err(e) => Decimation::ReductionUnavailable(e.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "edge_collapse"
    }
}
