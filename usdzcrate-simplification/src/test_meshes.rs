//! Small meshes shared by the unit tests

use nalgebra::Point3;
use usdzcrate_core::TriangleMesh;

pub fn make_single_triangle() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    )
}

pub fn make_tetrahedron() -> TriangleMesh {
    // Consistently wound: each shared edge appears in opposite directions
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

pub fn make_plane_grid(size: usize) -> TriangleMesh {
    let mut vertices = Vec::new();
    for y in 0..size {
        for x in 0..size {
            vertices.push(Point3::new(x as f32, y as f32, 0.0));
        }
    }
    let mut faces = Vec::new();
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

pub fn make_curved_surface(size: usize) -> TriangleMesh {
    let mut mesh = make_plane_grid(size);
    for v in &mut mesh.vertices {
        let fx = v.x / (size - 1) as f32 * std::f32::consts::PI;
        let fy = v.y / (size - 1) as f32 * std::f32::consts::PI;
        v.z = (fx.sin() * fy.sin()) * 2.0;
    }
    mesh
}

/// Closed UV sphere with single pole vertices.
pub fn make_uv_sphere(slices: usize, stacks: usize) -> TriangleMesh {
    let mut vertices = vec![Point3::new(0.0, 0.0, 1.0)];
    for i in 1..stacks {
        let phi = std::f32::consts::PI * i as f32 / stacks as f32;
        for j in 0..slices {
            let theta = 2.0 * std::f32::consts::PI * j as f32 / slices as f32;
            vertices.push(Point3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()));
        }
    }
    let south = vertices.len();
    vertices.push(Point3::new(0.0, 0.0, -1.0));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + j % slices;
    let mut faces = Vec::new();
    for j in 0..slices {
        faces.push([0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..(stacks - 1) {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i, j + 1);
            let c = ring(i + 1, j);
            let d = ring(i + 1, j + 1);
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
    }
    for j in 0..slices {
        faces.push([south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Same surface with every face given its own three vertices.
pub fn make_soup(mesh: &TriangleMesh) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(mesh.faces.len() * 3);
    let mut faces = Vec::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let base = vertices.len();
        vertices.extend(face.iter().map(|&i| mesh.vertices[i]));
        faces.push([base, base + 1, base + 2]);
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}
