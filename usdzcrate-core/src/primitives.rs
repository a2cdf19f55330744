//! The axis-aligned cube used for solid block assets

use crate::mesh::TriangleMesh;
use crate::point::Point3f;

/// Edge length of the standard block, in meters.
pub const DEFAULT_CUBE_SIZE: f32 = 0.98;

/// Cube triangles, two per side.
pub const CUBE_TRIANGLES: [[usize; 3]; 12] = [
    [0, 1, 2], [0, 2, 3], // front (-Z)
    [4, 6, 5], [4, 7, 6], // back (+Z)
    [4, 5, 1], [4, 1, 0], // bottom (-Y)
    [3, 2, 6], [3, 6, 7], // top (+Y)
    [1, 5, 6], [1, 6, 2], // right (+X)
    [4, 0, 3], [4, 3, 7], // left (-X)
];

/// Build a cube of edge length `size` centered on the origin.
pub fn cube(size: f32) -> TriangleMesh {
    let h = size / 2.0;
    let vertices = vec![
        Point3f::new(-h, -h, -h),
        Point3f::new(h, -h, -h),
        Point3f::new(h, h, -h),
        Point3f::new(-h, h, -h),
        Point3f::new(-h, -h, h),
        Point3f::new(h, -h, h),
        Point3f::new(h, h, h),
        Point3f::new(-h, h, h),
    ];
    TriangleMesh::from_vertices_and_faces(vertices, CUBE_TRIANGLES.to_vec())
}
