//! OBJ format support

use crate::MeshReader;
use std::path::Path;
use tracing::debug;
use usdzcrate_core::{Error, Point3f, Result, TriangleMesh};

pub struct ObjReader;

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        let parsed = ::obj::Obj::load(path).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        let data = parsed.data;

        let vertices: Vec<Point3f> = data
            .position
            .iter()
            .map(|p| Point3f::new(p[0], p[1], p[2]))
            .collect();

        let mut mesh = TriangleMesh::with_capacity(vertices.len(), 0);
        mesh.vertices = vertices;

        for object in &data.objects {
            for group in &object.groups {
                for poly in &group.polys {
                    let corners: Vec<usize> = poly.0.iter().map(|tuple| tuple.0).collect();
                    triangulate_polygon(&corners, &mut mesh.faces);
                }
            }
        }

        mesh.validate_indices().map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        debug!(
            "OBJ loaded: {} objects, {} vertices, {} faces",
            data.objects.len(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(mesh)
    }
}

/// Fan-triangulate a polygon given by its corner indices. Polygons with
/// fewer than three corners contribute nothing.
pub fn triangulate_polygon(corners: &[usize], faces: &mut Vec<[usize; 3]>) {
    if corners.len() < 3 {
        return;
    }
    for i in 1..corners.len() - 1 {
        faces.push([corners[0], corners[i], corners[i + 1]]);
    }
}
