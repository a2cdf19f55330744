//! Deterministic stride sampling, the fallback when decimation fails

use usdzcrate_core::TriangleMesh;

/// Keep every `step`-th face, `step = max(1, faces / target)`, then truncate
/// to the first `target` faces of that subset if it is still too large.
///
/// Faces keep their winding and relative order and vertices no face refers to
/// are dropped. The result depends only on the input, never on geometry, and
/// this function cannot fail. A `target` of zero returns the mesh unchanged.
pub fn sample_faces(mesh: &TriangleMesh, target_faces: usize) -> TriangleMesh {
    if target_faces == 0 {
        return mesh.clone();
    }

    let step = (mesh.face_count() / target_faces).max(1);
    let strided: Vec<usize> = (0..mesh.face_count()).step_by(step).collect();
    let sampled = mesh.submesh(&strided);

    if sampled.face_count() > target_faces {
        // Second restriction on the already sampled mesh, by position only.
        let head: Vec<usize> = (0..target_faces).collect();
        return sampled.submesh(&head);
    }
    sampled
}
