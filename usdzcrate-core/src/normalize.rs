//! Geometric normalization: re-centering and uniform rescaling

use crate::mesh::TriangleMesh;
use crate::traits::Transformable;
use crate::transform::Transform3D;
use tracing::debug;

/// Which normalization steps to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Translate the center of mass to the origin
    pub center: bool,
    /// Longest bounding box edge after scaling; `None` or zero disables scaling
    pub target_size: Option<f32>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            center: false,
            target_size: None,
        }
    }
}

/// Outcome of a rescale request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleOutcome {
    /// No target size was requested
    Disabled,
    /// Every vertex was scaled by this factor
    Scaled(f32),
    /// The bounding box has no extent, so no factor exists
    DegenerateSkipped,
}

/// Apply the requested steps in order: recenter first, then rescale.
pub fn normalize(mesh: &mut TriangleMesh, options: &NormalizeOptions) -> ScaleOutcome {
    if options.center {
        recenter(mesh);
    }
    match options.target_size {
        Some(size) if size != 0.0 => rescale_longest_edge(mesh, size),
        _ => ScaleOutcome::Disabled,
    }
}

/// Translate the mesh so its center of mass sits at the origin.
pub fn recenter(mesh: &mut TriangleMesh) {
    let com = mesh.center_mass();
    debug!("Recentering mesh from center of mass {:?}", com);
    mesh.transform(&Transform3D::translation(-com.coords));
}

/// Uniformly scale the mesh about the origin so that its longest bounding
/// box edge equals `target_size`.
pub fn rescale_longest_edge(mesh: &mut TriangleMesh, target_size: f32) -> ScaleOutcome {
    let extents = mesh.extents();
    let longest = extents.x.max(extents.y).max(extents.z);
    if !(longest > 0.0) {
        debug!("Bounding box has zero extent, skipping rescale");
        return ScaleOutcome::DegenerateSkipped;
    }

    let factor = target_size / longest;
    debug!("Scaling mesh by {} (longest edge {} -> {})", factor, longest, target_size);
    mesh.transform(&Transform3D::uniform_scaling(factor));
    ScaleOutcome::Scaled(factor)
}
