//! Mesh simplification and decimation algorithms
//! 
//! This crate reduces a triangle mesh toward a face budget:
//! - Quadric error edge collapse as the primary decimator
//! - Deterministic stride sampling as the fallback when decimation fails
//! - [`Simplifier`], which always produces a mesh by combining the two

pub mod edge_collapse;
pub mod sampling;
pub mod simplifier;

#[cfg(test)]
pub(crate) mod test_meshes;

pub use edge_collapse::*;
pub use sampling::*;
pub use simplifier::*;

use thiserror::Error;
use usdzcrate_core::TriangleMesh;

/// Result of asking a decimator for a reduced mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum Decimation {
    /// The decimator produced a reduced mesh
    Reduced(TriangleMesh),
    /// The decimator could not reduce this mesh; carries a human readable reason
    ReductionUnavailable(String),
}

/// Reasons the edge collapse decimator refuses a mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimationError {
    #[error("mesh has no vertices or faces")]
    EmptyMesh,

    #[error("face {face} references missing vertex {index}")]
    IndexOutOfRange { face: usize, index: usize },

    #[error("face {0} repeats a vertex")]
    DegenerateFace(usize),

    #[error("edge {0} -> {1} is shared by more than two faces or wound inconsistently")]
    NonManifoldEdge(usize, usize),
}

/// Reduce a triangle mesh to approximately a target number of faces.
///
/// Implementations never panic on purpose, but callers must not rely on that:
/// [`Simplifier`] treats a panic like [`Decimation::ReductionUnavailable`].
pub trait MeshDecimator {
    /// Try to reduce `mesh` to roughly `target_faces` faces
    fn decimate(&self, mesh: &TriangleMesh, target_faces: usize) -> Decimation;

    /// Short name used in diagnostics
    fn name(&self) -> &'static str;
}
