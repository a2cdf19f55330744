//! Core data structures and traits for usdzcrate
//! 
//! This crate provides the fundamental types shared by every stage of the
//! mesh conversion pipeline: triangle meshes, the preview material, affine
//! transforms, geometric normalization and the fixed cube primitive.

pub mod point;
pub mod mesh;
pub mod material;
pub mod normalize;
pub mod primitives;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use material::*;
pub use normalize::*;
pub use primitives::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};

// Type aliases for easier imports
pub type Point = Point3f;
pub type Mesh = TriangleMesh;
