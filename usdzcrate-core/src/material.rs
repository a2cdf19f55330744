//! Preview surface material bound to a whole mesh

use serde::{Deserialize, Serialize};

/// Roughness used for converted meshes.
pub const PREVIEW_ROUGHNESS: f32 = 0.8;
/// Metallic factor used for converted meshes.
pub const PREVIEW_METALLIC: f32 = 0.0;
/// Roughness used for the solid cube blocks.
pub const BLOCK_ROUGHNESS: f32 = 0.4;
/// Metallic factor used for the solid cube blocks.
pub const BLOCK_METALLIC: f32 = 0.0;
/// Mid grey, the converter's default diffuse color.
pub const DEFAULT_DIFFUSE: [f32; 3] = [0.6, 0.6, 0.6];

/// A single diffuse material with fixed roughness and metallic factors.
///
/// Color components are expected in `0..=1` but are carried as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
}

impl Material {
    pub fn new(diffuse: [f32; 3], roughness: f32, metallic: f32) -> Self {
        Self {
            diffuse,
            roughness,
            metallic,
        }
    }

    /// Material used for converted meshes
    pub fn preview(diffuse: [f32; 3]) -> Self {
        Self::new(diffuse, PREVIEW_ROUGHNESS, PREVIEW_METALLIC)
    }

    /// Material used for cube blocks
    pub fn block(diffuse: [f32; 3]) -> Self {
        Self::new(diffuse, BLOCK_ROUGHNESS, BLOCK_METALLIC)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::preview(DEFAULT_DIFFUSE)
    }
}
