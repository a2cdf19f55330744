//! I/O operations for the mesh conversion pipeline
//! 
//! This crate reads input meshes (3MF, OBJ), serializes the converted scene
//! as a USDA document and packages it into a single-entry USDZ archive.

pub mod obj;
pub mod three_mf;
pub mod usda;
pub mod usdz;

#[cfg(test)]
mod tests;

pub use usda::{SceneDocument, SceneOptions};
pub use usdz::{
    ensure_parent_dir, read_scene, read_usdz_entries, write_usdz, ArchiveOptions, ArchiveReport,
    Compression, USDZ_ENTRY_NAME,
};

use std::path::Path;
use tracing::{debug, info, warn};
use usdzcrate_core::{Drawable, Error, Result, TriangleMesh};

/// Vertices closer than this fraction of the bounding box diagonal are merged
/// after loading.
pub const WELD_TOLERANCE: f32 = 1e-6;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Supported input mesh formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    ThreeMf,
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "3mf" => Some(MeshFormat::ThreeMf),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Auto-detect format and read mesh.
///
/// All objects in the file are flattened into a single triangle mesh. A
/// missing input is reported before anything is parsed, and a result without
/// vertices or faces is an error.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = MeshFormat::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!("Unsupported mesh format: {:?}", path.extension()))
    })?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let mut mesh = match format {
        MeshFormat::ThreeMf => three_mf::ThreeMfReader::read_mesh(path)?,
        MeshFormat::Obj => obj::ObjReader::read_mesh(path)?,
    };
    weld_coincident_vertices(&mut mesh);

    if mesh.is_empty() {
        return Err(Error::EmptyMesh(format!(
            "{:?} has {} vertices and {} faces",
            path,
            mesh.vertex_count(),
            mesh.face_count()
        )));
    }

    let (min, max) = mesh.bounding_box();
    let dims = max - min;
    info!(
        "Loaded mesh: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    );
    debug!(
        "Bounding box: [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
    if dims.x.max(dims.y).max(dims.z) == 0.0 {
        warn!("Mesh has zero extent; every vertex coincides");
    }

    Ok(mesh)
}

/// Merge duplicated corners so faces that touch share vertices again.
///
/// Exporters often write every triangle with its own three vertices. Meshes
/// without extent are left alone.
pub fn weld_coincident_vertices(mesh: &mut TriangleMesh) -> usize {
    let (min, max) = mesh.bounding_box();
    let diagonal = (max - min).norm();
    if !(diagonal > 0.0) {
        return 0;
    }
    let merged = mesh.weld_vertices(diagonal * WELD_TOLERANCE);
    if merged > 0 {
        info!(
            "Welded {} coincident vertices, {} remain",
            merged,
            mesh.vertex_count()
        );
    }
    merged
}
