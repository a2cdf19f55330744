//! Mesh to USDZ conversion

use std::path::Path;

use tracing::{debug, info};
use usdzcrate_core::{normalize, Material, NormalizeOptions, Result, ScaleOutcome, DEFAULT_DIFFUSE};
use usdzcrate_io::{load_mesh, write_usdz, ArchiveOptions, ArchiveReport, SceneDocument, SceneOptions};
use usdzcrate_simplification::{Simplifier, SimplifyOutcome};

/// Face budget used when none is given.
pub const DEFAULT_TARGET_FACES: usize = 20_000;
/// Longest bounding box edge after conversion, in meters.
pub const DEFAULT_TARGET_SIZE: f32 = 0.98;

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Diffuse color of the preview material
    pub color: [f32; 3],
    /// Face budget; zero disables simplification
    pub target_faces: usize,
    /// Move the center of mass to the origin
    pub center: bool,
    /// Longest edge after scaling; `None` or zero disables scaling
    pub target_size: Option<f32>,
    pub archive: ArchiveOptions,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            color: DEFAULT_DIFFUSE,
            target_faces: DEFAULT_TARGET_FACES,
            center: false,
            target_size: Some(DEFAULT_TARGET_SIZE),
            archive: ArchiveOptions::default(),
        }
    }
}

/// What a conversion did.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub archive: ArchiveReport,
    pub input_faces: usize,
    pub output_faces: usize,
    pub output_vertices: usize,
    pub simplification: SimplifyOutcome,
    pub scale: ScaleOutcome,
}

/// Convert the mesh at `input` into a USDZ archive at `output`.
///
/// Fails without touching `output` when the input is missing or empty.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConversionOptions,
) -> Result<ConversionReport> {
    let mesh = load_mesh(input.as_ref())?;
    let input_faces = mesh.face_count();

    let simplified = Simplifier::default().simplify(mesh, options.target_faces);
    let mut mesh = simplified.mesh;
    info!(
        "Simplification: {} -> {} faces ({:?})",
        input_faces,
        mesh.face_count(),
        simplified.outcome
    );

    let scale = normalize(
        &mut mesh,
        &NormalizeOptions {
            center: options.center,
            target_size: options.target_size,
        },
    );
    debug!("Normalization: center={} scale={:?}", options.center, scale);

    let document = SceneDocument::build(
        &mesh,
        &Material::preview(options.color),
        &SceneOptions::default(),
    );
    let archive = write_usdz(&document, output.as_ref(), &options.archive)?;

    Ok(ConversionReport {
        archive,
        input_faces,
        output_faces: mesh.face_count(),
        output_vertices: mesh.vertex_count(),
        simplification: simplified.outcome,
        scale,
    })
}
