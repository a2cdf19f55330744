//! Solid cube block assets

use std::path::Path;

use tracing::info;
use usdzcrate_core::{cube, Error, Material, Result};
use usdzcrate_io::{ensure_parent_dir, write_usdz, ArchiveOptions, ArchiveReport, SceneDocument, SceneOptions};

/// Default color for a single converted block.
pub const DEFAULT_BLOCK_COLOR: [f32; 3] = [0.72, 0.18, 0.2];

/// A named block color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub name: &'static str,
    pub color: [f32; 3],
}

/// The built-in block set, written by [`emit_blocks`].
pub const BLOCK_PALETTE: [Block; 6] = [
    Block { name: "SoilBlock", color: [0.52, 0.33, 0.18] },
    Block { name: "RockBlock", color: [0.35, 0.35, 0.4] },
    Block { name: "RelicBlock", color: [0.93, 0.78, 0.25] },
    Block { name: "TunnelBlock", color: [0.10, 0.10, 0.12] },
    Block { name: "DenBlock", color: [0.88, 0.70, 0.50] },
    Block { name: "PipestoneBlock", color: [0.72, 0.18, 0.20] },
];

/// Write a cube of edge `size` with the block material to `destination`.
///
/// Missing parent directories are created. The entry is stored
/// uncompressed.
pub fn write_block<P: AsRef<Path>>(
    destination: P,
    size: f32,
    color: [f32; 3],
    options: &SceneOptions,
) -> Result<ArchiveReport> {
    let destination = destination.as_ref();
    ensure_parent_dir(destination)?;
    let document = SceneDocument::build(&cube(size), &Material::block(color), options);
    write_usdz(&document, destination, &ArchiveOptions::stored())
}

/// Replace the asset at `source` with a plain cube at `destination`.
///
/// The source geometry is not read; it only has to exist.
pub fn emit_cube<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    size: f32,
    color: [f32; 3],
    options: &SceneOptions,
) -> Result<ArchiveReport> {
    let source = source.as_ref();
    if !source.exists() {
        return Err(Error::InputNotFound {
            path: source.to_path_buf(),
        });
    }
    write_block(destination, size, color, options)
}

/// Write every block in [`BLOCK_PALETTE`] as `<out_dir>/<name>.usdz`.
pub fn emit_blocks<P: AsRef<Path>>(out_dir: P, size: f32) -> Result<Vec<ArchiveReport>> {
    let out_dir = out_dir.as_ref();
    let options = SceneOptions::block();
    BLOCK_PALETTE
        .iter()
        .map(|block| {
            let report = write_block(
                out_dir.join(format!("{}.usdz", block.name)),
                size,
                block.color,
                &options,
            )?;
            info!("Generated {} ({} bytes)", report.path.display(), report.bytes);
            Ok(report)
        })
        .collect()
}
