//! USDZ packaging
//!
//! A USDZ file here is a ZIP archive holding exactly one entry,
//! [`USDZ_ENTRY_NAME`], with the UTF-8 bytes of a [`SceneDocument`]. The
//! archive is assembled in a temporary file next to the destination and
//! moved into place only once it is complete, so a failed write never leaves
//! a truncated archive behind.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use usdzcrate_core::{Error, Result};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::usda::SceneDocument;

/// Name of the single entry inside every archive.
pub const USDZ_ENTRY_NAME: &str = "default.usda";

/// How the scene entry is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl From<Compression> for CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub compression: Compression,
}

impl ArchiveOptions {
    pub fn deflated() -> Self {
        Self {
            compression: Compression::Deflated,
        }
    }

    pub fn stored() -> Self {
        Self {
            compression: Compression::Stored,
        }
    }
}

/// Where an archive was written and how large it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Package `document` as a USDZ archive at `path`.
///
/// Any existing file at `path` is removed first. The parent directory must
/// already exist; see [`ensure_parent_dir`].
pub fn write_usdz<P: AsRef<Path>>(
    document: &SceneDocument,
    path: P,
    options: &ArchiveOptions,
) -> Result<ArchiveReport> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    if !parent.is_dir() {
        return Err(Error::OutputWrite {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("directory {} does not exist", parent.display()),
            ),
        });
    }

    if path.exists() {
        debug!("Removing existing archive {:?}", path);
        fs::remove_file(path).map_err(|e| Error::output_write(path, e))?;
    }

    let staging = NamedTempFile::new_in(parent).map_err(|e| Error::output_write(path, e))?;
    let mut zip = zip::ZipWriter::new(staging);
    let entry_options =
        SimpleFileOptions::default().compression_method(options.compression.into());

    zip.start_file(USDZ_ENTRY_NAME, entry_options)
        .map_err(|e| Error::output_write(path, e))?;
    zip.write_all(document.as_bytes())
        .map_err(|e| Error::output_write(path, e))?;
    let staging = zip.finish().map_err(|e| Error::output_write(path, e))?;

    staging
        .persist(path)
        .map_err(|e| Error::output_write(path, e.error))?;

    let bytes = fs::metadata(path)?.len();
    info!(
        "Wrote {:?} ({} bytes, {:?})",
        path, bytes, options.compression
    );

    Ok(ArchiveReport {
        path: path.to_path_buf(),
        bytes,
    })
}

/// Read every entry of an archive as `(name, bytes)` pairs in stored order.
pub fn read_usdz_entries<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<u8>)>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        details: format!("Invalid USDZ archive: {}", e),
    })?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            details: format!("Cannot read entry {}: {}", i, e),
        })?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        entries.push((entry.name().to_string(), data));
    }
    Ok(entries)
}

/// Read the scene entry of an archive back as text.
pub fn read_scene<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let (_, data) = read_usdz_entries(path)?
        .into_iter()
        .find(|(name, _)| name == USDZ_ENTRY_NAME)
        .ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            details: format!("archive has no {} entry", USDZ_ENTRY_NAME),
        })?;
    String::from_utf8(data).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    if !parent.is_dir() {
        debug!("Creating directory {:?}", parent);
        fs::create_dir_all(parent).map_err(|e| Error::output_write(path, e))?;
    }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
