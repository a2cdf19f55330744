//! 3MF format support
//!
//! 3MF is a ZIP archive containing XML files. The mesh data lives in the model
//! part (usually `3D/3dmodel.model`) as indexed vertices and triangles grouped
//! into objects. Objects may be assembled from other objects through
//! components, and the build section places objects into the scene. Reading
//! flattens all of that into one triangle mesh.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use usdzcrate_core::{Error, Point3f, Result, Transform3D, TriangleMesh};

use crate::MeshReader;

pub struct ThreeMfReader;

impl MeshReader for ThreeMfReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let xml = read_model_xml(file, path)?;
        parse_model(&xml, path)
    }
}

/// Extract the model part from a 3MF container.
pub fn read_model_xml<R: Read + Seek>(reader: R, path: &Path) -> Result<String> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| parse_error(path, format!("Invalid 3MF archive: {}", e)))?;

    let model_path = find_model_path(&mut archive)
        .ok_or_else(|| parse_error(path, "No model file found in 3MF archive"))?;

    let mut model_file = archive
        .by_name(&model_path)
        .map_err(|e| parse_error(path, format!("Cannot open model file '{}': {}", model_path, e)))?;

    let mut xml = String::new();
    model_file.read_to_string(&mut xml)?;
    Ok(xml)
}

fn find_model_path<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Option<String> {
    // Common locations for the model file
    let candidates = ["3D/3dmodel.model", "3d/3dmodel.model", "3D/3DModel.model"];
    for candidate in candidates {
        if archive.by_name(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }

    // Search for any .model file
    archive
        .file_names()
        .find(|name| name.to_lowercase().ends_with(".model"))
        .map(str::to_string)
}

/// An `<object>` resource: its own mesh and/or references to other objects.
#[derive(Debug, Default)]
struct ObjectDef {
    mesh: Option<TriangleMesh>,
    components: Vec<(usize, Transform3D)>,
}

#[derive(Debug, Default)]
struct Model {
    objects: HashMap<usize, ObjectDef>,
    order: Vec<usize>,
    build: Vec<(usize, Transform3D)>,
}

/// Parse 3MF model XML and flatten it into a single mesh.
pub fn parse_model(xml: &str, path: &Path) -> Result<TriangleMesh> {
    let model = read_model(xml, path)?;
    let mesh = flatten(&model, path)?;
    debug!(
        "3MF loaded: {} objects, {} build items, {} vertices, {} faces",
        model.objects.len(),
        model.build.len(),
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(mesh)
}

fn read_model(xml: &str, path: &Path) -> Result<Model> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::default();
    let mut current: Option<usize> = None;
    let mut in_vertices = false;
    let mut in_triangles = false;
    let mut in_build = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(path, format!("XML parse error: {}", e)))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"object" => {
                        let id = required::<usize>(e, b"id", path)?;
                        if model.objects.insert(id, ObjectDef::default()).is_some() {
                            return Err(parse_error(path, format!("duplicate object id {}", id)));
                        }
                        model.order.push(id);
                        if is_start {
                            current = Some(id);
                        }
                    }
                    b"mesh" => {
                        if let Some(def) = current.and_then(|id| model.objects.get_mut(&id)) {
                            def.mesh.get_or_insert_with(TriangleMesh::new);
                        }
                    }
                    b"vertices" => in_vertices = is_start,
                    b"triangles" => in_triangles = is_start,
                    b"build" => in_build = is_start,
                    b"vertex" if in_vertices => {
                        let v = Point3f::new(
                            required(e, b"x", path)?,
                            required(e, b"y", path)?,
                            required(e, b"z", path)?,
                        );
                        if let Some(mesh) = current_mesh(&mut model, current) {
                            mesh.add_vertex(v);
                        }
                    }
                    b"triangle" if in_triangles => {
                        let face = [
                            required(e, b"v1", path)?,
                            required(e, b"v2", path)?,
                            required(e, b"v3", path)?,
                        ];
                        if let Some(mesh) = current_mesh(&mut model, current) {
                            mesh.add_face(face);
                        }
                    }
                    b"component" => {
                        let entry = (required(e, b"objectid", path)?, transform_attr(e, path)?);
                        if let Some(def) = current.and_then(|id| model.objects.get_mut(&id)) {
                            def.components.push(entry);
                        }
                    }
                    b"item" if in_build => {
                        let entry = (required(e, b"objectid", path)?, transform_attr(e, path)?);
                        model.build.push(entry);
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"object" => current = None,
                b"vertices" => in_vertices = false,
                b"triangles" => in_triangles = false,
                b"build" => in_build = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    for (id, def) in &model.objects {
        if let Some(mesh) = &def.mesh {
            mesh.validate_indices()
                .map_err(|e| parse_error(path, format!("object {}: {}", id, e)))?;
        }
    }

    Ok(model)
}

fn current_mesh(model: &mut Model, current: Option<usize>) -> Option<&mut TriangleMesh> {
    current
        .and_then(|id| model.objects.get_mut(&id))
        .and_then(|def| def.mesh.as_mut())
}

/// Instantiate every build item, or every root object when the build
/// section is empty.
fn flatten(model: &Model, path: &Path) -> Result<TriangleMesh> {
    let roots: Vec<(usize, Transform3D)> = if model.build.is_empty() {
        let referenced: HashSet<usize> = model
            .objects
            .values()
            .flat_map(|def| def.components.iter().map(|(id, _)| *id))
            .collect();
        model
            .order
            .iter()
            .filter(|id| !referenced.contains(id))
            .map(|&id| (id, Transform3D::identity()))
            .collect()
    } else {
        model.build.clone()
    };

    let mut out = TriangleMesh::new();
    let mut visiting = HashSet::new();
    for (id, transform) in roots {
        instantiate(model, id, &transform, &mut visiting, &mut out, path)?;
    }
    Ok(out)
}

fn instantiate(
    model: &Model,
    id: usize,
    transform: &Transform3D,
    visiting: &mut HashSet<usize>,
    out: &mut TriangleMesh,
    path: &Path,
) -> Result<()> {
    let def = model
        .objects
        .get(&id)
        .ok_or_else(|| parse_error(path, format!("reference to missing object {}", id)))?;
    if !visiting.insert(id) {
        return Err(parse_error(path, format!("object {} contains itself", id)));
    }

    if let Some(mesh) = &def.mesh {
        if transform.is_identity(f32::EPSILON) {
            out.append(mesh, None);
        } else {
            out.append(mesh, Some(transform));
        }
    }
    for (child, local) in &def.components {
        let combined = *transform * *local;
        instantiate(model, *child, &combined, visiting, out, path)?;
    }

    visiting.remove(&id);
    Ok(())
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn required<T: std::str::FromStr>(e: &BytesStart, name: &[u8], path: &Path) -> Result<T> {
    let element = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let key = String::from_utf8_lossy(name).into_owned();
    let raw = attribute(e, name)
        .ok_or_else(|| parse_error(path, format!("<{}> is missing '{}'", element, key)))?;
    raw.trim().parse().map_err(|_| {
        parse_error(path, format!("<{}> has invalid {}=\"{}\"", element, key, raw))
    })
}

fn transform_attr(e: &BytesStart, path: &Path) -> Result<Transform3D> {
    let Some(raw) = attribute(e, b"transform") else {
        return Ok(Transform3D::identity());
    };
    let values = raw
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| parse_error(path, format!("invalid transform \"{}\"", raw)))?;
    Transform3D::from_row_major_affine(&values)
        .map_err(|e| parse_error(path, e.to_string()))
}

fn parse_error(path: &Path, details: impl Into<String>) -> Error {
    Error::Parse {
        path: PathBuf::from(path),
        details: details.into(),
    }
}
