//! End-to-end conversions through the public pipeline

use std::f32::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;

use approx::assert_relative_eq;
use tempfile::tempdir;
use usdzcrate_cli::{convert, emit_blocks, emit_cube, ConversionOptions, BLOCK_PALETTE};
use usdzcrate_core::{Drawable, Error, Point3f, TriangleMesh};
use usdzcrate_io::{read_scene, read_usdz_entries, SceneOptions, USDZ_ENTRY_NAME};
use usdzcrate_simplification::SimplifyOutcome;
use zip::write::SimpleFileOptions;

/// Closed UV sphere with `2 * slices * (stacks - 1)` faces.
fn uv_sphere(center: Point3f, radius: f32, slices: usize, stacks: usize) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    mesh.add_vertex(center + up(radius));
    for i in 1..stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..slices {
            let theta = 2.0 * PI * j as f32 / slices as f32;
            mesh.add_vertex(Point3f::new(
                center.x + radius * phi.sin() * theta.cos(),
                center.y + radius * phi.cos(),
                center.z + radius * phi.sin() * theta.sin(),
            ));
        }
    }
    let south = mesh.add_vertex(center - up(radius));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + j % slices;
    for j in 0..slices {
        mesh.add_face([0, ring(1, j + 1), ring(1, j)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let (a, b) = (ring(i, j), ring(i, j + 1));
            let (c, d) = (ring(i + 1, j), ring(i + 1, j + 1));
            mesh.add_face([a, b, d]);
            mesh.add_face([a, d, c]);
        }
    }
    for j in 0..slices {
        mesh.add_face([south, ring(stacks - 1, j), ring(stacks - 1, j + 1)]);
    }
    mesh
}

fn up(length: f32) -> usdzcrate_core::Vector3f {
    usdzcrate_core::Vector3f::new(0.0, length, 0.0)
}

/// Give every face its own three vertices, the way many exporters write.
fn unshared_corners(mesh: &TriangleMesh) -> TriangleMesh {
    let mut soup = TriangleMesh::new();
    for face in &mesh.faces {
        let [a, b, c] = face.map(|i| soup.add_vertex(mesh.vertices[i]));
        soup.add_face([a, b, c]);
    }
    soup
}

fn write_3mf(path: &Path, mesh: &TriangleMesh) {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<model unit=\"millimeter\" xmlns=\"http://schemas.microsoft.com/3dmanufacturing/core/2015/02\">\n<resources><object id=\"1\" type=\"model\"><mesh><vertices>\n",
    );
    for v in &mesh.vertices {
        writeln!(xml, "<vertex x=\"{}\" y=\"{}\" z=\"{}\"/>", v.x, v.y, v.z).unwrap();
    }
    xml.push_str("</vertices><triangles>\n");
    for f in &mesh.faces {
        writeln!(xml, "<triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>", f[0], f[1], f[2]).unwrap();
    }
    xml.push_str("</triangles></mesh></object></resources>\n<build><item objectid=\"1\"/></build>\n</model>\n");

    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    zip.start_file("3D/3dmodel.model", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Read the mesh back out of a USDA document.
fn parse_scene_mesh(text: &str) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let mut in_points = false;
    for line in text.lines().map(str::trim) {
        if line.starts_with("point3f[] points = [") {
            in_points = true;
            continue;
        }
        if in_points {
            if line == "]" {
                in_points = false;
                continue;
            }
            let coords: Vec<f32> = line
                .trim_end_matches(',')
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(", ")
                .map(|c| c.parse().unwrap())
                .collect();
            mesh.add_vertex(Point3f::new(coords[0], coords[1], coords[2]));
        } else if let Some(list) = line.strip_prefix("int[] faceVertexIndices = [") {
            let indices: Vec<usize> = list
                .trim_end_matches(']')
                .split(", ")
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().unwrap())
                .collect();
            for tri in indices.chunks(3) {
                mesh.add_face([tri[0], tri[1], tri[2]]);
            }
        } else if let Some(list) = line.strip_prefix("int[] faceVertexCounts = [") {
            assert!(list.trim_end_matches(']').split(", ").all(|c| c == "3"));
        }
    }
    mesh
}

#[test]
fn test_dense_sphere_is_reduced_centered_and_scaled() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("stone.3mf");
    let output = dir.path().join("stone.usdz");

    let sphere = uv_sphere(Point3f::new(30.0, -12.0, 7.5), 25.0, 200, 101);
    assert_eq!(sphere.face_count(), 40_000);
    write_3mf(&input, &sphere);

    let options = ConversionOptions {
        center: true,
        ..ConversionOptions::default()
    };
    let report = convert(&input, &output, &options).unwrap();
    assert_eq!(report.input_faces, 40_000);
    assert!(report.output_faces <= 20_000);
    assert!(report.output_faces > 0);

    let entries = read_usdz_entries(&output).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, USDZ_ENTRY_NAME);

    let text = String::from_utf8(entries[0].1.clone()).unwrap();
    assert!(text.contains("def Mesh \"Stone\""));
    assert!(text.contains("color3f inputs:diffuseColor = (0.600, 0.600, 0.600)"));

    let mesh = parse_scene_mesh(&text);
    assert_eq!(mesh.face_count(), report.output_faces);
    assert!(mesh.has_valid_indices());

    let com = mesh.center_mass();
    assert!(com.coords.norm() < 1e-3, "center of mass {:?}", com);
    assert!(mesh.vertex_centroid().coords.norm() < 0.05);

    let extents = mesh.extents();
    let longest = extents.x.max(extents.y).max(extents.z);
    assert_relative_eq!(longest, 0.98, epsilon = 1e-3);
}

#[test]
fn test_unshared_corners_still_meet_face_budget() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("soup.3mf");
    let output = dir.path().join("soup.usdz");

    let sphere = uv_sphere(Point3f::new(0.0, 4.0, 0.0), 3.0, 40, 21);
    let soup = unshared_corners(&sphere);
    assert_eq!(soup.vertex_count(), 3 * sphere.face_count());
    write_3mf(&input, &soup);

    let options = ConversionOptions {
        target_faces: 400,
        ..ConversionOptions::default()
    };
    let report = convert(&input, &output, &options).unwrap();
    assert_eq!(report.input_faces, 1_600);
    assert_eq!(report.simplification, SimplifyOutcome::Decimated);
    assert!(report.output_faces <= 400);

    let mesh = parse_scene_mesh(&read_scene(&output).unwrap());
    assert_eq!(mesh.face_count(), report.output_faces);
    assert!(mesh.vertex_count() < 3 * mesh.face_count());
}

#[test]
fn test_conversion_without_simplification_keeps_topology() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("ball.3mf");
    let output = dir.path().join("ball.usdz");

    let sphere = uv_sphere(Point3f::new(1.0, 2.0, 3.0), 2.0, 12, 7);
    write_3mf(&input, &sphere);

    let options = ConversionOptions {
        target_faces: 0,
        target_size: None,
        ..ConversionOptions::default()
    };
    let report = convert(&input, &output, &options).unwrap();
    assert_eq!(report.simplification, SimplifyOutcome::Unchanged);

    let mesh = parse_scene_mesh(&read_scene(&output).unwrap());
    assert_eq!(mesh.faces, sphere.faces);
    let (min, max) = mesh.bounding_box();
    assert_relative_eq!(min.y, 0.0, epsilon = 1e-4);
    assert_relative_eq!(max.y, 4.0, epsilon = 1e-4);
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("never.usdz");

    let err = convert(
        dir.path().join("missing.3mf"),
        &output,
        &ConversionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
    assert!(!output.exists());
}

#[test]
fn test_cube_scenario() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("PipestoneBlock.usdc");
    fs::write(&source, b"placeholder").unwrap();
    let destination = dir.path().join("Resources").join("Blocks").join("PipestoneBlock.usdz");

    let report = emit_cube(
        &source,
        &destination,
        0.98,
        [0.72, 0.18, 0.2],
        &SceneOptions::new("PipestoneBlock", true),
    )
    .unwrap();
    assert_eq!(report.path, destination);
    assert_eq!(report.bytes, fs::metadata(&destination).unwrap().len());

    let text = read_scene(&destination).unwrap();
    assert!(text.contains("def Mesh \"PipestoneBlock\""));
    assert!(text.contains("color3f inputs:diffuseColor = (0.720, 0.180, 0.200)"));
    assert!(text.contains("float inputs:roughness = 0.4"));

    let mesh = parse_scene_mesh(&text);
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.face_count(), 12);
    assert_relative_eq!(mesh.extents().x, 0.98, epsilon = 1e-4);
}

#[test]
fn test_cube_requires_source() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("out.usdz");
    let err = emit_cube(
        dir.path().join("missing.usdc"),
        &destination,
        0.98,
        [0.5, 0.5, 0.5],
        &SceneOptions::block(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
    assert!(!destination.exists());
}

#[test]
fn test_block_palette() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("Blocks");

    let reports = emit_blocks(&out_dir, 0.98).unwrap();
    assert_eq!(reports.len(), BLOCK_PALETTE.len());

    for (block, report) in BLOCK_PALETTE.iter().zip(&reports) {
        assert_eq!(report.path, out_dir.join(format!("{}.usdz", block.name)));
        let text = read_scene(&report.path).unwrap();
        let [r, g, b] = block.color;
        assert!(text.contains(&format!(
            "color3f inputs:diffuseColor = ({:.3}, {:.3}, {:.3})",
            r, g, b
        )));
        assert!(text.contains("float3[] extent = [(-0.4900, -0.4900, -0.4900), (0.4900, 0.4900, 0.4900)]"));
    }
}
