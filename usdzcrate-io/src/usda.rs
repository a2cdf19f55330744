//! USDA scene serialization
//!
//! Writes a triangle mesh and its preview material as a small, self-contained
//! USD ASCII layer: one `Root` transform holding a mesh prim bound to a
//! `UsdPreviewSurface` material. Numbers use fixed precision so output size
//! and diffs stay predictable.

use std::fmt::{self, Write};

use usdzcrate_core::{Drawable, Material, Point3f, TriangleMesh};

/// Layer header declaring one scene unit per meter.
pub const USDA_HEADER: &str = "#usda 1.0\n(\n    metersPerUnit = 1\n)\n";
/// Decimal places for vertex positions and extents.
pub const POINT_PRECISION: usize = 4;
/// Decimal places for the diffuse color.
pub const COLOR_PRECISION: usize = 3;
/// Decimal places for scalar shader inputs.
pub const SCALAR_PRECISION: usize = 1;
/// Separator between array elements.
pub const LIST_SEPARATOR: &str = ", ";

/// Mesh prim name used for converted meshes.
pub const DEFAULT_MESH_NAME: &str = "Stone";
/// Mesh prim name used for cube blocks.
pub const BLOCK_MESH_NAME: &str = "Block";

const POINT_INDENT: &str = "            ";

/// Options controlling the generated scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    /// Name of the mesh prim under `/Root`
    pub mesh_name: String,
    /// Emit an `extent` attribute holding the mesh bounds
    pub include_extent: bool,
}

impl SceneOptions {
    pub fn new(mesh_name: impl AsRef<str>, include_extent: bool) -> Self {
        Self {
            mesh_name: sanitize_prim_name(mesh_name.as_ref()),
            include_extent,
        }
    }

    /// Options for cube blocks, which carry their bounds.
    pub fn block() -> Self {
        Self::new(BLOCK_MESH_NAME, true)
    }
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MESH_NAME, false)
    }
}

/// Make `name` usable as a USD prim identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, and a leading digit is
/// prefixed with `_`. An empty name falls back to [`DEFAULT_MESH_NAME`].
pub fn sanitize_prim_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return DEFAULT_MESH_NAME.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// A serialized USDA document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDocument {
    text: String,
}

impl SceneDocument {
    /// Serialize `mesh` bound to `material`.
    ///
    /// Faces are written in their stored order and winding. Inputs are not
    /// modified.
    pub fn build(mesh: &TriangleMesh, material: &Material, options: &SceneOptions) -> Self {
        let scene = Scene {
            mesh,
            material,
            options,
        };
        Self {
            text: scene.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for SceneDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct Scene<'a> {
    mesh: &'a TriangleMesh,
    material: &'a Material,
    options: &'a SceneOptions,
}

impl fmt::Display for Scene<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mesh = self.mesh;

        f.write_str(USDA_HEADER)?;
        writeln!(f)?;
        writeln!(f, "def Xform \"Root\" {{")?;
        writeln!(f, "    def Mesh \"{}\" {{", self.options.mesh_name)?;

        writeln!(f, "        point3f[] points = [")?;
        f.write_str(&points_block(&mesh.vertices))?;
        writeln!(f, "        ]")?;

        let counts = vec!["3"; mesh.faces.len()].join(LIST_SEPARATOR);
        writeln!(f, "        int[] faceVertexCounts = [{}]", counts)?;
        writeln!(f, "        int[] faceVertexIndices = [{}]", index_list(&mesh.faces))?;

        if self.options.include_extent {
            let (min, max) = mesh.bounding_box();
            writeln!(
                f,
                "        float3[] extent = [{}{}{}]",
                tuple3(&min),
                LIST_SEPARATOR,
                tuple3(&max)
            )?;
        }

        writeln!(f, "        uniform token subdivisionScheme = \"none\"")?;
        writeln!(f, "        rel material:binding = </Root/Material>")?;
        writeln!(f, "    }}")?;
        writeln!(f)?;

        let [r, g, b] = self.material.diffuse;
        let p = COLOR_PRECISION;
        writeln!(f, "    def Material \"Material\" {{")?;
        writeln!(
            f,
            "        token outputs:surface.connect = </Root/Material/PreviewSurface.outputs:surface>"
        )?;
        writeln!(f, "        def Shader \"PreviewSurface\" {{")?;
        writeln!(f, "            uniform token info:id = \"UsdPreviewSurface\"")?;
        writeln!(
            f,
            "            color3f inputs:diffuseColor = ({r:.p$}{sep}{g:.p$}{sep}{b:.p$})",
            sep = LIST_SEPARATOR
        )?;
        let s = SCALAR_PRECISION;
        writeln!(
            f,
            "            float inputs:metallic = {:.s$}",
            self.material.metallic
        )?;
        writeln!(
            f,
            "            float inputs:roughness = {:.s$}",
            self.material.roughness
        )?;
        writeln!(f, "            token outputs:surface")?;
        writeln!(f, "        }}")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")
    }
}

fn tuple3(p: &Point3f) -> String {
    let n = POINT_PRECISION;
    format!(
        "({:.n$}{sep}{:.n$}{sep}{:.n$})",
        p.x,
        p.y,
        p.z,
        sep = LIST_SEPARATOR
    )
}

/// One point per line, comma separated.
fn points_block(points: &[Point3f]) -> String {
    let mut out = String::with_capacity(points.len() * 48);
    for (i, p) in points.iter().enumerate() {
        out.push_str(POINT_INDENT);
        out.push_str(&tuple3(p));
        if i + 1 < points.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out
}

fn index_list(faces: &[[usize; 3]]) -> String {
    let mut out = String::with_capacity(faces.len() * 12);
    for (i, idx) in faces.iter().flatten().enumerate() {
        if i > 0 {
            out.push_str(LIST_SEPARATOR);
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{}", idx);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use usdzcrate_core::{cube, DEFAULT_DIFFUSE};

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 0.5, -0.25),
            ],
            vec![[0, 2, 1]],
        )
    }

    #[test]
    fn test_triangle_document() {
        let doc = SceneDocument::build(
            &triangle(),
            &Material::preview(DEFAULT_DIFFUSE),
            &SceneOptions::default(),
        );
        let expected = r#"#usda 1.0
(
    metersPerUnit = 1
)

def Xform "Root" {
    def Mesh "Stone" {
        point3f[] points = [
            (0.0000, 0.0000, 0.0000),
            (1.0000, 0.0000, 0.0000),
            (0.0000, 0.5000, -0.2500)
        ]
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 2, 1]
        uniform token subdivisionScheme = "none"
        rel material:binding = </Root/Material>
    }

    def Material "Material" {
        token outputs:surface.connect = </Root/Material/PreviewSurface.outputs:surface>
        def Shader "PreviewSurface" {
            uniform token info:id = "UsdPreviewSurface"
            color3f inputs:diffuseColor = (0.600, 0.600, 0.600)
            float inputs:metallic = 0.0
            float inputs:roughness = 0.8
            token outputs:surface
        }
    }
}
"#;
        assert_eq!(doc.as_str(), expected);
    }

    #[test]
    fn test_block_document_has_extent() {
        let doc = SceneDocument::build(
            &cube(0.98),
            &Material::block([0.72, 0.18, 0.2]),
            &SceneOptions::block(),
        );
        let text = doc.as_str();
        assert!(text.contains("def Mesh \"Block\""));
        assert!(text.contains(
            "float3[] extent = [(-0.4900, -0.4900, -0.4900), (0.4900, 0.4900, 0.4900)]"
        ));
        assert!(text.contains("color3f inputs:diffuseColor = (0.720, 0.180, 0.200)"));
        assert!(text.contains("float inputs:roughness = 0.4"));
        assert!(text.contains(&format!("[{}]", vec!["3"; 12].join(", "))));
    }

    #[test]
    fn test_counts_and_indices_track_faces() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            triangle().vertices,
            vec![[0, 1, 2], [2, 1, 0], [1, 0, 2]],
        );
        let doc = SceneDocument::build(&mesh, &Material::default(), &SceneOptions::default());
        assert!(doc
            .as_str()
            .contains("int[] faceVertexIndices = [0, 1, 2, 2, 1, 0, 1, 0, 2]"));
        assert!(doc.as_str().contains("int[] faceVertexCounts = [3, 3, 3]"));
    }

    #[test]
    fn test_no_scientific_notation() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(1.0e-7, 12345.678, -0.00004),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let doc = SceneDocument::build(&mesh, &Material::default(), &SceneOptions::default());
        assert!(doc.as_str().contains("(0.0000, 12345.6777, "));
        assert!(!doc.as_str().contains("e-"));
    }

    #[test]
    fn test_build_does_not_touch_mesh() {
        let mesh = triangle();
        let before = mesh.clone();
        let _ = SceneDocument::build(&mesh, &Material::default(), &SceneOptions::default());
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_sanitize_prim_name() {
        assert_eq!(sanitize_prim_name("PipestoneBlock"), "PipestoneBlock");
        assert_eq!(sanitize_prim_name("rock block-2"), "rock_block_2");
        assert_eq!(sanitize_prim_name("3DPrint"), "_3DPrint");
        assert_eq!(sanitize_prim_name(""), DEFAULT_MESH_NAME);
    }
}
