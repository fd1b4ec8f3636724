//! Single-mesh conversion: source in, sidecar set out
//!
//! ```text
//! source -> RawMesh -> axis remap -> triangles -> dedup -> (normals) -> .vtx/.tex/.nml/.idx
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use hashbrown::HashSet;
use serde::Deserialize;

use crate::error::ConvertError;
use crate::mesh::{
    AxisConversion, LiveMesh, RawMesh, SourceWarning, Triangle, Triangulation,
    apply_synthesized_normals, deduplicate, load_gltf, parse_obj_file, parse_obj_str,
    raw_mesh_from_live, triangulate_face,
};

/// Where a mesh comes from.
pub enum MeshSource<'a> {
    /// OBJ file on disk
    ObjFile(&'a Path),
    /// OBJ text in memory
    ObjText(&'a str),
    /// `.gltf` or `.glb` file; converted through the live-mesh path
    Gltf(&'a Path),
    /// Mesh owned by a host application
    Live(&'a dyn LiveMesh),
}

impl<'a> MeshSource<'a> {
    /// Pick a file source by extension.
    pub fn from_path(path: &'a Path) -> Result<Self, ConvertError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("obj") => Ok(Self::ObjFile(path)),
            Some("gltf" | "glb") => Ok(Self::Gltf(path)),
            _ => Err(ConvertError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    fn load(&self, warnings: &mut Vec<SourceWarning>) -> Result<RawMesh, ConvertError> {
        match self {
            Self::ObjFile(path) => parse_obj_file(path, warnings),
            Self::ObjText(text) => Ok(parse_obj_str(text, warnings)),
            Self::Gltf(path) => raw_mesh_from_live(&load_gltf(path)?, warnings),
            Self::Live(mesh) => raw_mesh_from_live(*mesh, warnings),
        }
    }
}

/// Per-conversion options. Every field has a default, so an empty
/// `[export]` table is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub axis: AxisConversion,
    pub triangulation: Triangulation,
    /// Decimal places for quantized vertex welding; `None` merges only
    /// exactly equal attribute tuples
    pub weld_precision: Option<u32>,
}

/// What a successful conversion wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub has_uvs: bool,
    /// True when the source had no usable normals
    pub normals_synthesized: bool,
    pub files: Vec<PathBuf>,
}

/// Outcome of [`convert`], for callers that report rather than propagate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub success: bool,
    /// `"Exported N vertices, M triangles"` or the error
    pub message: String,
    pub warnings: Vec<SourceWarning>,
    pub summary: Option<ConversionSummary>,
}

/// Convert `source` into the sidecar set at `<base>.vtx`, `<base>.tex`,
/// `<base>.nml` and `<base>.idx`. Never fails; errors land in the report.
pub fn convert(
    source: &MeshSource<'_>,
    base: &Path,
    settings: &ExportSettings,
) -> ConversionReport {
    let mut warnings = Vec::new();

    match try_convert(source, base, settings, &mut warnings) {
        Ok(summary) => ConversionReport {
            success: true,
            message: format!(
                "Exported {} vertices, {} triangles",
                summary.vertex_count, summary.triangle_count
            ),
            warnings,
            summary: Some(summary),
        },
        Err(e) => ConversionReport::failed(base, &e, warnings),
    }
}

/// [`convert`] for a file on disk, choosing the source by extension.
pub fn convert_file(input: &Path, base: &Path, settings: &ExportSettings) -> ConversionReport {
    match MeshSource::from_path(input) {
        Ok(source) => convert(&source, base, settings),
        Err(e) => ConversionReport::failed(base, &e, Vec::new()),
    }
}

impl ConversionReport {
    fn failed(base: &Path, error: &ConvertError, warnings: Vec<SourceWarning>) -> Self {
        tracing::error!("Export to {} failed: {}", base.display(), error);
        Self {
            success: false,
            message: error.to_string(),
            warnings,
            summary: None,
        }
    }
}

/// [`convert`] with errors propagated. Skipped records are appended to
/// `warnings` whether or not the conversion succeeds.
pub fn try_convert(
    source: &MeshSource<'_>,
    base: &Path,
    settings: &ExportSettings,
    warnings: &mut Vec<SourceWarning>,
) -> Result<ConversionSummary, ConvertError> {
    let _lock = OutputLock::acquire(base)?;

    let mut raw = source.load(warnings)?;
    if raw.positions.is_empty() {
        return Err(ConvertError::EmptyMesh {
            reason: "no vertex positions",
        });
    }

    settings.axis.apply_to_mesh(&mut raw);
    let triangles = triangulate(&raw, settings, warnings);
    if triangles.is_empty() {
        return Err(ConvertError::EmptyMesh {
            reason: "no usable faces",
        });
    }

    let normals_synthesized = !raw.has_normals();
    let has_uvs = raw.has_uvs();

    let mut indexed = deduplicate(&raw, &triangles, settings.weld_precision);
    if normals_synthesized {
        apply_synthesized_normals(&mut indexed);
    }

    let vertex_count = indexed.vertices.len();
    let triangle_count = indexed.triangle_count();
    let files = indexed.into_sidecar(has_uvs)?.write(base)?;

    tracing::info!(
        "Exported {}: {} vertices, {} triangles{}{}",
        base.display(),
        vertex_count,
        triangle_count,
        if has_uvs { "" } else { ", no UVs" },
        if normals_synthesized {
            ", synthesized normals"
        } else {
            ""
        }
    );

    Ok(ConversionSummary {
        vertex_count,
        triangle_count,
        has_uvs,
        normals_synthesized,
        files,
    })
}

/// Triangulate every face in output winding order.
fn triangulate(
    raw: &RawMesh,
    settings: &ExportSettings,
    warnings: &mut Vec<SourceWarning>,
) -> Vec<Triangle> {
    let flip = settings.axis.flips_handedness();
    let mut triangles = Vec::with_capacity(raw.faces.len() * 2);

    for face in &raw.faces {
        match triangulate_face(face, &raw.positions, settings.triangulation) {
            Ok(tris) => triangles.extend(
                tris.into_iter()
                    .map(|[a, b, c]| if flip { [a, c, b] } else { [a, b, c] }),
            ),
            Err(warning) => {
                tracing::warn!("Skipping face at {}", warning);
                warnings.push(warning);
            }
        }
    }

    tracing::debug!(
        "Triangulated {} faces into {} triangles (winding {})",
        raw.faces.len(),
        triangles.len(),
        if flip { "reversed" } else { "kept" }
    );
    triangles
}

static ACTIVE_OUTPUTS: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();

/// Process-wide claim on an output base, released on drop.
struct OutputLock {
    path: PathBuf,
}

impl OutputLock {
    fn acquire(base: &Path) -> Result<Self, ConvertError> {
        let path = std::path::absolute(base).map_err(|source| ConvertError::Io {
            path: base.to_path_buf(),
            source,
        })?;

        let mut active = ACTIVE_OUTPUTS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !active.insert(path.clone()) {
            return Err(ConvertError::OutputBusy { path });
        }
        Ok(Self { path })
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Some(active) = ACTIVE_OUTPUTS.get() {
            active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{DEFAULT_NORMAL, PolygonMesh, SourceLocation};
    use redux_common::SidecarMesh;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn exists(base: &Path, ext: &str) -> bool {
        redux_common::sidecar_path(base, ext).exists()
    }

    #[test]
    fn test_single_triangle_default_axis() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("tri");

        let report = convert(
            &MeshSource::ObjText(TRIANGLE),
            &base,
            &ExportSettings::default(),
        );
        assert!(report.success, "{}", report.message);
        assert_eq!(report.message, "Exported 3 vertices, 1 triangles");

        let mesh = SidecarMesh::read(&base).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices.len(), 3);
        assert!(mesh.uvs.is_none());
        assert!(!exists(&base, "tex"));

        // Remapped (y, z, -x) with reversed winding: still faces +Y
        for n in &mesh.normals {
            assert_eq!(*n, [0.0, 1.0, 0.0]);
        }
        assert!(mesh.positions.contains(&[0.0, 0.0, -1.0]));
        assert!(mesh.positions.contains(&[1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_identity_axis_keeps_winding() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("tri");
        let settings = ExportSettings {
            axis: AxisConversion::IDENTITY,
            ..Default::default()
        };

        let mut warnings = Vec::new();
        let summary = try_convert(
            &MeshSource::ObjText(TRIANGLE),
            &base,
            &settings,
            &mut warnings,
        )
        .unwrap();
        assert!(summary.normals_synthesized);

        let mesh = SidecarMesh::read(&base).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn test_reversed_winding_swaps_corners() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("quad");
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";

        convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
        );
        let mesh = SidecarMesh::read(&base).unwrap();

        // Fan (0,1,2),(0,2,3) becomes (0,2,1),(0,3,2); vertices in first-seen order
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 3, 1]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_source_normals_are_remapped_not_synthesized() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("lit");
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";

        let mut warnings = Vec::new();
        let summary = try_convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
            &mut warnings,
        )
        .unwrap();
        assert!(!summary.normals_synthesized);

        let mesh = SidecarMesh::read(&base).unwrap();
        assert_eq!(mesh.normals, vec![[0.0, 1.0, -0.0]; 3]);
    }

    #[test]
    fn test_uvs_written_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("uv");
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

        let report = convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
        );
        assert!(report.summary.unwrap().has_uvs);

        let mesh = SidecarMesh::read(&base).unwrap();
        let uvs = mesh.uvs.unwrap();
        assert_eq!(uvs.len(), 3);
        assert!(uvs.contains(&[1.0, 0.0]));
    }

    #[test]
    fn test_empty_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("empty");

        let report = convert(
            &MeshSource::ObjText("# nothing\n"),
            &base,
            &ExportSettings::default(),
        );
        assert!(!report.success);
        assert!(report.message.contains("no vertex positions"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_all_faces_rejected_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("broken");
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\nf 1 2 9\n";

        let mut warnings = Vec::new();
        let err = try_convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
            &mut warnings,
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::EmptyMesh { .. }));
        assert_eq!(warnings.len(), 2);
        assert!(!exists(&base, "vtx"));
    }

    #[test]
    fn test_malformed_face_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("partial");
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 x\nf 1 2 3\n";

        let report = convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
        );
        assert!(report.success);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].location, SourceLocation::Line(4));
        assert_eq!(report.summary.unwrap().triangle_count, 1);
    }

    #[test]
    fn test_concurrent_output_is_busy() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("busy");

        let held = OutputLock::acquire(&base).unwrap();
        let report = convert(
            &MeshSource::ObjText(TRIANGLE),
            &base,
            &ExportSettings::default(),
        );
        assert!(!report.success);
        assert!(report.message.contains("already being written"));

        drop(held);
        let report = convert(
            &MeshSource::ObjText(TRIANGLE),
            &base,
            &ExportSettings::default(),
        );
        assert!(report.success);
    }

    #[test]
    fn test_unresolvable_output_path_is_io_error() {
        let report = convert(
            &MeshSource::ObjText(TRIANGLE),
            Path::new(""),
            &ExportSettings::default(),
        );
        assert!(!report.success);
        assert!(
            report.message.starts_with("I/O error on"),
            "{}",
            report.message
        );
    }

    #[test]
    fn test_dropped_live_polygon_keeps_source_normals() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("live");

        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [5.0, 5.0, 5.0],
        ];
        // No normal for vertex 3, which only the two-loop polygon uses
        let mut live = PolygonMesh::new(positions, vec![[0.0, 1.0, 0.0]; 3]);
        live.push_polygon(&[0, 1, 2]);
        live.push_polygon(&[2, 3]);

        let settings = ExportSettings {
            axis: AxisConversion::IDENTITY,
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let summary =
            try_convert(&MeshSource::Live(&live), &base, &settings, &mut warnings).unwrap();

        assert!(!summary.normals_synthesized);
        assert_eq!(warnings.len(), 1);
        let mesh = SidecarMesh::read(&base).unwrap();
        assert_eq!(mesh.normals, vec![[0.0, 1.0, 0.0]; 3]);
    }

    #[test]
    fn test_live_mesh_uv_seam() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("live");

        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let mut live = PolygonMesh::new(positions, vec![[0.0, 0.0, 1.0]; 4]);
        live.push_polygon_uv(&[(0, [0.0, 0.0]), (1, [1.0, 0.0]), (2, [1.0, 1.0])]);
        // Vertex 0 again, with a different UV
        live.push_polygon_uv(&[(0, [0.5, 0.5]), (2, [1.0, 1.0]), (3, [0.0, 1.0])]);

        let mut warnings = Vec::new();
        let summary = try_convert(
            &MeshSource::Live(&live),
            &base,
            &ExportSettings::default(),
            &mut warnings,
        )
        .unwrap();

        assert_eq!(summary.vertex_count, 5);
        assert_eq!(summary.triangle_count, 2);
        assert!(summary.has_uvs);
    }

    #[test]
    fn test_degenerate_geometry_gets_default_normal() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("line");
        let text = "v 0 0 0\nv 1 0 0\nv 2 0 0\nf 1 2 3\n";

        convert(
            &MeshSource::ObjText(text),
            &base,
            &ExportSettings::default(),
        );
        let mesh = SidecarMesh::read(&base).unwrap();
        assert!(mesh.normals.iter().all(|&n| n == DEFAULT_NORMAL));
    }

    #[test]
    fn test_source_from_path() {
        assert!(matches!(
            MeshSource::from_path(Path::new("hair.OBJ")),
            Ok(MeshSource::ObjFile(_))
        ));
        assert!(matches!(
            MeshSource::from_path(Path::new("hair.glb")),
            Ok(MeshSource::Gltf(_))
        ));
        assert!(matches!(
            MeshSource::from_path(Path::new("hair.fbx")),
            Err(ConvertError::UnsupportedFormat { .. })
        ));
    }
}
