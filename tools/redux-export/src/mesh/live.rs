//! Live-mesh adapter
//!
//! An authoring tool hands over an evaluated mesh (modifiers applied)
//! through [`LiveMesh`]. Polygons are ordered loops; each loop names a
//! vertex and its own index into the active UV layer, so one vertex can
//! carry different UVs in different polygons. Normals are smooth
//! per-vertex normals and are addressed by the vertex index.

use std::ops::Range;

use super::types::{Corner, DEFAULT_UV, Face, RawMesh, SourceLocation, SourceWarning};
use crate::error::ConvertError;

/// One polygon corner of a live mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshLoop {
    /// Index into [`LiveMesh::vertex_positions`]
    pub vertex: u32,
    /// Index into [`LiveMesh::active_uv_layer`]
    pub loop_index: u32,
}

/// Read access to an evaluated polygon mesh owned by a host application.
pub trait LiveMesh {
    fn vertex_positions(&self) -> &[[f32; 3]];

    /// Smooth normals, one per vertex. Empty when the host has none.
    fn vertex_normals(&self) -> &[[f32; 3]];

    /// UVs of the active layer, one per loop. `None` without a UV layer.
    fn active_uv_layer(&self) -> Option<&[[f32; 2]]>;

    fn polygon_count(&self) -> usize;

    /// Loops of one polygon in winding order.
    fn polygon_loops(&self, polygon: usize) -> &[MeshLoop];
}

/// Owned [`LiveMesh`], built polygon by polygon.
///
/// ```ignore
/// let mut mesh = PolygonMesh::new(positions, normals);
/// mesh.push_polygon(&[0, 1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Option<Vec<[f32; 2]>>,
    loops: Vec<MeshLoop>,
    polygons: Vec<Range<usize>>,
}

impl PolygonMesh {
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            normals,
            ..Default::default()
        }
    }

    /// Add a polygon without UVs. If the mesh already has a UV layer, the
    /// new loops get the default UV.
    pub fn push_polygon(&mut self, vertices: &[u32]) {
        let start = self.loops.len();
        for &vertex in vertices {
            self.push_loop(vertex);
        }
        if let Some(uvs) = &mut self.uvs {
            uvs.resize(self.loops.len(), DEFAULT_UV);
        }
        self.polygons.push(start..self.loops.len());
    }

    /// Add a polygon with one UV per corner. The first call creates the UV
    /// layer and backfills earlier loops with the default UV.
    pub fn push_polygon_uv(&mut self, corners: &[(u32, [f32; 2])]) {
        let start = self.loops.len();
        let uvs = self.uvs.get_or_insert_with(|| vec![DEFAULT_UV; start]);
        uvs.extend(corners.iter().map(|&(_, uv)| uv));

        for &(vertex, _) in corners {
            self.push_loop(vertex);
        }
        self.polygons.push(start..self.loops.len());
    }

    fn push_loop(&mut self, vertex: u32) {
        let loop_index = self.loops.len() as u32;
        self.loops.push(MeshLoop { vertex, loop_index });
    }
}

impl LiveMesh for PolygonMesh {
    fn vertex_positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn vertex_normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    fn active_uv_layer(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn polygon_loops(&self, polygon: usize) -> &[MeshLoop] {
        &self.loops[self.polygons[polygon].clone()]
    }
}

/// Snapshot a live mesh into a [`RawMesh`].
///
/// Polygons with fewer than three loops or referencing a missing vertex are
/// skipped with a warning. A loop
/// index past the end of the UV layer means the host handed over an
/// inconsistent mesh and fails the conversion.
pub fn raw_mesh_from_live(
    mesh: &dyn LiveMesh,
    warnings: &mut Vec<SourceWarning>,
) -> Result<RawMesh, ConvertError> {
    let positions = mesh.vertex_positions().to_vec();
    let normals = mesh.vertex_normals().to_vec();
    let uv_layer = mesh.active_uv_layer();

    let mut faces = Vec::with_capacity(mesh.polygon_count());
    for polygon in 0..mesh.polygon_count() {
        let location = SourceLocation::Polygon(polygon);
        let loops = mesh.polygon_loops(polygon);

        if loops.len() < 3 {
            let warning = SourceWarning::new(
                location,
                format!("polygon has {} loops, need at least 3", loops.len()),
            );
            tracing::warn!("Skipping {}", warning);
            warnings.push(warning);
            continue;
        }

        if let Some(bad) = loops.iter().find(|l| l.vertex as usize >= positions.len()) {
            let warning = SourceWarning::new(
                location,
                format!(
                    "vertex {} out of range ({} vertices)",
                    bad.vertex,
                    positions.len()
                ),
            );
            tracing::warn!("Skipping {}", warning);
            warnings.push(warning);
            continue;
        }

        if let Some(layer) = uv_layer
            && let Some(bad) = loops.iter().find(|l| l.loop_index as usize >= layer.len())
        {
            return Err(ConvertError::SourceFormat(SourceWarning::new(
                location,
                format!(
                    "loop {} has no UV entry (layer holds {})",
                    bad.loop_index,
                    layer.len()
                ),
            )));
        }

        let corners = loops
            .iter()
            .map(|l| {
                let normal = ((l.vertex as usize) < normals.len()).then_some(l.vertex);
                let uv = uv_layer.map(|_| l.loop_index);
                Corner::new(l.vertex, normal, uv)
            })
            .collect();
        faces.push(Face { corners, location });
    }

    tracing::debug!(
        "Snapshot live mesh: {} vertices, {} polygons, UV layer: {}",
        positions.len(),
        faces.len(),
        uv_layer.is_some()
    );

    Ok(RawMesh {
        positions,
        normals,
        uvs: uv_layer.map(<[_]>::to_vec).unwrap_or_default(),
        faces,
    })
}
