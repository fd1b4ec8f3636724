//! Intermediate mesh types shared by the conversion stages

use std::fmt;

use redux_common::SidecarMesh;

use crate::error::ConvertError;

/// Default normal for vertices with no usable geometry (+Y, "up" in the target space)
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

/// UV written for corners that carry no texture coordinate in a mesh that has some
pub(crate) const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// One vertex-use within a face. Every attribute is referenced explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    /// Index into [`RawMesh::positions`]
    pub position: u32,
    /// Index into [`RawMesh::normals`]
    pub normal: Option<u32>,
    /// Index into [`RawMesh::uvs`]
    pub uv: Option<u32>,
}

impl Corner {
    pub fn new(position: u32, normal: Option<u32>, uv: Option<u32>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Corner that only references a position.
    pub fn position_only(position: u32) -> Self {
        Self::new(position, None, None)
    }
}

/// Where in the source a face or record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation {
    /// 1-based line of a text source
    Line(usize),
    /// Polygon index of a live mesh
    Polygon(usize),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Line(line) => write!(f, "line {line}"),
            SourceLocation::Polygon(index) => write!(f, "polygon {index}"),
        }
    }
}

/// A recovered, record-level source problem. The record was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWarning {
    pub location: SourceLocation,
    pub message: String,
}

impl SourceWarning {
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Ordered polygon. Must have at least 3 corners to triangulate.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub corners: Vec<Corner>,
    pub location: SourceLocation,
}

/// Source-neutral mesh produced by every adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub positions: Vec<[f32; 3]>,
    /// Empty when the source has no normals
    pub normals: Vec<[f32; 3]>,
    /// Empty when the source has no UVs
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
}

impl RawMesh {
    /// True when every corner resolves to a source normal.
    ///
    /// A partially-normalled mesh counts as having none, so the whole mesh
    /// gets synthesized normals instead of a mix.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.corners().all(|c| c.normal.is_some())
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn corners(&self) -> impl Iterator<Item = &Corner> {
        self.faces.iter().flat_map(|f| f.corners.iter())
    }

    pub(crate) fn position(&self, corner: &Corner) -> [f32; 3] {
        self.positions[corner.position as usize]
    }
}

/// Exactly three corners, in output winding order.
pub type Triangle = [Corner; 3];

/// Deduplicated vertex: the (position, normal, uv) attribute tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniqueVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Deduplicated vertices plus triangle-corner indices into them.
///
/// `indices.len()` is a multiple of 3 and every index is `< vertices.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<UniqueVertex>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Split into the four sidecar arrays.
    pub fn into_sidecar(self, with_uvs: bool) -> Result<SidecarMesh, ConvertError> {
        let count = self.vertices.len();
        if count > i32::MAX as usize {
            return Err(ConvertError::IndexOverflow { count });
        }

        let positions = self.vertices.iter().map(|v| v.position).collect();
        let normals = self.vertices.iter().map(|v| v.normal).collect();
        let uvs = with_uvs.then(|| self.vertices.iter().map(|v| v.uv).collect());
        let indices = self.indices.iter().map(|&i| i as i32).collect();

        Ok(SidecarMesh {
            positions,
            uvs,
            normals,
            indices,
        })
    }
}
