//! glTF/GLB loading into a [`PolygonMesh`]

use std::path::Path;

use super::live::PolygonMesh;
use crate::error::ConvertError;

/// Load the first primitive of the first mesh as a triangle-list
/// [`PolygonMesh`]. Each loop shares its vertex's index, so UVs are
/// per-vertex as glTF stores them.
pub fn load_gltf(path: &Path) -> Result<PolygonMesh, ConvertError> {
    let gltf_err = |message: String| ConvertError::Gltf {
        path: path.to_path_buf(),
        message,
    };

    let (document, buffers, _images) = ::gltf::import(path).map_err(|e| gltf_err(e.to_string()))?;

    let mesh = document
        .meshes()
        .next()
        .ok_or_else(|| gltf_err("no meshes found".into()))?;
    let primitive = mesh
        .primitives()
        .next()
        .ok_or_else(|| gltf_err("no primitives found in mesh".into()))?;

    if primitive.mode() != ::gltf::mesh::Mode::Triangles {
        return Err(gltf_err(format!(
            "primitive mode {:?} is not a triangle list",
            primitive.mode()
        )));
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

    // Positions (required)
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| gltf_err("no positions in primitive".into()))?
        .collect();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());

    // Non-indexed primitives draw vertices in order
    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    if indices.len() % 3 != 0 {
        tracing::warn!(
            "{} index count {} is not a multiple of 3, dropping the tail",
            path.display(),
            indices.len()
        );
    }

    let mut polygons = PolygonMesh::new(positions, normals);
    for tri in indices.chunks_exact(3) {
        match &uvs {
            Some(uvs) => {
                let corners: Vec<(u32, [f32; 2])> = tri
                    .iter()
                    .map(|&v| (v, uvs.get(v as usize).copied().unwrap_or_default()))
                    .collect();
                polygons.push_polygon_uv(&corners);
            }
            None => polygons.push_polygon(tri),
        }
    }

    tracing::debug!(
        "Loaded glTF {}: {} triangles",
        path.display(),
        indices.len() / 3
    );

    Ok(polygons)
}
