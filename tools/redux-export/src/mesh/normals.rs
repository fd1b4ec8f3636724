//! Vertex normal synthesis for sources without normals
//!
//! Each triangle contributes its unnormalized face vector
//! `(p1 - p0) x (p2 - p0)` to its three vertices, so larger triangles weigh
//! more. The per-vertex sum is divided by the adjacent-triangle count and
//! then normalized; the division is a uniform scale and leaves the direction
//! unchanged.

use glam::Vec3;

use super::types::{DEFAULT_NORMAL, IndexedMesh};

/// Compute smooth per-vertex normals for an indexed triangle list.
///
/// Vertices touched by no triangle, or whose contributions cancel out,
/// get [`DEFAULT_NORMAL`].
pub fn synthesize_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    let mut counts = vec![0u32; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let p0 = Vec3::from_array(positions[i0]);
        let p1 = Vec3::from_array(positions[i1]);
        let p2 = Vec3::from_array(positions[i2]);

        let face = (p1 - p0).cross(p2 - p0);
        for i in [i0, i1, i2] {
            sums[i] += face;
            counts[i] += 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                return DEFAULT_NORMAL;
            }
            (sum / count as f32)
                .try_normalize()
                .map_or(DEFAULT_NORMAL, |n| n.to_array())
        })
        .collect()
}

/// Overwrite every vertex normal of `mesh` with synthesized ones.
pub fn apply_synthesized_normals(mesh: &mut IndexedMesh) {
    let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
    let normals = synthesize_normals(&positions, &mesh.indices);

    for (vertex, normal) in mesh.vertices.iter_mut().zip(normals) {
        vertex.normal = normal;
    }
}
