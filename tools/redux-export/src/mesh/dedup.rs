//! Attribute-aware vertex deduplication
//!
//! Triangle corners are merged when their (position, normal, uv) tuples are
//! equal. The default contract is exact IEEE equality: `0.0` and `-0.0` merge,
//! anything else that differs (even by one ulp) stays distinct. That is how UV
//! seams survive: same position and normal, different UV, two vertices.
//!
//! `weld_precision` switches to a quantized key, rounding each component to a
//! fixed number of decimal places before hashing, for sources whose attributes
//! carry floating-point noise.

use hashbrown::HashMap;

use super::types::{
    Corner, DEFAULT_NORMAL, DEFAULT_UV, IndexedMesh, RawMesh, Triangle, UniqueVertex,
};

/// Hash key: 3 position + 3 normal + 2 uv components
type VertexKey = [u64; 8];

/// Incremental deduplicator. Vertices are numbered in first-seen order, so
/// output is stable across runs on identical input.
pub struct VertexDeduplicator<'a> {
    mesh: &'a RawMesh,
    with_normals: bool,
    weld_scale: Option<f64>,
    lookup: HashMap<VertexKey, u32>,
    vertices: Vec<UniqueVertex>,
}

impl<'a> VertexDeduplicator<'a> {
    /// `weld_precision` is a number of decimal places; `None` keeps exact equality.
    pub fn new(mesh: &'a RawMesh, weld_precision: Option<u32>) -> Self {
        Self {
            mesh,
            with_normals: mesh.has_normals(),
            weld_scale: weld_precision.map(|digits| 10f64.powi(digits.min(15) as i32)),
            lookup: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    /// Resolve a corner to its unique vertex index, adding it if new.
    pub fn insert(&mut self, corner: &Corner) -> u32 {
        let vertex = self.resolve(corner);
        let key = self.key(&vertex);

        *self.lookup.entry(key).or_insert_with(|| {
            self.vertices.push(vertex);
            (self.vertices.len() - 1) as u32
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn into_vertices(self) -> Vec<UniqueVertex> {
        self.vertices
    }

    /// Look up the attribute tuple for a corner. Normals are left at the
    /// default when the mesh has none; they are synthesized later.
    fn resolve(&self, corner: &Corner) -> UniqueVertex {
        let normal = match corner.normal {
            Some(n) if self.with_normals => self.mesh.normals[n as usize],
            _ => DEFAULT_NORMAL,
        };
        let uv = corner
            .uv
            .map(|t| self.mesh.uvs[t as usize])
            .unwrap_or(DEFAULT_UV);

        UniqueVertex {
            position: self.mesh.position(corner),
            normal,
            uv,
        }
    }

    fn key(&self, v: &UniqueVertex) -> VertexKey {
        let mut key = [0u64; 8];
        let components = v.position.iter().chain(&v.normal).chain(&v.uv);
        for (slot, &value) in key.iter_mut().zip(components) {
            *slot = match self.weld_scale {
                Some(scale) => quantize(value, scale),
                None => exact_bits(value),
            };
        }
        key
    }
}

/// Bit pattern with IEEE equality semantics: both zeros share one key.
#[inline]
fn exact_bits(value: f32) -> u64 {
    if value == 0.0 {
        0
    } else {
        u64::from(value.to_bits())
    }
}

#[inline]
fn quantize(value: f32, scale: f64) -> u64 {
    ((f64::from(value) * scale).round() as i64) as u64
}

/// Deduplicate a triangle list into an [`IndexedMesh`].
pub fn deduplicate(
    mesh: &RawMesh,
    triangles: &[Triangle],
    weld_precision: Option<u32>,
) -> IndexedMesh {
    let mut dedup = VertexDeduplicator::new(mesh, weld_precision);
    let indices: Vec<u32> = triangles
        .iter()
        .flat_map(|tri| tri.iter())
        .map(|corner| dedup.insert(corner))
        .collect();

    tracing::debug!(
        "Deduplicated {} corners into {} vertices",
        indices.len(),
        dedup.vertex_count()
    );

    IndexedMesh {
        vertices: dedup.into_vertices(),
        indices,
    }
}
