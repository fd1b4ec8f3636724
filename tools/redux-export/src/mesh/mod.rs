//! Mesh pipeline stages: source adapters, axis conversion, triangulation,
//! deduplication and normal synthesis

mod axis;
mod dedup;
mod gltf;
mod live;
mod normals;
mod obj;
mod triangulate;
mod types;

pub use self::axis::{AxisConversion, AxisParseError};
pub use self::dedup::{VertexDeduplicator, deduplicate};
pub use self::gltf::load_gltf;
pub use self::live::{LiveMesh, MeshLoop, PolygonMesh, raw_mesh_from_live};
pub use self::normals::{apply_synthesized_normals, synthesize_normals};
pub use self::obj::{parse_obj_file, parse_obj_str};
pub use self::triangulate::{Triangulation, fan_triangulate, triangulate_face};
pub use self::types::{
    Corner, DEFAULT_NORMAL, Face, IndexedMesh, RawMesh, SourceLocation, SourceWarning, Triangle,
    UniqueVertex,
};
