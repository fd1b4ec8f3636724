//! redux-export library
//!
//! Converts polygon meshes (OBJ text, glTF files or a host application's
//! live mesh) into the `.vtx` / `.tex` / `.nml` / `.idx` sidecar set read by
//! the Kerbonaut Redux runtime.

pub mod convert;
pub mod error;
pub mod manifest;
pub mod mesh;

pub use convert::{
    ConversionReport, ConversionSummary, ExportSettings, MeshSource, convert, convert_file,
    try_convert,
};
pub use error::ConvertError;
pub use manifest::{ReduxManifest, build_all};
pub use mesh::{AxisConversion, LiveMesh, MeshLoop, PolygonMesh, SourceWarning, Triangulation};

// Re-export the sidecar codec so callers need only this crate
pub use redux_common::{REDUX_SIDECAR_FORMAT, SidecarMesh, sidecar_path};
