//! Sidecar file naming for Redux meshes.
//!
//! A converted mesh is stored as up to four files sharing one base name.
//! `SidecarFormat` is the single source of truth for their extensions.
//!
//! # Example
//!
//! ```
//! use redux_common::REDUX_SIDECAR_FORMAT;
//!
//! assert_eq!(REDUX_SIDECAR_FORMAT.positions_ext, "vtx");
//! assert_eq!(REDUX_SIDECAR_FORMAT.indices_ext, "idx");
//! ```

use std::path::{Path, PathBuf};

/// File extensions for the four sidecar files of a mesh.
#[derive(Debug, Clone, Copy)]
pub struct SidecarFormat {
    /// Vertex positions (3x f32 per vertex)
    pub positions_ext: &'static str,

    /// Texture coordinates (2x f32 per vertex)
    pub uvs_ext: &'static str,

    /// Vertex normals (3x f32 per vertex)
    pub normals_ext: &'static str,

    /// Triangle corner indices (i32 per corner)
    pub indices_ext: &'static str,
}

impl SidecarFormat {
    pub const fn new(
        positions_ext: &'static str,
        uvs_ext: &'static str,
        normals_ext: &'static str,
        indices_ext: &'static str,
    ) -> Self {
        Self {
            positions_ext,
            uvs_ext,
            normals_ext,
            indices_ext,
        }
    }

    /// All extensions in write order.
    pub const fn all(&self) -> [&'static str; 4] {
        [
            self.positions_ext,
            self.uvs_ext,
            self.normals_ext,
            self.indices_ext,
        ]
    }
}

/// The Redux mesh loader's sidecar layout: `.vtx`, `.tex`, `.nml`, `.idx`.
pub const REDUX_SIDECAR_FORMAT: SidecarFormat = SidecarFormat::new("vtx", "tex", "nml", "idx");

/// Build `<base>.<ext>`.
///
/// The extension is appended, so a base like `hair.v2` becomes `hair.v2.vtx`
/// instead of replacing the `.v2` part.
pub fn sidecar_path(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
