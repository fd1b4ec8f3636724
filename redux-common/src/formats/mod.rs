//! Redux binary sidecar formats
//!
//! POD formats consumed by the renderer's custom model loader. No magic
//! bytes, versioning, or compression: each file is a `u32` count followed by
//! fixed-size little-endian records.
//!
//! File extensions are defined in [`crate::REDUX_SIDECAR_FORMAT`].

pub mod array;
pub mod mesh;

pub use array::*;
pub use mesh::*;

// Re-export naming constants for convenience
pub use crate::sidecar_format::{REDUX_SIDECAR_FORMAT, SidecarFormat, sidecar_path};
