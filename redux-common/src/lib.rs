//! Shared types for Redux mesh sidecar files
//!
//! This crate is used by:
//! - `redux-export` (asset pipeline, writes sidecars)
//! - loaders and inspection tools that read them back
//!
//! # Modules
//!
//! - [`formats`] - count-prefixed array codec and the four-file mesh set
//! - [`sidecar_format`] - file extension constants

pub mod formats;
pub mod sidecar_format;

pub use formats::{
    ArrayHeader, FormatError, SidecarMesh, decode_indices, decode_vectors, write_indices,
    write_vectors,
};
pub use sidecar_format::{REDUX_SIDECAR_FORMAT, SidecarFormat, sidecar_path};
