//! Conversion error taxonomy

use std::io;
use std::path::PathBuf;

use redux_common::FormatError;

use crate::mesh::SourceWarning;

/// Everything that can abort a single conversion.
///
/// Record-level source problems are normally recovered (skipped and logged as
/// [`SourceWarning`]s); [`ConvertError::SourceFormat`] is only returned where a
/// single record cannot be skipped.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed source at {0}")]
    SourceFormat(SourceWarning),

    #[error("mesh is empty: {reason}")]
    EmptyMesh { reason: &'static str },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write sidecar files: {0}")]
    Format(#[from] FormatError),

    #[error("{} is already being written by another conversion", path.display())]
    OutputBusy { path: PathBuf },

    #[error("{count} unique vertices exceed the i32 index range")]
    IndexOverflow { count: usize },

    #[error("failed to load glTF {}: {message}", path.display())]
    Gltf { path: PathBuf, message: String },

    #[error("unsupported mesh format: {} (use .obj, .gltf, or .glb)", path.display())]
    UnsupportedFormat { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path_without_direction() {
        let err = ConvertError::Io {
            path: PathBuf::from("Models/Hair"),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty path"),
        };
        assert_eq!(err.to_string(), "I/O error on Models/Hair: empty path");
    }

    #[test]
    fn test_output_busy_message() {
        let err = ConvertError::OutputBusy {
            path: PathBuf::from("Models/Hair"),
        };
        let message = err.to_string();
        assert!(message.starts_with("Models/Hair is already being written"));
    }
}
