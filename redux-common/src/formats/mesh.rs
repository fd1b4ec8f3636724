//! Redux sidecar mesh (`.vtx` / `.tex` / `.nml` / `.idx`)
//!
//! One mesh is four independent files sharing a base name:
//!
//! ```text
//! <base>.vtx  count u32 + count * [f32; 3]   positions
//! <base>.tex  count u32 + count * [f32; 2]   UVs (absent when the mesh has none)
//! <base>.nml  count u32 + count * [f32; 3]   normals
//! <base>.idx  count u32 + count * i32        triangle corners (3 per triangle)
//! ```
//!
//! Writing is not transactional: if the third file fails, the first two stay
//! on disk.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::array::{FormatError, decode_indices, decode_vectors, write_indices, write_vectors};
use crate::sidecar_format::{REDUX_SIDECAR_FORMAT, sidecar_path};

/// Decoded or ready-to-write sidecar mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidecarMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<i32>,
}

impl SidecarMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the cross-file invariants a loader relies on.
    pub fn validate(&self) -> Result<(), FormatError> {
        let vertex_count = self.positions.len();

        if self.normals.len() != vertex_count {
            return Err(FormatError::CountMismatch {
                ext: REDUX_SIDECAR_FORMAT.normals_ext,
                expected: vertex_count,
                found: self.normals.len(),
            });
        }
        if let Some(uvs) = &self.uvs
            && uvs.len() != vertex_count
        {
            return Err(FormatError::CountMismatch {
                ext: REDUX_SIDECAR_FORMAT.uvs_ext,
                expected: vertex_count,
                found: uvs.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(FormatError::CountMismatch {
                ext: REDUX_SIDECAR_FORMAT.indices_ext,
                expected: self.indices.len() / 3 * 3,
                found: self.indices.len(),
            });
        }
        for (corner, &index) in self.indices.iter().enumerate() {
            if index < 0 || index as usize >= vertex_count {
                return Err(FormatError::IndexOutOfRange {
                    corner,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Write every file of the set and return the paths written, in order.
    ///
    /// A `.tex` left over from an earlier export of the same base is removed
    /// when this mesh has no UVs.
    pub fn write(&self, base: &Path) -> Result<Vec<PathBuf>, FormatError> {
        let fmt = REDUX_SIDECAR_FORMAT;
        let mut written = Vec::with_capacity(4);

        written.push(write_file(base, fmt.positions_ext, |w| {
            write_vectors(w, &self.positions)
        })?);

        match &self.uvs {
            Some(uvs) => written.push(write_file(base, fmt.uvs_ext, |w| write_vectors(w, uvs))?),
            None => remove_stale(&sidecar_path(base, fmt.uvs_ext))?,
        }

        written.push(write_file(base, fmt.normals_ext, |w| {
            write_vectors(w, &self.normals)
        })?);
        written.push(write_file(base, fmt.indices_ext, |w| {
            write_indices(w, &self.indices)
        })?);

        Ok(written)
    }

    /// Read a sidecar set. `.tex` is optional; the other three are required.
    pub fn read(base: &Path) -> Result<Self, FormatError> {
        let fmt = REDUX_SIDECAR_FORMAT;

        let positions = decode_vectors(&read_file(&sidecar_path(base, fmt.positions_ext))?)?;
        let normals = decode_vectors(&read_file(&sidecar_path(base, fmt.normals_ext))?)?;
        let indices = decode_indices(&read_file(&sidecar_path(base, fmt.indices_ext))?)?;

        let uv_path = sidecar_path(base, fmt.uvs_ext);
        let uvs = match fs::read(&uv_path) {
            Ok(bytes) => Some(decode_vectors(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(FormatError::Io {
                    path: uv_path,
                    source,
                });
            }
        };

        Ok(Self {
            positions,
            uvs,
            normals,
            indices,
        })
    }
}

fn write_file<F>(base: &Path, ext: &str, body: F) -> Result<PathBuf, FormatError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = sidecar_path(base, ext);
    let result = File::create(&path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        body(&mut writer)?;
        writer.flush()
    });

    match result {
        Ok(()) => Ok(path),
        Err(source) => Err(FormatError::Io { path, source }),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, FormatError> {
    fs::read(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_stale(path: &Path) -> Result<(), FormatError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FormatError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quad() -> SidecarMesh {
        SidecarMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            normals: vec![[0.0, 0.0, 1.0]; 4],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("Quad");
        let mesh = quad();

        let written = mesh.write(&base).unwrap();
        assert_eq!(written.len(), 4);
        assert!(dir.path().join("Quad.vtx").exists());
        assert!(dir.path().join("Quad.tex").exists());
        assert!(dir.path().join("Quad.nml").exists());
        assert!(dir.path().join("Quad.idx").exists());

        let read = SidecarMesh::read(&base).unwrap();
        assert_eq!(read, mesh);
        read.validate().unwrap();
    }

    #[test]
    fn test_file_sizes() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("Quad");
        quad().write(&base).unwrap();

        let size = |ext: &str| fs::metadata(sidecar_path(&base, ext)).unwrap().len();
        assert_eq!(size("vtx"), 4 + 4 * 12);
        assert_eq!(size("tex"), 4 + 4 * 8);
        assert_eq!(size("nml"), 4 + 4 * 12);
        assert_eq!(size("idx"), 4 + 6 * 4);
    }

    #[test]
    fn test_no_uvs_omits_tex_and_removes_stale() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("Quad");
        quad().write(&base).unwrap();

        let mut mesh = quad();
        mesh.uvs = None;
        let written = mesh.write(&base).unwrap();

        assert_eq!(written.len(), 3);
        assert!(!dir.path().join("Quad.tex").exists());
        assert_eq!(SidecarMesh::read(&base).unwrap().uvs, None);
    }

    #[test]
    fn test_read_missing_required_file() {
        let dir = tempdir().unwrap();
        let err = SidecarMesh::read(&dir.path().join("Nothing")).unwrap_err();
        assert!(matches!(err, FormatError::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut mesh = quad();
        mesh.indices[4] = 4;
        assert!(matches!(
            mesh.validate(),
            Err(FormatError::IndexOutOfRange {
                corner: 4,
                index: 4,
                vertex_count: 4
            })
        ));
    }

    #[test]
    fn test_validate_rejects_normal_count_mismatch() {
        let mut mesh = quad();
        mesh.normals.pop();
        assert!(matches!(
            mesh.validate(),
            Err(FormatError::CountMismatch { ext: "nml", .. })
        ));
    }
}
