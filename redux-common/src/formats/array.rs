//! Count-prefixed array encoding
//!
//! Every sidecar file has the same shape:
//!
//! ```text
//! 0x00: count u32 (little-endian)
//! 0x04: count * record, each record little-endian
//! ```
//!
//! Records are either fixed-width float vectors (`[f32; 2]`, `[f32; 3]`) or
//! single `i32` indices. There is no magic, version, or checksum.

use std::io::{self, Write};
use std::path::PathBuf;

use bytemuck::Pod;

/// Errors from reading or decoding sidecar files.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "file is {found} bytes, too small for the {}-byte count header",
        ArrayHeader::SIZE
    )]
    MissingHeader { found: usize },

    #[error("truncated array: expected {expected} record bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("{extra} trailing bytes after the last record")]
    TrailingBytes { extra: usize },

    #[error("{ext} holds {found} records, expected {expected}")]
    CountMismatch {
        ext: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("index {index} at corner {corner} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        corner: usize,
        index: i32,
        vertex_count: usize,
    },
}

/// Count prefix shared by all sidecar files (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ArrayHeader {
    pub count: u32,
}

impl ArrayHeader {
    pub const SIZE: usize = 4;

    pub fn new(count: u32) -> Self {
        Self { count }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.count.to_le_bytes()
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }
}

fn header_for(len: usize) -> io::Result<ArrayHeader> {
    let count = u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{len} records do not fit in a u32 count"),
        )
    })?;
    Ok(ArrayHeader::new(count))
}

/// Write a count-prefixed array of float vectors (`[f32; 2]` or `[f32; 3]`).
pub fn write_vectors<W: Write, const N: usize>(w: &mut W, vectors: &[[f32; N]]) -> io::Result<()>
where
    [f32; N]: Pod,
{
    w.write_all(&header_for(vectors.len())?.to_bytes())?;

    let scalars: &[f32] = bytemuck::cast_slice(vectors);
    for f in scalars {
        w.write_all(&f.to_le_bytes())?;
    }
    Ok(())
}

/// Write a count-prefixed array of triangle corner indices.
pub fn write_indices<W: Write>(w: &mut W, indices: &[i32]) -> io::Result<()> {
    w.write_all(&header_for(indices.len())?.to_bytes())?;

    for i in indices {
        w.write_all(&i.to_le_bytes())?;
    }
    Ok(())
}

/// Split a file into its header and record bytes, checking the length
/// matches `count * record_size` exactly.
fn split_records(bytes: &[u8], record_size: usize) -> Result<&[u8], FormatError> {
    let Some(header) = ArrayHeader::from_bytes(bytes) else {
        return Err(FormatError::MissingHeader { found: bytes.len() });
    };
    let body = &bytes[ArrayHeader::SIZE..];
    let expected = header.count as usize * record_size;

    if body.len() < expected {
        return Err(FormatError::Truncated {
            expected,
            found: body.len(),
        });
    }
    if body.len() > expected {
        return Err(FormatError::TrailingBytes {
            extra: body.len() - expected,
        });
    }
    Ok(body)
}

fn le_words(body: &[u8]) -> impl Iterator<Item = [u8; 4]> + '_ {
    body.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]])
}

/// Decode a count-prefixed array of float vectors.
pub fn decode_vectors<const N: usize>(bytes: &[u8]) -> Result<Vec<[f32; N]>, FormatError>
where
    [f32; N]: Pod,
{
    let body = split_records(bytes, N * 4)?;
    let scalars: Vec<f32> = le_words(body).map(f32::from_le_bytes).collect();
    Ok(bytemuck::cast_slice(&scalars).to_vec())
}

/// Decode a count-prefixed array of triangle corner indices.
pub fn decode_indices(bytes: &[u8]) -> Result<Vec<i32>, FormatError> {
    let body = split_records(bytes, 4)?;
    Ok(le_words(body).map(i32::from_le_bytes).collect())
}
