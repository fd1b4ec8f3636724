//! Wavefront OBJ text adapter
//!
//! Recognized records: `v x y z`, `vn x y z`, `vt u v`, `f c1 c2 c3 ...`.
//! Corner tokens are `p`, `p/t`, `p/t/n` or `p//n` with 1-based indices;
//! negative indices count back from the last record declared so far. All
//! other record kinds (`o`, `g`, `s`, `usemtl`, `mtllib`, ...) are ignored.
//!
//! A malformed record is skipped with a [`SourceWarning`] and parsing
//! continues. Corners that omit a UV or normal index fall back to the
//! position index when the file declares enough UVs/normals, which keeps
//! exports from tools that write position-aligned attribute arrays working.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::{Corner, Face, RawMesh, SourceLocation, SourceWarning};
use crate::error::ConvertError;

/// Parse an OBJ file. Only I/O failures are fatal here; emptiness is checked
/// by the caller.
pub fn parse_obj_file(
    path: &Path,
    warnings: &mut Vec<SourceWarning>,
) -> Result<RawMesh, ConvertError> {
    let io_err = |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    let mut parser = ObjParser::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(io_err)? == 0 {
            break;
        }
        line_no += 1;
        // Stray non-UTF-8 bytes (usually in comments) must not abort the parse
        parser.feed_line(line_no, &String::from_utf8_lossy(&buf), warnings);
    }

    Ok(parser.finish(warnings))
}

/// Parse OBJ text already in memory.
pub fn parse_obj_str(text: &str, warnings: &mut Vec<SourceWarning>) -> RawMesh {
    let mut parser = ObjParser::default();
    for (i, line) in text.lines().enumerate() {
        parser.feed_line(i + 1, line, warnings);
    }
    parser.finish(warnings)
}

/// Face as parsed, before index range checks.
struct PendingFace {
    line: usize,
    corners: Vec<Corner>,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    faces: Vec<PendingFace>,
}

impl ObjParser {
    fn feed_line(&mut self, line_no: usize, line: &str, warnings: &mut Vec<SourceWarning>) {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            return;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let result = match parts[0] {
            "v" => parse_floats::<3>(&parts[1..]).map(|p| self.positions.push(p)),
            "vn" => parse_floats::<3>(&parts[1..]).map(|n| self.normals.push(n)),
            "vt" => parse_floats::<2>(&parts[1..]).map(|t| self.uvs.push(t)),
            "f" => self.parse_face(&parts[1..]).map(|corners| {
                self.faces.push(PendingFace {
                    line: line_no,
                    corners,
                })
            }),
            _ => Ok(()),
        };

        if let Err(message) = result {
            let warning = SourceWarning::new(
                SourceLocation::Line(line_no),
                format!("{message} in '{}'", truncate(line, 50)),
            );
            tracing::warn!("Skipping malformed record at {}", warning);
            warnings.push(warning);
        }
    }

    fn parse_face(&self, tokens: &[&str]) -> Result<Vec<Corner>, String> {
        if tokens.len() < 3 {
            return Err(format!("face has {} corners, need at least 3", tokens.len()));
        }
        tokens.iter().map(|t| self.parse_corner(t)).collect()
    }

    /// Parse `p`, `p/t`, `p/t/n` or `p//n` into 0-based indices.
    fn parse_corner(&self, token: &str) -> Result<Corner, String> {
        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() > 3 {
            return Err(format!("corner '{token}' has too many components"));
        }

        let optional = |i: usize, declared: usize| -> Result<Option<u32>, String> {
            match parts.get(i) {
                Some(s) if !s.is_empty() => resolve_index(s, declared).map(Some),
                _ => Ok(None),
            }
        };

        let position = match parts[0] {
            "" => return Err(format!("corner '{token}' has no position index")),
            s => resolve_index(s, self.positions.len())?,
        };
        let uv = optional(1, self.uvs.len())?;
        let normal = optional(2, self.normals.len())?;

        Ok(Corner::new(position, normal, uv))
    }

    /// Range-check faces and fill in position-aligned attributes.
    fn finish(mut self, warnings: &mut Vec<SourceWarning>) -> RawMesh {
        let pending_faces = std::mem::take(&mut self.faces);
        let mut faces = Vec::with_capacity(pending_faces.len());
        let mut aligned = 0usize;

        for pending in pending_faces {
            let location = SourceLocation::Line(pending.line);
            if let Err(message) = self.check_ranges(&pending.corners) {
                let warning = SourceWarning::new(location, message);
                tracing::warn!("Skipping face at {}", warning);
                warnings.push(warning);
                continue;
            }

            let corners = pending
                .corners
                .into_iter()
                .map(|mut c| {
                    let p = c.position as usize;
                    if c.uv.is_none() && p < self.uvs.len() {
                        c.uv = Some(c.position);
                        aligned += 1;
                    }
                    if c.normal.is_none() && p < self.normals.len() {
                        c.normal = Some(c.position);
                        aligned += 1;
                    }
                    c
                })
                .collect();
            faces.push(Face { corners, location });
        }

        if aligned > 0 {
            tracing::debug!(
                "{} corner attributes resolved by position alignment",
                aligned
            );
        }
        tracing::debug!(
            "Loaded {} positions, {} normals, {} UVs, {} faces",
            self.positions.len(),
            self.normals.len(),
            self.uvs.len(),
            faces.len()
        );

        RawMesh {
            positions: self.positions,
            normals: self.normals,
            uvs: self.uvs,
            faces,
        }
    }

    fn check_ranges(&self, corners: &[Corner]) -> Result<(), String> {
        let check = |kind: &str, index: Option<u32>, declared: usize| match index {
            Some(i) if i as usize >= declared => Err(format!(
                "{kind} index {} out of range ({declared} declared)",
                i as u64 + 1
            )),
            _ => Ok(()),
        };

        for c in corners {
            check("position", Some(c.position), self.positions.len())?;
            check("uv", c.uv, self.uvs.len())?;
            check("normal", c.normal, self.normals.len())?;
        }
        Ok(())
    }
}

fn parse_floats<const N: usize>(tokens: &[&str]) -> Result<[f32; N], String> {
    if tokens.len() < N {
        return Err(format!("expected {N} components, found {}", tokens.len()));
    }

    let mut out = [0.0f32; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| format!("non-numeric component '{token}'"))?;
    }
    Ok(out)
}

/// Convert a 1-based (or negative, relative) OBJ index to 0-based.
fn resolve_index(token: &str, declared: usize) -> Result<u32, String> {
    let raw: i64 = token
        .parse()
        .map_err(|_| format!("non-numeric index '{token}'"))?;

    let resolved = match raw {
        0 => return Err("index 0 is invalid (indices are 1-based)".to_string()),
        n if n > 0 => n - 1,
        n => declared as i64 + n,
    };

    u32::try_from(resolved).map_err(|_| format!("index {raw} out of range"))
}

fn truncate(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}
