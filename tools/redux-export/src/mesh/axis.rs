//! Coordinate system conversion
//!
//! Authoring tools and the target renderer disagree on which axis is up and
//! on handedness. A conversion is a signed axis permutation: each output
//! component is one input component, optionally negated. Positions and
//! normals take the same remap (a signed permutation is orthogonal, so the
//! inverse-transpose equals the matrix itself).

use std::fmt;
use std::str::FromStr;

use glam::{Mat3, Vec3};
use serde::Deserialize;

use super::types::RawMesh;

/// Signed axis permutation applied to positions and normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct AxisConversion {
    /// Input axis feeding each output component (0 = x, 1 = y, 2 = z)
    source_axis: [usize; 3],
    /// Whether each output component is negated
    negate: [bool; 3],
}

impl AxisConversion {
    /// Blender (Z-up, right-handed) to Unity/KSP (Y-up, left-handed):
    /// `(x, y, z) -> (y, z, -x)`
    pub const BLENDER_TO_UNITY: Self = Self {
        source_axis: [1, 2, 0],
        negate: [false, false, true],
    };

    pub const IDENTITY: Self = Self {
        source_axis: [0, 1, 2],
        negate: [false, false, false],
    };

    /// Build from per-output `(input axis, negate)` pairs.
    ///
    /// Returns `None` unless every input axis is used exactly once.
    pub fn new(mapping: [(usize, bool); 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for &(axis, _) in &mapping {
            if axis > 2 || seen[axis] {
                return None;
            }
            seen[axis] = true;
        }
        Some(Self {
            source_axis: mapping.map(|(axis, _)| axis),
            negate: mapping.map(|(_, negate)| negate),
        })
    }

    /// Row-major matrix equivalent of this remap.
    pub fn matrix(&self) -> Mat3 {
        let row = |i: usize| {
            let mut r = [0.0f32; 3];
            r[self.source_axis[i]] = if self.negate[i] { -1.0 } else { 1.0 };
            Vec3::from_array(r)
        };
        Mat3::from_cols(row(0), row(1), row(2)).transpose()
    }

    /// True when the remap mirrors space, so triangle winding must be reversed
    /// to keep the same faces front-facing.
    pub fn flips_handedness(&self) -> bool {
        self.matrix().determinant() < 0.0
    }

    /// Remap one position or normal. Components are moved, never recomputed,
    /// so values survive bit-for-bit apart from the sign.
    #[inline]
    pub fn apply(&self, v: [f32; 3]) -> [f32; 3] {
        [0, 1, 2].map(|i| {
            let value = v[self.source_axis[i]];
            if self.negate[i] { -value } else { value }
        })
    }

    /// Remap every position and normal of a mesh in place.
    pub fn apply_to_mesh(&self, mesh: &mut RawMesh) {
        for p in &mut mesh.positions {
            *p = self.apply(*p);
        }
        for n in &mut mesh.normals {
            *n = self.apply(*n);
        }
    }
}

impl Default for AxisConversion {
    fn default() -> Self {
        Self::BLENDER_TO_UNITY
    }
}

impl fmt::Display for AxisConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [char; 3] = ['x', 'y', 'z'];
        for i in 0..3 {
            if i > 0 {
                f.write_str(",")?;
            }
            if self.negate[i] {
                f.write_str("-")?;
            }
            write!(f, "{}", NAMES[self.source_axis[i]])?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "invalid axis conversion '{0}': use 'blender-to-unity', 'identity', \
     or a permutation like 'y,z,-x'"
)]
pub struct AxisParseError(String);

impl FromStr for AxisConversion {
    type Err = AxisParseError;

    /// Accepts a preset name or three comma-separated signed axes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "blender-to-unity" | "blender" => return Ok(Self::BLENDER_TO_UNITY),
            "identity" | "none" => return Ok(Self::IDENTITY),
            _ => {}
        }

        let err = || AxisParseError(s.to_string());
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(err());
        }

        let mut mapping = [(0usize, false); 3];
        for (slot, part) in mapping.iter_mut().zip(parts.iter().copied()) {
            let (negate, name) = match part.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, part.strip_prefix('+').unwrap_or(part)),
            };
            let axis = match name {
                "x" | "X" => 0,
                "y" | "Y" => 1,
                "z" | "Z" => 2,
                _ => return Err(err()),
            };
            *slot = (axis, negate);
        }

        Self::new(mapping).ok_or_else(err)
    }
}

impl TryFrom<String> for AxisConversion {
    type Error = AxisParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
