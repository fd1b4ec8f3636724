//! Polygon to triangle decomposition
//!
//! Fan triangulation is the default and assumes convex, planar faces: a
//! concave n-gon is split without error but produces overlapping or
//! inverted triangles. Ear clipping handles simple concave polygons at a
//! higher cost and is selected with [`Triangulation::EarClip`].

use glam::Vec3;
use serde::Deserialize;

use super::types::{Corner, Face, SourceWarning, Triangle};

/// How faces with more than three corners are split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Triangulation {
    /// Fan around the first corner. Requires convex faces.
    #[default]
    Fan,
    /// Ear clipping on the face plane. Falls back to a fan when stuck.
    EarClip,
}

/// Fan-triangulate a polygon: `(c0, c1, c2), (c0, c2, c3), ...`.
///
/// Returns `corners.len() - 2` triangles, or none for fewer than 3 corners.
pub fn fan_triangulate(corners: &[Corner]) -> Vec<Triangle> {
    if corners.len() < 3 {
        return Vec::new();
    }
    (1..corners.len() - 1)
        .map(|i| [corners[0], corners[i], corners[i + 1]])
        .collect()
}

/// Triangulate one face in source winding order.
///
/// Faces with fewer than 3 corners are rejected.
pub fn triangulate_face(
    face: &Face,
    positions: &[[f32; 3]],
    mode: Triangulation,
) -> Result<Vec<Triangle>, SourceWarning> {
    let corners = &face.corners;
    if corners.len() < 3 {
        return Err(SourceWarning::new(
            face.location,
            format!("degenerate face with {} corners", corners.len()),
        ));
    }

    match mode {
        Triangulation::Fan => Ok(fan_triangulate(corners)),
        Triangulation::EarClip if corners.len() == 3 => Ok(fan_triangulate(corners)),
        Triangulation::EarClip => Ok(ear_clip(corners, positions)),
    }
}

/// Ear clipping over the polygon's Newell plane.
fn ear_clip(corners: &[Corner], positions: &[[f32; 3]]) -> Vec<Triangle> {
    let points: Vec<Vec3> = corners
        .iter()
        .map(|c| Vec3::from_array(positions[c.position as usize]))
        .collect();

    let normal = newell_normal(&points);
    let mut remaining: Vec<usize> = (0..corners.len()).collect();
    let mut triangles = Vec::with_capacity(corners.len() - 2);

    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = (0..n).find(|&i| {
            let prev = remaining[(i + n - 1) % n];
            let next = remaining[(i + 1) % n];
            is_ear(&points, &remaining, prev, remaining[i], next, normal)
        });

        let Some(i) = ear else {
            tracing::debug!(
                "Ear clipping stuck with {} corners remaining, using fan triangulation",
                n
            );
            break;
        };

        let prev = remaining[(i + n - 1) % n];
        let next = remaining[(i + 1) % n];
        triangles.push([corners[prev], corners[remaining[i]], corners[next]]);
        remaining.remove(i);
    }

    // Last triangle, or the fan fallback for whatever could not be clipped
    let rest: Vec<Corner> = remaining.iter().map(|&i| corners[i]).collect();
    triangles.extend(fan_triangulate(&rest));
    triangles
}

/// Polygon normal by Newell's method. Robust for slightly non-planar input;
/// its length is twice the polygon area.
fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        normal += p.cross(points[(i + 1) % points.len()]);
    }
    normal
}

fn is_ear(
    points: &[Vec3],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    normal: Vec3,
) -> bool {
    let a = points[prev];
    let b = points[curr];
    let c = points[next];

    // Convex corner: triangle normal agrees with the polygon normal
    if (b - a).cross(c - a).dot(normal) <= 0.0 {
        return false;
    }

    // No other remaining corner inside (or on) the candidate triangle
    remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .all(|&idx| !point_in_triangle(points[idx], a, b, c, normal))
}

fn point_in_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> bool {
    let side = |from: Vec3, to: Vec3| (to - from).cross(p - from).dot(normal) >= 0.0;
    side(a, b) && side(b, c) && side(c, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::types::SourceLocation;

    fn corners(n: u32) -> Vec<Corner> {
        (0..n).map(Corner::position_only).collect()
    }

    fn positions_of(tris: &[Triangle]) -> Vec<[u32; 3]> {
        tris.iter()
            .map(|t| [t[0].position, t[1].position, t[2].position])
            .collect()
    }

    fn face(n: u32) -> Face {
        Face {
            corners: corners(n),
            location: SourceLocation::Line(7),
        }
    }

    #[test]
    fn test_fan_triangle_passthrough() {
        assert_eq!(positions_of(&fan_triangulate(&corners(3))), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_fan_quad() {
        assert_eq!(
            positions_of(&fan_triangulate(&corners(4))),
            vec![[0, 1, 2], [0, 2, 3]]
        );
    }

    #[test]
    fn test_fan_ngon_count() {
        for n in 3..12 {
            assert_eq!(fan_triangulate(&corners(n)).len(), n as usize - 2);
        }
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let err = triangulate_face(&face(2), &[[0.0; 3]; 2], Triangulation::Fan).unwrap_err();
        assert_eq!(err.location, SourceLocation::Line(7));
        assert!(err.message.contains("2 corners"));
    }

    /// Counter-clockwise pentagon in the XY plane: a 4x4 square with a
    /// triangular notch cut down from the top edge to the reflex corner 3.
    fn arrow() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 4.0, 0.0],
        ]
    }

    fn signed_area_z(tri: &[u32; 3], positions: &[[f32; 3]]) -> f32 {
        let [a, b, c] = tri.map(|i| Vec3::from_array(positions[i as usize]));
        (b - a).cross(c - a).z
    }

    #[test]
    fn test_ear_clip_concave_keeps_winding() {
        let positions = arrow();
        let tris = triangulate_face(&face(5), &positions, Triangulation::EarClip).unwrap();
        assert_eq!(tris.len(), 3);

        // Every triangle faces +Z like the polygon itself
        for tri in positions_of(&tris) {
            assert!(signed_area_z(&tri, &positions) > 0.0, "{tri:?} is inverted");
        }

        // Total area matches the polygon (16 - 6 = 10 for the notch)
        let area: f32 = positions_of(&tris)
            .iter()
            .map(|t| signed_area_z(t, &positions) * 0.5)
            .sum();
        assert!((area - 10.0).abs() < 1e-5, "area {area}");
    }

    #[test]
    fn test_fan_on_concave_produces_inverted_triangle() {
        // Known limitation: corner 0 cannot see the whole polygon, so the
        // fan (0, 2, 3) comes out back-facing.
        let positions = arrow();
        let tris = fan_triangulate(&corners(5));
        assert!(
            positions_of(&tris)
                .iter()
                .any(|t| signed_area_z(t, &positions) <= 0.0)
        );
    }

    #[test]
    fn test_ear_clip_convex_matches_count() {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.5, 1.0, 0.0],
            [0.5, 2.0, 0.0],
            [-0.5, 1.0, 0.0],
        ];
        let tris = triangulate_face(&face(5), &positions, Triangulation::EarClip).unwrap();
        assert_eq!(tris.len(), 3);
    }
}
