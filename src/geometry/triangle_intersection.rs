// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle-triangle overlap test
//!
//! Each triangle is cut by the plane of the other one. The two resulting
//! segments lie on the line where both planes meet, and the triangles overlap
//! if those segments overlap.

use super::bbox::BoundingSphere;
use super::plane::segment_plane_intersection;
use nalgebra::{Point3, Vector3};

/// Corner positions of one triangle
pub type TriangleCorners = [Point3<f32>; 3];

/// Unnormalized normal, `edge0 x -edge2`
fn triangle_normal(t: &TriangleCorners) -> Vector3<f32> {
    let edge0 = t[1] - t[0];
    let edge2 = t[0] - t[2];
    edge0.cross(&-edge2)
}

/// Split corners into the lone corner and the two others, in index order.
///
/// Returns `None` when all corners are on the same side.
fn split_loner(t: &TriangleCorners, front: [bool; 3]) -> Option<(Point3<f32>, Point3<f32>, Point3<f32>)> {
    if front[0] == front[1] && front[0] == front[2] {
        return None;
    }
    let loner = if front[0] == front[1] {
        2
    } else if front[0] == front[2] {
        1
    } else {
        0
    };
    let rest: Vec<usize> = (0..3).filter(|&i| i != loner).collect();
    Some((t[loner], t[rest[0]], t[rest[1]]))
}

/// Check if two triangles overlap.
///
/// Optional bounding spheres speed up rejection of distant pairs. Touching or
/// coplanar triangles are not reported as overlapping.
pub fn triangles_hit(
    t0: &TriangleCorners,
    t1: &TriangleCorners,
    s0: Option<&BoundingSphere>,
    s1: Option<&BoundingSphere>,
) -> bool {
    // Spheres around v0 reaching both adjacent corners
    let implicit0 = BoundingSphere::around_first_corner(t0);
    let implicit1 = BoundingSphere::around_first_corner(t1);

    if let (Some(a), Some(b)) = (s0, s1) {
        if !a.touches(b) {
            return false;
        }
    }
    if let Some(a) = s0 {
        if !a.touches(&implicit1) {
            return false;
        }
    }
    if let Some(b) = s1 {
        if !implicit0.touches(b) {
            return false;
        }
    }
    if !implicit0.touches(&implicit1) {
        return false;
    }

    let t0_nrm = triangle_normal(t0);
    let t1_nrm = triangle_normal(t1);

    let t0_front = [0, 1, 2].map(|i| t1_nrm.dot(&(t0[i] - t1[0])) > 0.0);
    let t1_front = [0, 1, 2].map(|i| t0_nrm.dot(&(t1[i] - t0[0])) > 0.0);

    // One triangle entirely on one side of the other
    let Some((t0_loner, t0_f0, t0_f1)) = split_loner(t0, t0_front) else {
        return false;
    };
    let Some((t1_loner, t1_f0, t1_f1)) = split_loner(t1, t1_front) else {
        return false;
    };

    let cuts = (
        segment_plane_intersection(&t0_loner, &t0_f0, &t1[0], &t1_nrm),
        segment_plane_intersection(&t0_loner, &t0_f1, &t1[0], &t1_nrm),
        segment_plane_intersection(&t1_loner, &t1_f0, &t0[0], &t0_nrm),
        segment_plane_intersection(&t1_loner, &t1_f1, &t0[0], &t0_nrm),
    );
    let (Ok(t0c0), Ok(t0c1), Ok(t1c0), Ok(t1c1)) = cuts else {
        return false;
    };

    // Find the pair of cut points furthest apart. Earlier pairs win ties.
    let dists = [
        (t0c0 - t0c1).norm(),
        (t1c0 - t1c1).norm(),
        (t0c0 - t1c1).norm(),
        (t0c1 - t1c0).norm(),
        (t0c0 - t1c0).norm(),
        (t0c1 - t1c1).norm(),
    ];
    let mut max_id = 0;
    for (id, &dist) in dists.iter().enumerate().skip(1) {
        if dist > dists[max_id] {
            max_id = id;
        }
    }

    match max_id {
        // One segment contains the other
        0 | 1 => true,
        2 => (t0c0 - t0c1).norm() > (t0c0 - t1c0).norm(),
        3 => (t0c1 - t0c0).norm() > (t0c1 - t1c1).norm(),
        4 => (t0c0 - t0c1).norm() > (t0c0 - t1c1).norm(),
        _ => (t0c1 - t0c0).norm() > (t0c1 - t1c0).norm(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> TriangleCorners {
        [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(-1.0, 2.0, 0.0),
        ]
    }

    fn vertical(x_offset: f32) -> TriangleCorners {
        [
            Point3::new(x_offset, 0.0, -1.0),
            Point3::new(x_offset, 0.0, 1.0),
            Point3::new(x_offset, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_crossing_triangles_hit() {
        assert!(triangles_hit(&horizontal(), &vertical(0.0), None, None));
        assert!(triangles_hit(&vertical(0.0), &horizontal(), None, None));
    }

    #[test]
    fn test_separated_triangles_miss() {
        let far = vertical(10.0);
        assert!(!triangles_hit(&horizontal(), &far, None, None));
        assert!(!triangles_hit(&far, &horizontal(), None, None));
    }

    #[test]
    fn test_triangle_on_one_side_misses() {
        let above = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
        ];
        assert!(!triangles_hit(&horizontal(), &above, None, None));
    }

    #[test]
    fn test_plane_crossing_but_disjoint() {
        // Crosses the plane of the horizontal triangle outside of it
        let beside = vertical(1.8);
        let shifted: TriangleCorners = beside.map(|p| p + Vector3::new(0.0, 1.5, 0.0));
        assert!(!triangles_hit(&horizontal(), &shifted, None, None));
    }

    #[test]
    fn test_bounding_spheres_reject() {
        let s0 = BoundingSphere::new(Point3::new(0.0, 0.0, 0.0), 0.1);
        let s1 = BoundingSphere::new(Point3::new(5.0, 0.0, 0.0), 0.1);
        assert!(!triangles_hit(&horizontal(), &vertical(0.0), Some(&s0), Some(&s1)));
    }
}
