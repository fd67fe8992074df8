// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vector and plane primitives
//!
//! Distances returned by [`distance_to_plane`] are measured in lengths of the
//! plane normal. Normalize the normal first to get distances in world units.

use crate::error::GeometryError;
use crate::utils::math::angle_between;
use nalgebra::{Point2, Point3, Vector3};

/// Allowed slack of the segment parameter at both ends
const SEGMENT_PARAM_TOLERANCE: f32 = 0.001;

/// Result of a ray hitting a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Point3<f32>,
    /// Unnormalized normal of the triangle that was hit
    pub normal: Vector3<f32>,
}

/// Signed distance from `point` to the plane, negative behind the plane
pub fn distance_to_plane(
    point: &Point3<f32>,
    plane_pos: &Point3<f32>,
    plane_normal: &Vector3<f32>,
) -> Result<f32, GeometryError> {
    let dp_nn = plane_normal.dot(plane_normal);
    if dp_nn == 0.0 {
        return Err(GeometryError::ZeroNormal);
    }
    Ok((plane_normal.dot(&point.coords) - plane_normal.dot(&plane_pos.coords)) / dp_nn)
}

/// Parameter `t` where `a + (b - a) * t` meets the plane, without range checks
pub fn segment_plane_parameter(
    a: &Point3<f32>,
    b: &Point3<f32>,
    plane_pos: &Point3<f32>,
    plane_normal: &Vector3<f32>,
) -> Result<f32, GeometryError> {
    let dp = plane_normal.dot(&(b - a));
    if dp == 0.0 {
        return Err(GeometryError::ParallelSegment);
    }
    Ok((plane_pos.coords.dot(plane_normal) - a.coords.dot(plane_normal)) / dp)
}

/// Point where segment `a`-`b` crosses the plane.
///
/// The segment must straddle the plane. A parameter slightly outside of
/// `[0, 1]` is accepted to absorb round-off at the segment ends.
pub fn segment_plane_intersection(
    a: &Point3<f32>,
    b: &Point3<f32>,
    plane_pos: &Point3<f32>,
    plane_normal: &Vector3<f32>,
) -> Result<Point3<f32>, GeometryError> {
    if a == b {
        return Err(GeometryError::ZeroLengthSegment);
    }
    if plane_normal.norm() == 0.0 {
        return Err(GeometryError::ZeroNormal);
    }
    let side_a = plane_normal.dot(&(a - plane_pos));
    let side_b = plane_normal.dot(&(b - plane_pos));
    if (side_a > 0.0 && side_b > 0.0) || (side_a < 0.0 && side_b < 0.0) {
        return Err(GeometryError::NoStraddle);
    }
    let t = segment_plane_parameter(a, b, plane_pos, plane_normal)?;
    if t <= -SEGMENT_PARAM_TOLERANCE || t >= 1.0 + SEGMENT_PARAM_TOLERANCE {
        return Err(GeometryError::ParameterOutOfRange(t));
    }
    Ok(a + (b - a) * t)
}

/// Express `pos` in the 2D basis spanned by `x_axis` and `y_axis`
pub fn transform_point_to_triangle_space(
    pos: &Vector3<f32>,
    x_axis: &Vector3<f32>,
    y_axis: &Vector3<f32>,
) -> Result<Point2<f32>, GeometryError> {
    // Perpendicular to y_axis inside the plane
    let helper = x_axis.cross(y_axis).cross(y_axis);
    let dp_xh = x_axis.dot(&helper);
    if dp_xh == 0.0 {
        return Err(GeometryError::DegenerateAxes);
    }
    let x = pos.dot(&helper) / dp_xh;

    let y_abs = y_axis.abs();
    let axis = if y_abs.x > y_abs.y && y_abs.x > y_abs.z {
        0
    } else if y_abs.y > y_abs.z {
        1
    } else {
        2
    };
    if y_axis[axis] == 0.0 {
        return Err(GeometryError::DegenerateAxes);
    }
    let y = (pos[axis] - x * x_axis[axis]) / y_axis[axis];
    Ok(Point2::new(x, y))
}

/// Cast a ray against triangle `v0`, `v1`, `v2`.
///
/// Returns `None` if the ray is parallel to the triangle, the triangle is
/// behind the origin, or the hit falls outside the triangle by more than
/// `tolerance` (in barycentric units).
pub fn ray_hits_triangle(
    origin: &Point3<f32>,
    dir: &Vector3<f32>,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
    tolerance: f32,
) -> Option<RayHit> {
    let edge0 = v1 - v0;
    let edge1 = v2 - v0;
    let normal = edge0.cross(&edge1);

    let dp_dir_n = dir.dot(&normal);
    if dp_dir_n == 0.0 {
        return None;
    }
    let m = (v0.coords.dot(&normal) - origin.coords.dot(&normal)) / dp_dir_n;
    if m < 0.0 {
        return None;
    }

    let point = origin + dir * m;
    let local = transform_point_to_triangle_space(&(point - v0), &edge0, &edge1).ok()?;
    if local.x < -tolerance || local.y < -tolerance || local.x + local.y > 1.0 + tolerance {
        return None;
    }

    Some(RayHit { point, normal })
}

/// Check if two line segments on the same plane cross each other.
///
/// The result is unreliable for segments that are not coplanar.
pub fn linesegments_intersect_at_plane(
    ls0_begin: &Point3<f32>,
    ls0_end: &Point3<f32>,
    ls1_begin: &Point3<f32>,
    ls1_end: &Point3<f32>,
) -> bool {
    let separated = |base: &Point3<f32>, tip: &Point3<f32>, p: &Point3<f32>, q: &Point3<f32>| {
        let dir = tip - base;
        let c0 = dir.cross(&(q - base));
        let c1 = dir.cross(&(p - base));
        let sum = (c0 + c1).norm();
        c0.norm() < sum && c1.norm() < sum
    };
    if separated(ls0_begin, ls0_end, ls1_begin, ls1_end) {
        return false;
    }
    !separated(ls1_begin, ls1_end, ls0_begin, ls0_end)
}

/// Angle from `v1` to `v2` in degrees, measured around `plane_normal`.
///
/// The result is in `[0, 360)`. Returns `None` for zero length vectors.
pub fn angle_at_plane(
    v1: &Vector3<f32>,
    v2: &Vector3<f32>,
    plane_normal: &Vector3<f32>,
) -> Option<f32> {
    let raw = angle_between(v1, v2)?;
    if plane_normal.dot(&v1.cross(v2)) < 0.0 {
        Some(360.0 - raw)
    } else {
        Some(raw)
    }
}

/// A vector perpendicular to `v`
pub fn perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    if v.x.abs() < v.y.abs() {
        Vector3::new(0.0, v.z, -v.y)
    } else {
        Vector3::new(-v.z, 0.0, v.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_to_plane() {
        let pos = Point3::new(0.0, 0.0, 1.0);
        let n = Vector3::new(0.0, 0.0, 1.0);
        let d = distance_to_plane(&Point3::new(5.0, 3.0, 3.0), &pos, &n).unwrap();
        assert_relative_eq!(d, 2.0);
        let d = distance_to_plane(&Point3::new(0.0, 0.0, 0.0), &pos, &n).unwrap();
        assert_relative_eq!(d, -1.0);
    }

    #[test]
    fn test_distance_scaled_by_normal_length() {
        let pos = Point3::origin();
        let n = Vector3::new(0.0, 2.0, 0.0);
        let d = distance_to_plane(&Point3::new(0.0, 4.0, 0.0), &pos, &n).unwrap();
        assert_relative_eq!(d, 2.0);
    }

    #[test]
    fn test_distance_zero_normal() {
        let result = distance_to_plane(&Point3::origin(), &Point3::origin(), &Vector3::zeros());
        assert_eq!(result, Err(GeometryError::ZeroNormal));
    }

    #[test]
    fn test_segment_plane_intersection() {
        let a = Point3::new(1.0, 1.0, -1.0);
        let b = Point3::new(1.0, 1.0, 3.0);
        let p = segment_plane_intersection(&a, &b, &Point3::origin(), &Vector3::z()).unwrap();
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_segment_plane_no_straddle() {
        let a = Point3::new(0.0, 0.0, 1.0);
        let b = Point3::new(0.0, 0.0, 2.0);
        let result = segment_plane_intersection(&a, &b, &Point3::origin(), &Vector3::z());
        assert_eq!(result, Err(GeometryError::NoStraddle));
    }

    #[test]
    fn test_segment_plane_endpoint_on_plane() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 0.0, 2.0);
        let p = segment_plane_intersection(&a, &b, &Point3::origin(), &Vector3::z()).unwrap();
        assert_relative_eq!(p, a);
    }

    #[test]
    fn test_transform_point_to_triangle_space() {
        let x = Vector3::new(2.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 4.0, 0.0);
        let p = transform_point_to_triangle_space(&Vector3::new(1.0, 1.0, 0.0), &x, &y).unwrap();
        assert_relative_eq!(p.x, 0.5);
        assert_relative_eq!(p.y, 0.25);
    }

    #[test]
    fn test_ray_hits_triangle() {
        let v0 = Point3::new(0.0, 0.0, 0.0);
        let v1 = Point3::new(1.0, 0.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);
        let origin = Point3::new(0.25, 0.25, 5.0);
        let hit = ray_hits_triangle(&origin, &-Vector3::z(), &v0, &v1, &v2, 0.0).unwrap();
        assert_relative_eq!(hit.point, Point3::new(0.25, 0.25, 0.0));
        assert!(hit.normal.z > 0.0);

        // Pointing away
        assert!(ray_hits_triangle(&origin, &Vector3::z(), &v0, &v1, &v2, 0.0).is_none());
        // Outside of triangle
        let outside = Point3::new(0.8, 0.8, 5.0);
        assert!(ray_hits_triangle(&outside, &-Vector3::z(), &v0, &v1, &v2, 0.0).is_none());
        // Parallel
        assert!(ray_hits_triangle(&origin, &Vector3::x(), &v0, &v1, &v2, 0.0).is_none());
    }

    #[test]
    fn test_linesegments_intersect_at_plane() {
        let a0 = Point3::new(0.0, 0.0, 0.0);
        let a1 = Point3::new(2.0, 2.0, 0.0);
        let b0 = Point3::new(0.0, 2.0, 0.0);
        let b1 = Point3::new(2.0, 0.0, 0.0);
        assert!(linesegments_intersect_at_plane(&a0, &a1, &b0, &b1));

        let c0 = Point3::new(3.0, 0.0, 0.0);
        let c1 = Point3::new(3.0, 2.0, 0.0);
        assert!(!linesegments_intersect_at_plane(&a0, &a1, &c0, &c1));
    }

    #[test]
    fn test_angle_at_plane() {
        let n = Vector3::z();
        let x = Vector3::x();
        let y = Vector3::y();
        assert_relative_eq!(angle_at_plane(&x, &y, &n).unwrap(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(angle_at_plane(&y, &x, &n).unwrap(), 270.0, epsilon = 1e-4);
        assert!(angle_at_plane(&x, &Vector3::zeros(), &n).is_none());
    }

    #[test]
    fn test_perpendicular() {
        for v in [Vector3::x(), Vector3::y(), Vector3::z(), Vector3::new(1.0, 2.0, 3.0)] {
            let p = perpendicular(&v);
            assert!(p.norm() > 0.0);
            assert_relative_eq!(p.dot(&v), 0.0);
        }
    }
}
