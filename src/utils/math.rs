// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::Vector3;

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate two equally sized component lists (UVs, weights)
pub fn lerp_components(a: &[f32], b: &[f32], t: f32) -> Vec<f32> {
    a.iter().zip(b).map(|(&x, &y)| lerp(x, y, t)).collect()
}

/// Convert radians to degrees
pub fn rad_to_deg(rad: f32) -> f32 {
    rad * 180.0 / std::f32::consts::PI
}

/// Unsigned angle between two vectors in degrees, `None` if either is zero
pub fn angle_between(v1: &Vector3<f32>, v2: &Vector3<f32>) -> Option<f32> {
    let len = v1.norm() * v2.norm();
    if len == 0.0 {
        return None;
    }
    let cos = (v1.dot(v2) / len).clamp(-1.0, 1.0);
    Some(rad_to_deg(cos.acos()))
}

/// Squared euclidean distance between two component lists
pub fn squared_difference(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
