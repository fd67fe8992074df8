// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Hole triangulation by ear clipping

use crate::error::CutError;
use crate::geometry::mesh::{Triangle, Uv, Vertex};
use crate::geometry::plane::{angle_at_plane, transform_point_to_triangle_space};
use nalgebra::Vector3;

/// Extra angle kept free around a new edge, relaxed one degree at a time
const EAR_MARGIN_DEGREES: u8 = 15;

/// Appearance of cap faces
#[derive(Debug, Clone)]
pub(super) struct CapStyle {
    /// Direction the cap faces point to
    pub normal: Vector3<f32>,
    pub smooth: bool,
    pub u_axis: Vector3<f32>,
    pub v_axis: Vector3<f32>,
    /// UV layout of the submesh receiving the cap
    pub layout: Vec<u8>,
}

impl CapStyle {
    /// Cap triangle with planar-projected UVs
    fn triangle(&self, indices: [usize; 3], vertices: &[Vertex]) -> Result<Triangle, CutError> {
        let p = indices.map(|i| vertices[i].position);
        if (p[1] - p[0]).cross(&(p[2] - p[0])).dot(&self.normal) <= 0.0 {
            return Err(CutError::UnfillableHole);
        }

        let mut projected = Vec::with_capacity(3);
        for pos in &p {
            let uv = transform_point_to_triangle_space(&pos.coords, &self.u_axis, &self.v_axis)
                .map_err(|_| CutError::UnfillableHole)?;
            projected.push(uv);
        }
        let uvs = self
            .layout
            .iter()
            .map(|&comps| {
                [0, 1, 2].map(|c| -> Uv {
                    let mut uv = vec![0.0; comps as usize];
                    for (dst, src) in uv.iter_mut().zip([projected[c].x, projected[c].y]) {
                        *dst = src;
                    }
                    uv
                })
            })
            .collect();

        Ok(Triangle::with_uvs(indices, uvs, self.smooth))
    }
}

/// Remove `X, Y, X` dead ends and `X, X` doubles from a closed path
pub(super) fn remove_thin_dead_ends(path: &mut Vec<usize>) {
    if path.len() <= 3 {
        return;
    }
    let mut i = 0;
    while i < path.len() {
        let len = path.len();
        let prev = path[(i + len - 1) % len];
        let next = path[(i + 1) % len];
        if prev == path[i] || prev == next {
            path.remove(i);
            if i == path.len() {
                i = i.saturating_sub(1);
            }
        } else {
            i += 1;
        }
    }
}

/// Corner whose ear gives the best new triangle, if any.
///
/// An ear must not contain other corners of the hole and must have an
/// interior angle below 180 degrees. Among valid ears the sharpest wins.
fn find_ear(hole: &[usize], vertices: &[Vertex], normal: &Vector3<f32>) -> Option<usize> {
    let len = hole.len();
    let pos = |i: usize| vertices[hole[i]].position;

    for margin in (0..=EAR_MARGIN_DEGREES).rev() {
        let margin = f32::from(margin);
        let mut best = None;
        let mut best_angle = f32::MAX;

        for point in 0..len {
            let (prev_id, next_id) = ((point + len - 1) % len, (point + 1) % len);
            let (this, next, prev) = (pos(point), pos(next_id), pos(prev_id));
            let to_next = next - this;
            let to_prev = prev - this;
            let new_edge = next - prev;

            let (Some(next_min), Some(prev_min)) = (
                angle_at_plane(&-new_edge, &-to_next, normal),
                angle_at_plane(&-to_prev, &new_edge, normal),
            ) else {
                continue;
            };
            let (next_min, prev_min) = (next_min + margin, prev_min + margin);

            let encloses_other = hole.iter().any(|&check| {
                if check == hole[point] || check == hole[next_id] || check == hole[prev_id] {
                    return false;
                }
                let check_pos = vertices[check].position;
                let next_to_check = check_pos - next;
                let prev_to_check = check_pos - prev;
                if next_to_check.norm() == 0.0 || prev_to_check.norm() == 0.0 {
                    return false;
                }
                let inside_next = angle_at_plane(&next_to_check, &-to_next, normal)
                    .map_or(false, |a| a < next_min);
                let inside_prev = angle_at_plane(&-to_prev, &prev_to_check, normal)
                    .map_or(false, |a| a < prev_min);
                inside_next && inside_prev
            });
            if encloses_other {
                continue;
            }

            let Some(angle) = angle_at_plane(&to_next, &to_prev, normal) else {
                continue;
            };
            if angle < 180.0 && angle < best_angle {
                best = Some(point);
                best_angle = angle;
            }
        }

        if best.is_some() {
            return best;
        }
    }
    None
}

/// Triangulate one hole into cap faces
pub(super) fn fill_hole(
    mut hole: Vec<usize>,
    vertices: &[Vertex],
    cap: &CapStyle,
) -> Result<Vec<Triangle>, CutError> {
    let mut triangles = Vec::with_capacity(hole.len().saturating_sub(2));
    while hole.len() >= 3 {
        remove_thin_dead_ends(&mut hole);
        if hole.len() < 3 {
            break;
        }
        let len = hole.len();
        let ear = find_ear(&hole, vertices, &cap.normal).ok_or(CutError::UnfillableHole)?;
        let indices = [hole[(ear + len - 1) % len], hole[ear], hole[(ear + 1) % len]];
        triangles.push(cap.triangle(indices, vertices)?);
        hole.remove(ear);
    }
    Ok(triangles)
}
