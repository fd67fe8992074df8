// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Slicing of triangles against the cut plane
//!
//! Every triangle is classified by the side of its corners and replaced by
//! the part in front of the plane. Vertices of the result are collected
//! into a fresh list where nearly identical vertices are shared.

use crate::config::Tolerances;
use crate::error::{CutError, MeshError};
use crate::geometry::mesh::{Mesh, Submesh, Triangle, Uv, Vertex};
use crate::geometry::plane::distance_to_plane;
use crate::utils::math::lerp_components;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

/// How a triangle relates to the cut plane, after rotating its corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrianglePattern {
    /// All corners behind the plane
    Dropped,
    /// All corners in front of the plane
    Kept,
    /// Corner 0 on the plane, corner 1 behind and corner 2 in front
    ApexBeforeKept,
    /// Corner 0 on the plane, corner 1 in front and corner 2 behind
    ApexAfterKept,
    /// Corner 0 in front, the others behind
    OneKept,
    /// Corners 0 and 1 in front, corner 2 behind
    TwoKept,
}

impl TrianglePattern {
    /// Find the pattern and the rotation that makes it match
    pub fn classify(kept: [bool; 3], on_plane: [bool; 3]) -> Option<(TrianglePattern, usize)> {
        if kept.iter().all(|&k| !k) {
            return Some((TrianglePattern::Dropped, 0));
        }
        if kept.iter().all(|&k| k) {
            return Some((TrianglePattern::Kept, 0));
        }
        let at = |r: usize, c: usize| (r + c) % 3;
        for r in 0..3 {
            let apex = on_plane[at(r, 0)] && !on_plane[at(r, 1)] && !on_plane[at(r, 2)];
            if apex && !kept[at(r, 1)] && kept[at(r, 2)] {
                return Some((TrianglePattern::ApexBeforeKept, r));
            }
            if apex && kept[at(r, 1)] && !kept[at(r, 2)] {
                return Some((TrianglePattern::ApexAfterKept, r));
            }
        }
        for r in 0..3 {
            let k = [kept[at(r, 0)], kept[at(r, 1)], kept[at(r, 2)]];
            match k {
                [true, false, false] => return Some((TrianglePattern::OneKept, r)),
                [true, true, false] => return Some((TrianglePattern::TwoKept, r)),
                _ => {}
            }
        }
        None
    }
}

/// Kept part of the mesh before the cap is added
#[derive(Debug, Default)]
pub(super) struct Slices {
    pub vertices: Vec<Vertex>,
    pub submeshes: Vec<Submesh>,
    pub kept: usize,
    pub split: usize,
    pub dropped: usize,
}

/// Corner of a triangle being sliced
#[derive(Debug, Clone)]
struct Corner {
    vertex: Vertex,
    uvs: Vec<Uv>,
}

struct Slicer<'a> {
    position: Point3<f32>,
    normal: Vector3<f32>,
    tolerances: &'a Tolerances,
    vertices: Vec<Vertex>,
}

impl<'a> Slicer<'a> {
    /// Index of a vertex in the new list, reusing a nearly identical one
    fn find_near_vertex(&mut self, vertex: &Vertex) -> usize {
        let max_diff = self.tolerances.near_vertex * self.tolerances.near_vertex;
        let mut nearest: Option<(usize, f32)> = None;
        for (i, other) in self.vertices.iter().enumerate() {
            if !vertex.same_groups(other) {
                continue;
            }
            let weights: f32 = vertex
                .groups
                .iter()
                .zip(other.groups.values())
                .map(|((_, a), b)| (a - b) * (a - b))
                .sum();
            let diff = weights + (vertex.position - other.position).norm_squared();
            if diff <= max_diff && nearest.map_or(true, |(_, best)| diff < best) {
                nearest = Some((i, diff));
            }
        }
        match nearest {
            Some((i, _)) => i,
            None => {
                self.vertices.push(vertex.clone());
                self.vertices.len() - 1
            }
        }
    }

    fn snap(&self, weight: f32) -> f32 {
        let snap = self.tolerances.cut_param_snap;
        if weight < 0.0 && weight >= -snap {
            0.0
        } else if weight > 1.0 && weight <= 1.0 + snap {
            1.0
        } else {
            weight
        }
    }

    /// Point where the edge from `a` to `b` meets the plane
    fn cut_point(&self, a: &Corner, b: &Corner) -> Result<Corner, CutError> {
        let n = &self.normal;
        let pa = a.vertex.position;
        let pb = b.vertex.position;
        let d = n.dot(&(pb - pa));
        if d == 0.0 {
            return Err(CutError::MissedCutPoint);
        }
        let plane_dp = n.dot(&self.position.coords);

        let mut weight = self.snap((plane_dp - n.dot(&pa.coords)) / d);
        if !(0.0..=1.0).contains(&weight) {
            // Retry measuring from the other end
            weight = self.snap(1.0 + (plane_dp - n.dot(&pb.coords)) / d);
        }
        if !(0.0..=1.0).contains(&weight) {
            let depth = |p: &Point3<f32>| distance_to_plane(p, &self.position, n).map(f32::abs);
            let limit = self.tolerances.cut_depth_fallback;
            if depth(&pa).map_err(MeshError::from)? <= limit {
                weight = 0.0;
            } else if depth(&pb).map_err(MeshError::from)? <= limit {
                weight = 1.0;
            } else {
                return Err(CutError::MissedCutPoint);
            }
        }

        let position = pa + (pb - pa) * weight;
        let mut groups = BTreeMap::new();
        for (&id, &w) in &a.vertex.groups {
            *groups.entry(id).or_insert(0.0) += w * (1.0 - weight);
        }
        for (&id, &w) in &b.vertex.groups {
            *groups.entry(id).or_insert(0.0) += w * weight;
        }
        let uvs = a
            .uvs
            .iter()
            .zip(&b.uvs)
            .map(|(ua, ub)| lerp_components(ua, ub, weight))
            .collect();

        Ok(Corner {
            vertex: Vertex::with_groups(position, groups),
            uvs,
        })
    }

    /// Add a triangle to `submesh` unless its corners collapse together
    fn emit(&mut self, submesh: &mut Submesh, corners: [&Corner; 3], smooth: bool) {
        let indices = corners.map(|c| self.find_near_vertex(&c.vertex));
        let tri = Triangle {
            indices,
            uvs: (0..corners[0].uvs.len())
                .map(|layer| corners.map(|c| c.uvs[layer].clone()))
                .collect(),
            smooth,
        };
        if tri.has_unique_indices() {
            submesh.triangles.push(tri);
        }
    }
}

/// Slice every triangle of `mesh` and keep the parts in front of the plane.
///
/// `mesh` must not contain quads.
pub(super) fn slice_mesh(
    mesh: &Mesh,
    position: &Point3<f32>,
    normal: &Vector3<f32>,
    tolerances: &Tolerances,
) -> Result<Slices, CutError> {
    let unit_normal = normal
        .try_normalize(0.0)
        .ok_or(MeshError::Geometry(crate::error::GeometryError::ZeroNormal))?;
    let mut slicer = Slicer {
        position: *position,
        normal: unit_normal,
        tolerances,
        vertices: Vec::new(),
    };
    let mut result = Slices::default();

    for submesh in &mesh.submeshes {
        let mut new_submesh = Submesh::new(submesh.material.clone(), submesh.uv_components.clone());

        for tri in &submesh.triangles {
            let corners: Vec<Corner> = (0..3)
                .map(|c| Corner {
                    vertex: mesh.vertices[tri.indices[c]].clone(),
                    uvs: tri.corner_uvs(c),
                })
                .collect();

            let mut kept = [false; 3];
            let mut on_plane = [false; 3];
            let mut unsure_side = false;
            for c in 0..3 {
                let d = distance_to_plane(&corners[c].vertex.position, position, &unit_normal)
                    .map_err(MeshError::from)?;
                if d.abs() < tolerances.on_plane {
                    on_plane[c] = true;
                } else {
                    kept[c] = d > 0.0;
                    unsure_side = kept[c];
                }
            }
            for c in 0..3 {
                if on_plane[c] {
                    kept[c] = unsure_side;
                }
            }

            let (pattern, r) = TrianglePattern::classify(kept, on_plane).ok_or_else(|| {
                MeshError::Defect(format!(
                    "no slicing pattern for kept {:?}, on plane {:?}",
                    kept, on_plane
                ))
            })?;
            let v = |c: usize| &corners[(r + c) % 3];
            let smooth = tri.smooth;

            match pattern {
                TrianglePattern::Dropped => {
                    result.dropped += 1;
                    continue;
                }
                TrianglePattern::Kept => {
                    result.kept += 1;
                    slicer.emit(&mut new_submesh, [v(0), v(1), v(2)], smooth);
                    continue;
                }
                TrianglePattern::ApexBeforeKept => {
                    let cp12 = slicer.cut_point(v(1), v(2))?;
                    slicer.emit(&mut new_submesh, [v(0), &cp12, v(2)], smooth);
                }
                TrianglePattern::ApexAfterKept => {
                    let cp12 = slicer.cut_point(v(1), v(2))?;
                    slicer.emit(&mut new_submesh, [v(0), v(1), &cp12], smooth);
                }
                TrianglePattern::OneKept => {
                    let cp01 = slicer.cut_point(v(0), v(1))?;
                    let cp02 = slicer.cut_point(v(0), v(2))?;
                    slicer.emit(&mut new_submesh, [v(0), &cp01, &cp02], smooth);
                }
                TrianglePattern::TwoKept => {
                    let cp02 = slicer.cut_point(v(0), v(2))?;
                    let cp12 = slicer.cut_point(v(1), v(2))?;
                    slicer.emit(&mut new_submesh, [v(0), v(1), &cp12], smooth);
                    slicer.emit(&mut new_submesh, [v(0), &cp12, &cp02], smooth);
                }
            }
            result.split += 1;
        }

        result.submeshes.push(new_submesh);
    }

    result.vertices = slicer.vertices;
    log::debug!(
        "Sliced mesh: {} kept, {} split, {} dropped triangles, {} vertices",
        result.kept,
        result.split,
        result.dropped,
        result.vertices.len()
    );
    Ok(result)
}

/// Open boundary of the sliced faces as directed cut lines.
///
/// A cut line runs against the face edge it borders, which is the winding a
/// cap face needs on that edge.
pub(super) fn boundary_cut_lines(submeshes: &[Submesh]) -> Result<Vec<[usize; 2]>, CutError> {
    let mut edges: BTreeMap<(usize, usize), i64> = BTreeMap::new();
    for submesh in submeshes {
        for tri in &submesh.triangles {
            for (a, b) in tri.edges() {
                *edges.entry((b, a)).or_insert(0) += 1;
            }
        }
    }

    let mut lines = Vec::new();
    while let Some(((from, to), count)) = edges.pop_first() {
        match edges.remove(&(to, from)) {
            Some(counter) => match count - counter {
                0 => {}
                1 => lines.push([from, to]),
                -1 => lines.push([to, from]),
                surplus => return Err(CutError::AmbiguousBoundary { from, to, surplus }),
            },
            None if count == 1 => lines.push([from, to]),
            None => {
                return Err(CutError::AmbiguousBoundary {
                    from,
                    to,
                    surplus: count,
                })
            }
        }
    }
    Ok(lines)
}
