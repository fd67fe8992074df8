// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Removal of geometrically redundant vertices
//!
//! A vertex lying on the line between two of its neighbors can be collapsed
//! onto one of them without changing the shape of the mesh, as long as no
//! face normal, UV seam or material boundary is affected.

use super::mesh::{Mesh, Uv};
use super::plane::distance_to_plane;
use crate::config::Tolerances;
use crate::error::MeshError;
use crate::utils::math::{angle_between, lerp_components, squared_difference};
use nalgebra::Point3;
use std::collections::BTreeSet;

/// Faces with a smaller doubled area count as collapsed
const MIN_FACE_AREA: f32 = 0.001;

/// Triangle around a vertex
#[derive(Debug, Clone)]
struct FanFace {
    submesh: usize,
    face: usize,
    indices: [usize; 3],
    /// Corner of the center vertex
    corner: usize,
    /// Corner following the center vertex
    next: usize,
    /// Corner preceding the center vertex
    prev: usize,
}

/// Accepted collapse of a vertex onto a neighbor
#[derive(Debug)]
struct Collapse {
    offset: f32,
    target: usize,
    /// Fan indices of the faces on each side of the neighbor line
    sides: [Vec<usize>; 2],
    /// UVs of the target on each side
    target_uvs: [Vec<Uv>; 2],
}

fn fan_around(mesh: &Mesh, vertex: usize) -> Vec<FanFace> {
    let mut fan = Vec::new();
    for (s, submesh) in mesh.submeshes.iter().enumerate() {
        for (f, tri) in submesh.triangles.iter().enumerate() {
            if let Some(corner) = tri.corner_of(vertex) {
                fan.push(FanFace {
                    submesh: s,
                    face: f,
                    indices: tri.indices,
                    corner,
                    next: tri.indices[(corner + 1) % 3],
                    prev: tri.indices[(corner + 2) % 3],
                });
            }
        }
    }
    fan
}

/// Walk around the fan from the edge towards `from` until the edge towards `to`
fn walk_fan(fan: &[FanFace], from: usize, to: usize) -> Option<Vec<usize>> {
    let mut current = fan.iter().position(|f| f.prev == from)?;
    let mut side = Vec::new();
    loop {
        side.push(current);
        if fan[current].next == to {
            return Some(side);
        }
        if side.len() >= fan.len() {
            return None;
        }
        let next_vertex = fan[current].next;
        current = fan
            .iter()
            .enumerate()
            .position(|(i, f)| f.prev == next_vertex && !side.contains(&i))?;
    }
}

fn face_uvs(mesh: &Mesh, fan_face: &FanFace, corner: usize) -> Vec<Uv> {
    mesh.submeshes[fan_face.submesh].triangles[fan_face.face].corner_uvs(corner)
}

fn layers_difference(a: &[Uv], b: &[Uv]) -> f32 {
    a.iter().zip(b).map(|(x, y)| squared_difference(x, y)).sum()
}

/// Check if moving the center vertex onto `target` keeps every face normal
fn collapse_keeps_normals(
    mesh: &Mesh,
    fan: &[FanFace],
    target: usize,
    tolerances: &Tolerances,
) -> bool {
    let target_pos = mesh.vertices[target].position;
    fan.iter().all(|f| {
        let mut p: [Point3<f32>; 3] = f.indices.map(|i| mesh.vertices[i].position);
        let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
        p[f.corner] = target_pos;
        let moved = (p[1] - p[0]).cross(&(p[2] - p[0]));
        if moved.norm() < MIN_FACE_AREA {
            // Only faces spanning the merged edge may vanish
            return f.indices.contains(&target);
        }
        matches!(angle_between(&normal, &moved), Some(a) if a < tolerances.normal_change_degrees)
    })
}

fn evaluate_pair(
    mesh: &Mesh,
    vertex: usize,
    fan: &[FanFace],
    n1: usize,
    n2: usize,
    best_offset: f32,
    tolerances: &Tolerances,
) -> Option<Collapse> {
    let pos = mesh.vertices[vertex].position;
    let n1_pos = mesh.vertices[n1].position;
    let n2_pos = mesh.vertices[n2].position;
    let n1_to_n2 = n2_pos - n1_pos;
    if n1_to_n2.norm() == 0.0 {
        return None;
    }

    let n2_weight = distance_to_plane(&pos, &n1_pos, &n1_to_n2).ok()?;
    if !(0.0..=1.0).contains(&n2_weight) {
        return None;
    }
    let offset = (n1_pos + n1_to_n2 * n2_weight - pos).norm();
    if offset > tolerances.collinear_distance || offset > best_offset {
        return None;
    }

    let n1_possible = collapse_keeps_normals(mesh, fan, n1, tolerances);
    let n2_possible = collapse_keeps_normals(mesh, fan, n2, tolerances);
    if !n1_possible && !n2_possible {
        return None;
    }

    let side_a = walk_fan(fan, n1, n2)?;
    let side_b = walk_fan(fan, n2, n1)?;
    if side_a.len() + side_b.len() != fan.len() {
        return None;
    }

    for side in [&side_a, &side_b] {
        // Edges inside a side must not separate different materials or shading
        let props_match = side.windows(2).all(|w| {
            let (a, b) = (&fan[w[0]], &fan[w[1]]);
            let smooth_a = mesh.submeshes[a.submesh].triangles[a.face].smooth;
            let smooth_b = mesh.submeshes[b.submesh].triangles[b.face].smooth;
            a.submesh == b.submesh && smooth_a == smooth_b
        });
        if !props_match {
            return None;
        }

        // UVs of the center vertex must be constant on each side
        let first = face_uvs(mesh, &fan[side[0]], fan[side[0]].corner);
        let constant = side.iter().all(|&i| {
            let uvs = face_uvs(mesh, &fan[i], fan[i].corner);
            layers_difference(&uvs, &first) <= tolerances.uv_constant
        });
        if !constant {
            return None;
        }
    }

    // Neighbor UVs at both ends of each side
    let first_a = &fan[side_a[0]];
    let last_a = &fan[side_a[side_a.len() - 1]];
    let first_b = &fan[side_b[0]];
    let last_b = &fan[side_b[side_b.len() - 1]];
    let n1_uvs = [
        face_uvs(mesh, first_a, (first_a.corner + 2) % 3),
        face_uvs(mesh, last_b, (last_b.corner + 1) % 3),
    ];
    let n2_uvs = [
        face_uvs(mesh, last_a, (last_a.corner + 1) % 3),
        face_uvs(mesh, first_b, (first_b.corner + 2) % 3),
    ];
    let center_uvs = [
        face_uvs(mesh, first_a, first_a.corner),
        face_uvs(mesh, first_b, first_b.corner),
    ];

    // Center UVs must be reproducible by interpolating the neighbors
    for side in 0..2 {
        for layer in 0..center_uvs[side].len() {
            let formed = lerp_components(&n1_uvs[side][layer], &n2_uvs[side][layer], n2_weight);
            let error = squared_difference(&formed, &center_uvs[side][layer]).sqrt();
            if error > tolerances.uv_interpolation {
                return None;
            }
        }
    }

    let n1_weight = 1.0 - n2_weight;
    let (target, target_uvs) = if n1_possible && (n1_weight < n2_weight || !n2_possible) {
        (n1, n1_uvs)
    } else {
        (n2, n2_uvs)
    };

    // Exactly the two faces along the neighbor line may vanish
    if fan.iter().filter(|f| f.indices.contains(&target)).count() != 2 {
        return None;
    }

    Some(Collapse {
        offset,
        target,
        sides: [side_a, side_b],
        target_uvs,
    })
}

fn find_collapse(
    mesh: &Mesh,
    vertex: usize,
    fan: &[FanFace],
    tolerances: &Tolerances,
) -> Option<Collapse> {
    let neighbors: Vec<usize> = fan
        .iter()
        .flat_map(|f| f.indices)
        .filter(|&i| i != vertex)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut best: Option<Collapse> = None;
    for (k, &n1) in neighbors.iter().enumerate() {
        for &n2 in &neighbors[k + 1..] {
            let best_offset = best
                .as_ref()
                .map_or(tolerances.collinear_distance * 2.0, |b| b.offset);
            if let Some(candidate) =
                evaluate_pair(mesh, vertex, fan, n1, n2, best_offset, tolerances)
            {
                best = Some(candidate);
            }
        }
    }
    best
}

fn apply_collapse(mesh: &mut Mesh, vertex: usize, fan: &[FanFace], collapse: Collapse) {
    let mut destroyed = Vec::new();
    for (side, members) in collapse.sides.iter().enumerate() {
        for &i in members {
            let f = &fan[i];
            if f.indices.contains(&collapse.target) {
                destroyed.push((f.submesh, f.face));
                continue;
            }
            let tri = &mut mesh.submeshes[f.submesh].triangles[f.face];
            tri.indices[f.corner] = collapse.target;
            for (layer, uv) in tri.uvs.iter_mut().zip(&collapse.target_uvs[side]) {
                layer[f.corner] = uv.clone();
            }
        }
    }

    destroyed.sort_unstable_by(|a, b| b.cmp(a));
    for (submesh, face) in destroyed {
        mesh.submeshes[submesh].triangles.remove(face);
    }
    mesh.remove_vertex(vertex);
}

impl Mesh {
    /// Remove redundant vertices with default tolerances
    pub fn merge_useless_vertices(&mut self) -> Result<usize, MeshError> {
        self.merge_useless_vertices_with(&Tolerances::default())
    }

    /// Collapse vertices lying between two neighbors until none are left.
    ///
    /// The mesh must be closed and contain only triangles. Returns the number
    /// of removed vertices.
    pub fn merge_useless_vertices_with(&mut self, tolerances: &Tolerances) -> Result<usize, MeshError> {
        if self.has_quads() {
            return Err(MeshError::QuadsPresent("merging useless vertices"));
        }
        if !self.is_closed_with(tolerances) {
            return Err(MeshError::NotClosed);
        }

        let mut removed = 0;
        let mut merged_any = true;
        while merged_any {
            merged_any = false;
            let mut vertex = 0;
            while vertex < self.vertices.len() {
                let fan = fan_around(self, vertex);
                match find_collapse(self, vertex, &fan, tolerances) {
                    Some(collapse) => {
                        log::debug!(
                            "Collapsing vertex #{} onto #{} (offset {})",
                            vertex,
                            collapse.target,
                            collapse.offset
                        );
                        apply_collapse(self, vertex, &fan, collapse);
                        removed += 1;
                        merged_any = true;
                    }
                    None => vertex += 1,
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Quad, Triangle, Vertex};
    use nalgebra::Vector3;

    /// Unit cube whose front face has an extra vertex in its center
    fn cube_with_center_vertex() -> Mesh {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let center = mesh.add_vertex(Vertex::new(Point3::new(0.5, 0.5, 1.0)));
        let tris = &mut mesh.submeshes[0].triangles;
        tris[0] = Triangle::new([4, 5, center]);
        tris[1] = Triangle::new([4, center, 7]);
        tris.push(Triangle::new([center, 5, 6]));
        tris.push(Triangle::new([center, 6, 7]));
        mesh
    }

    fn planar_uvs(mesh: &mut Mesh) {
        let positions: Vec<Point3<f32>> = mesh.vertices.iter().map(|v| v.position).collect();
        mesh.submeshes[0].uv_components = vec![2];
        for tri in &mut mesh.submeshes[0].triangles {
            tri.uvs = vec![tri.indices.map(|i| vec![positions[i].x, positions[i].y])];
        }
    }

    #[test]
    fn test_center_vertex_is_removed() {
        let mut mesh = cube_with_center_vertex();
        assert!(mesh.is_closed_strict());
        assert_eq!(mesh.vertex_count(), 9);

        let removed = mesh.merge_useless_vertices().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed_strict());
    }

    #[test]
    fn test_center_vertex_with_continuous_uvs() {
        let mut mesh = cube_with_center_vertex();
        planar_uvs(&mut mesh);
        assert_eq!(mesh.merge_useless_vertices().unwrap(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_uv_seam_blocks_removal() {
        let mut mesh = cube_with_center_vertex();
        planar_uvs(&mut mesh);
        // Center corner of [center, 6, 7] gets its own UV
        mesh.submeshes[0].triangles[13].uvs[0][0] = vec![0.9, 0.9];
        assert_eq!(mesh.merge_useless_vertices().unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 9);
    }

    #[test]
    fn test_smoothing_boundary_blocks_removal() {
        let mut mesh = cube_with_center_vertex();
        mesh.submeshes[0].triangles[13].smooth = true;
        mesh.submeshes[0].triangles[1].smooth = true;
        // Both smooth faces lie on the same side of the 4-6 diagonal
        let removed = mesh.merge_useless_vertices().unwrap();
        assert_eq!(removed, 1);
        assert!(mesh.is_closed_strict());

        let mut mesh = cube_with_center_vertex();
        mesh.submeshes[0].triangles[13].smooth = true;
        assert_eq!(mesh.merge_useless_vertices().unwrap(), 0);
    }

    #[test]
    fn test_cube_has_no_useless_vertices() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert_eq!(mesh.merge_useless_vertices().unwrap(), 0);
    }

    #[test]
    fn test_preconditions() {
        let mut open = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        open.submeshes[0].triangles.pop();
        assert_eq!(open.merge_useless_vertices(), Err(MeshError::NotClosed));

        let mut quads = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        quads.submeshes[0].quads.push(Quad::new([0, 1, 2, 3]));
        assert!(matches!(
            quads.merge_useless_vertices(),
            Err(MeshError::QuadsPresent(_))
        ));
    }
}
