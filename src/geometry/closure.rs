// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closure validation
//!
//! A mesh is closed when every directed edge `(a, b)` is matched by the same
//! number of reverse edges `(b, a)`. Edges are visited in ascending order so
//! that repairs happen in the same order on every run.

use super::mesh::{Mesh, Triangle};
use crate::config::Tolerances;
use crate::error::MeshError;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Count of every directed edge over all faces
pub(crate) fn directed_edge_counts(mesh: &Mesh) -> BTreeMap<(usize, usize), i64> {
    let mut counts = BTreeMap::new();
    for submesh in &mesh.submeshes {
        let tri_edges = submesh.triangles.iter().flat_map(|t| t.edges());
        let quad_edges = submesh.quads.iter().flat_map(|q| q.edges());
        for edge in tri_edges.chain(quad_edges) {
            *counts.entry(edge).or_insert(0) += 1;
        }
    }
    counts
}

/// Directed edges without a matching reverse edge, in ascending order
fn open_edges(counts: &BTreeMap<(usize, usize), i64>) -> impl Iterator<Item = (usize, usize)> + '_ {
    counts
        .iter()
        .filter(|(&(a, b), count)| counts.get(&(b, a)) != Some(count))
        .map(|(&edge, _)| edge)
}

impl Mesh {
    /// Check closure, welding nearly coincident vertices of open edges
    pub fn is_closed(&mut self) -> bool {
        self.is_closed_with(&Tolerances::default())
    }

    /// Check closure with custom tolerances.
    ///
    /// The first open edge shorter than `merge_distance` is collapsed to its
    /// midpoint and the check is repeated until the mesh is closed or only
    /// long open edges remain.
    pub fn is_closed_with(&mut self, tolerances: &Tolerances) -> bool {
        loop {
            let counts = directed_edge_counts(self);
            let Some(first) = open_edges(&counts).next() else {
                return true;
            };

            let weldable = open_edges(&counts).find(|&(a, b)| {
                a != b
                    && (self.vertices[a].position - self.vertices[b].position).norm()
                        <= tolerances.merge_distance
            });
            if let Some((a, b)) = weldable {
                let pos_a = self.vertices[a].position;
                let pos_b = self.vertices[b].position;
                log::debug!(
                    "Welding vertex #{} into #{} to close edge {:?} --- {:?}",
                    b,
                    a,
                    pos_a,
                    pos_b
                );
                self.merge_vertices_unchecked(a, b, nalgebra::center(&pos_a, &pos_b));
                continue;
            }

            log::debug!(
                "Edge {:?} --- {:?} is open or has invalid number of faces connected to it",
                self.vertices[first.0].position,
                self.vertices[first.1].position
            );
            return false;
        }
    }

    /// Check closure without modifying the mesh
    pub fn is_closed_strict(&self) -> bool {
        open_edges(&directed_edge_counts(self)).next().is_none()
    }

    /// Merge vertex `v2` into `v1` and move `v1` to `position`.
    ///
    /// Vertex group weights present in both vertices are averaged. Triangles
    /// using both vertices are removed. Quads using both vertices lose the
    /// corner of `v2` and become triangles.
    pub fn merge_vertices(
        &mut self,
        v1: usize,
        v2: usize,
        position: Point3<f32>,
    ) -> Result<(), MeshError> {
        let count = self.vertices.len();
        for index in [v1, v2] {
            if index >= count {
                return Err(MeshError::VertexOutOfRange { index, count });
            }
        }
        self.merge_vertices_unchecked(v1, v2, position);
        Ok(())
    }

    pub(crate) fn merge_vertices_unchecked(&mut self, v1: usize, v2: usize, position: Point3<f32>) {
        if v1 == v2 {
            self.vertices[v1].position = position;
            return;
        }

        let removed = self.vertices[v2].groups.clone();
        let kept = &mut self.vertices[v1];
        kept.position = position;
        for (id, weight) in removed {
            kept.groups
                .entry(id)
                .and_modify(|w| *w = (*w + weight) / 2.0)
                .or_insert(weight);
        }

        for submesh in &mut self.submeshes {
            submesh.triangles.retain(|tri| !(tri.contains(v1) && tri.contains(v2)));

            let (collapsed, quads): (Vec<_>, Vec<_>) = std::mem::take(&mut submesh.quads)
                .into_iter()
                .partition(|quad| quad.contains(v1) && quad.contains(v2));
            submesh.quads = quads;
            for quad in collapsed {
                let corners: Vec<usize> = (0..4).filter(|&c| quad.indices[c] != v2).collect();
                if corners.len() != 3 {
                    continue;
                }
                let pick = [corners[0], corners[1], corners[2]];
                let tri = Triangle::with_uvs(
                    pick.map(|c| quad.indices[c]),
                    quad.uvs.iter().map(|layer| pick.map(|c| layer[c].clone())).collect(),
                    quad.smooth,
                );
                if tri.has_unique_indices() {
                    submesh.triangles.push(tri);
                }
            }
        }

        self.remap_indices(|i| if i == v2 { v1 } else { i });
        self.remove_vertex(v2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Face, Primitive, Vertex};
    use nalgebra::Vector3;
    use std::collections::BTreeMap;

    fn unit_cube() -> Mesh {
        Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
    }

    #[test]
    fn test_primitives_are_closed() {
        assert!(unit_cube().is_closed());
        assert!(Primitive::sphere(1.0, 12, 6).to_mesh().is_closed());
        assert!(Primitive::cylinder(1.0, 0.5, 10).to_mesh().is_closed());
    }

    #[test]
    fn test_missing_face_is_open() {
        let mut mesh = unit_cube();
        mesh.submeshes[0].triangles.pop();
        assert!(!mesh.is_closed_strict());
        assert!(!mesh.is_closed());
        assert_eq!(mesh.triangle_count(), 11);
    }

    #[test]
    fn test_near_duplicate_vertex_is_welded() {
        let mut mesh = unit_cube();
        // Front face gets a sliver triangle between corner 6 and a near copy of it
        let copy = mesh.add_vertex(Vertex::new(Point3::new(1.0, 1.0, 1.0 + 1e-6)));
        mesh.submeshes[0].triangles[0].indices = [4, 5, copy];
        mesh.submeshes[0].triangles.push(Triangle::new([copy, 5, 6]));

        assert!(!mesh.is_closed_strict());
        assert!(mesh.is_closed());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed_strict());
        assert_eq!(mesh.submeshes[0].triangles[0].indices, [4, 5, 6]);
    }

    #[test]
    fn test_far_duplicate_vertex_is_not_welded() {
        let mut mesh = unit_cube();
        let copy = mesh.add_vertex(Vertex::new(Point3::new(1.0, 1.0, 1.1)));
        mesh.submeshes[0].triangles[0].indices[2] = copy;
        mesh.submeshes[0].triangles[1].indices[1] = copy;
        assert!(!mesh.is_closed());
        assert_eq!(mesh.vertex_count(), 9);
    }

    #[test]
    fn test_merge_vertices_averages_weights() {
        let mut mesh = Mesh::new("pair");
        mesh.add_vertex(Vertex::with_groups(Point3::origin(), BTreeMap::from([(0, 1.0)])));
        mesh.add_vertex(Vertex::with_groups(
            Point3::new(1.0, 0.0, 0.0),
            BTreeMap::from([(0, 0.5), (1, 0.25)]),
        ));
        mesh.merge_vertices(0, 1, Point3::new(0.5, 0.0, 0.0)).unwrap();

        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.vertices[0].position, Point3::new(0.5, 0.0, 0.0));
        assert_eq!(mesh.vertices[0].groups, BTreeMap::from([(0, 0.75), (1, 0.25)]));
    }

    #[test]
    fn test_merge_vertices_collapses_quad() {
        let mut mesh = Mesh::new("quad");
        for i in 0..5 {
            mesh.add_vertex(Vertex::new(Point3::new(i as f32, 0.0, 0.0)));
        }
        let s = mesh.create_submesh(None, Vec::new());
        mesh.submeshes[s].quads.push(Face::new([0, 1, 2, 3]));
        mesh.submeshes[s].triangles.push(Triangle::new([1, 2, 4]));
        mesh.submeshes[s].triangles.push(Triangle::new([0, 3, 4]));

        mesh.merge_vertices(1, 2, Point3::new(1.5, 0.0, 0.0)).unwrap();

        let submesh = &mesh.submeshes[s];
        assert!(submesh.quads.is_empty());
        // [1, 2, 4] is gone, [0, 3, 4] is shifted, the quad became [0, 1, 2]
        assert_eq!(submesh.triangles.len(), 2);
        assert_eq!(submesh.triangles[0].indices, [0, 2, 3]);
        assert_eq!(submesh.triangles[1].indices, [0, 1, 2]);
    }

    #[test]
    fn test_merge_vertices_out_of_range() {
        let mut mesh = unit_cube();
        assert_eq!(
            mesh.merge_vertices(0, 8, Point3::origin()),
            Err(MeshError::VertexOutOfRange { index: 8, count: 8 })
        );
    }
}
