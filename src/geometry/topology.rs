// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology queries and conversions

use super::mesh::{HalvingStyle, Mesh, Quad, Submesh, Triangle};
use super::plane::{distance_to_plane, ray_hits_triangle, RayHit};
use crate::config::Tolerances;
use crate::error::MeshError;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Edge that makes a mesh concave, with the far corners of both faces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcaveEdge {
    pub edge: [Point3<f32>; 2],
    /// Corner of the first face, then corner of the second face
    pub opposite: [Point3<f32>; 2],
}

impl Quad {
    /// Split into two triangles along the diagonal chosen by `style`
    pub fn halve(&self, style: HalvingStyle, mesh: &Mesh) -> [Triangle; 2] {
        let along_v0_v2 = match style {
            HalvingStyle::V0ToV2 => true,
            HalvingStyle::V1ToV3 => false,
            HalvingStyle::Shorter | HalvingStyle::Longer => {
                let pos = |c: usize| mesh.vertices[self.indices[c]].position;
                let d02 = (pos(0) - pos(2)).norm();
                let d13 = (pos(1) - pos(3)).norm();
                if d02 < d13 {
                    style == HalvingStyle::Shorter
                } else {
                    style == HalvingStyle::Longer
                }
            }
        };

        let corners = if along_v0_v2 {
            [[0, 1, 2], [2, 3, 0]]
        } else {
            [[0, 1, 3], [2, 3, 1]]
        };
        corners.map(|pick| {
            Triangle::with_uvs(
                pick.map(|c| self.indices[c]),
                self.uvs.iter().map(|layer| pick.map(|c| layer[c].clone())).collect(),
                self.smooth,
            )
        })
    }
}

impl Mesh {
    /// Replace every quad with two triangles
    pub fn convert_quads_to_tris(&mut self, style: HalvingStyle) {
        let mut halves = Vec::with_capacity(self.submeshes.len());
        for submesh in &self.submeshes {
            let tris: Vec<Triangle> = submesh
                .quads
                .iter()
                .flat_map(|quad| quad.halve(style, self))
                .collect();
            halves.push(tris);
        }
        for (submesh, tris) in self.submeshes.iter_mut().zip(halves) {
            submesh.triangles.extend(tris);
            submesh.quads.clear();
        }
    }

    /// Split into connected parts.
    ///
    /// Faces are connected when they share a vertex. Every part keeps the
    /// name, vertex groups and submesh layout of this mesh, with vertices
    /// numbered in discovery order. Every part must be closed.
    pub fn separate_loose_parts(&self) -> Result<Vec<Mesh>, MeshError> {
        #[derive(Clone, Copy)]
        enum FaceRef {
            Tri(usize, usize),
            Quad(usize, usize),
        }

        let mut faces_of_vertex: Vec<Vec<FaceRef>> = vec![Vec::new(); self.vertices.len()];
        let mut all_faces = Vec::new();
        for (s, submesh) in self.submeshes.iter().enumerate() {
            for (f, tri) in submesh.triangles.iter().enumerate() {
                all_faces.push((FaceRef::Tri(s, f), tri.indices.to_vec()));
            }
            for (f, quad) in submesh.quads.iter().enumerate() {
                all_faces.push((FaceRef::Quad(s, f), quad.indices.to_vec()));
            }
        }
        for (face, indices) in &all_faces {
            for &i in indices {
                let faces = faces_of_vertex
                    .get_mut(i)
                    .ok_or(MeshError::VertexOutOfRange {
                        index: i,
                        count: self.vertices.len(),
                    })?;
                faces.push(*face);
            }
        }

        let key = |face: FaceRef| match face {
            FaceRef::Tri(s, f) => (s, 0, f),
            FaceRef::Quad(s, f) => (s, 1, f),
        };
        let mut visited = std::collections::BTreeSet::new();
        let mut parts = Vec::new();

        for &(start, _) in &all_faces {
            if !visited.insert(key(start)) {
                continue;
            }

            let mut part = Mesh {
                name: self.name.clone(),
                vertices: Vec::new(),
                vertex_groups: self.vertex_groups.clone(),
                submeshes: self
                    .submeshes
                    .iter()
                    .map(|s| Submesh::new(s.material.clone(), s.uv_components.clone()))
                    .collect(),
            };
            let mut vertex_map: HashMap<usize, usize> = HashMap::new();
            let mut queue = VecDeque::from([start]);

            while let Some(face) = queue.pop_front() {
                let mut remap = |old: usize, part: &mut Mesh| -> usize {
                    *vertex_map.entry(old).or_insert_with(|| {
                        part.vertices.push(self.vertices[old].clone());
                        part.vertices.len() - 1
                    })
                };
                let indices: Vec<usize> = match face {
                    FaceRef::Tri(s, f) => {
                        let mut tri = self.submeshes[s].triangles[f].clone();
                        tri.indices = tri.indices.map(|i| remap(i, &mut part));
                        part.submeshes[s].triangles.push(tri);
                        self.submeshes[s].triangles[f].indices.to_vec()
                    }
                    FaceRef::Quad(s, f) => {
                        let mut quad = self.submeshes[s].quads[f].clone();
                        quad.indices = quad.indices.map(|i| remap(i, &mut part));
                        part.submeshes[s].quads.push(quad);
                        self.submeshes[s].quads[f].indices.to_vec()
                    }
                };
                for i in indices {
                    for &neighbor in &faces_of_vertex[i] {
                        if visited.insert(key(neighbor)) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }

            if !part.is_closed() {
                return Err(MeshError::NotClosed);
            }
            parts.push(part);
        }

        log::debug!("Mesh {:?} has {} loose parts", self.name, parts.len());
        Ok(parts)
    }

    /// Check convexity with default tolerances
    pub fn is_convex(&self) -> bool {
        self.is_convex_with(&Tolerances::default())
    }

    /// Check that no vertex lies in front of any face.
    ///
    /// Distances are measured along the unnormalized face normal. Quads are
    /// tested with their first three corners.
    pub fn is_convex_with(&self, tolerances: &Tolerances) -> bool {
        let first_corners = self.submeshes.iter().flat_map(|s| {
            let tris = s.triangles.iter().map(|t| [t.indices[0], t.indices[1], t.indices[2]]);
            let quads = s.quads.iter().map(|q| [q.indices[0], q.indices[1], q.indices[2]]);
            tris.chain(quads)
        });
        for [a, b, c] in first_corners {
            let v0 = self.vertices[a].position;
            let normal = (self.vertices[b].position - v0).cross(&(self.vertices[c].position - v0));
            if self
                .vertices
                .iter()
                .any(|v| normal.dot(&(v.position - v0)) > tolerances.convex)
            {
                return false;
            }
        }
        true
    }

    /// Find a concave edge with default tolerances
    pub fn concaving_faces(&self) -> Result<Option<ConcaveEdge>, MeshError> {
        self.concaving_faces_with(&Tolerances::default())
    }

    /// Find the first pair of triangles meeting at a concave edge.
    ///
    /// The pair is concave when the far corner of the earlier triangle lies
    /// more than `tolerances.concave` in front of the later triangle.
    pub fn concaving_faces_with(&self, tolerances: &Tolerances) -> Result<Option<ConcaveEdge>, MeshError> {
        if self.has_quads() {
            return Err(MeshError::QuadsPresent("concavity test"));
        }

        let pos = |i: usize| self.vertices[i].position;
        let mut edges: BTreeMap<(usize, usize), Vec<&Triangle>> = BTreeMap::new();
        for (_, tri) in self.triangles() {
            for (v0, v1) in tri.edges() {
                let edge = if edges.contains_key(&(v0, v1)) { (v0, v1) } else { (v1, v0) };
                if let Some(others) = edges.get(&edge) {
                    for other in others {
                        let Some(&own_far) = tri.indices.iter().find(|&&i| i != v0 && i != v1) else {
                            continue;
                        };
                        let Some(&other_far) = other
                            .indices
                            .iter()
                            .find(|&&i| i != v0 && i != v1 && i != own_far)
                        else {
                            continue;
                        };

                        let [a, b, c] = self.triangle_corners(tri);
                        let Some(normal) = (b - a).cross(&(c - a)).try_normalize(0.0) else {
                            continue;
                        };
                        if distance_to_plane(&pos(other_far), &a, &normal)? > tolerances.concave {
                            return Ok(Some(ConcaveEdge {
                                edge: [pos(v0), pos(v1)],
                                opposite: [pos(own_far), pos(other_far)],
                            }));
                        }
                    }
                }
                edges.entry(edge).or_default().push(tri);
            }
        }
        Ok(None)
    }

    /// All faces hit by a ray, nearest first.
    ///
    /// Quads are halved with `style` for the test only.
    pub fn ray_hits(&self, origin: &Point3<f32>, dir: &Vector3<f32>, style: HalvingStyle) -> Vec<RayHit> {
        if dir.norm() == 0.0 {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for submesh in &self.submeshes {
            let halves = submesh.quads.iter().flat_map(|q| q.halve(style, self));
            for tri in submesh.triangles.iter().cloned().chain(halves) {
                let [v0, v1, v2] = self.triangle_corners(&tri);
                if let Some(hit) = ray_hits_triangle(origin, dir, &v0, &v1, &v2, 0.0) {
                    hits.push(hit);
                }
            }
        }
        hits.sort_by(|a, b| {
            let da = (a.point - origin).norm_squared();
            let db = (b.point - origin).norm_squared();
            da.total_cmp(&db)
        });
        hits
    }
}
