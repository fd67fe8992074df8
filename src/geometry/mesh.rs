// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation
//!
//! A [`Mesh`] owns its vertices and a list of [`Submesh`]es. Faces reference
//! vertices by index and carry one UV coordinate per corner and UV layer.
//! All faces of a submesh share the same UV layout.

use super::BoundingBox;
use crate::error::MeshError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One UV coordinate with 2 to 4 components
pub type Uv = Vec<f32>;

/// Vertex with position and vertex group weights
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    /// Vertex group id to weight
    pub groups: BTreeMap<u32, f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            groups: BTreeMap::new(),
        }
    }

    pub fn with_groups(position: Point3<f32>, groups: BTreeMap<u32, f32>) -> Self {
        Self { position, groups }
    }

    /// Check if both vertices belong to exactly the same vertex groups
    pub fn same_groups(&self, other: &Vertex) -> bool {
        self.groups.len() == other.groups.len()
            && self.groups.keys().zip(other.groups.keys()).all(|(a, b)| a == b)
    }
}

/// Face with `N` corners
#[derive(Debug, Clone, PartialEq)]
pub struct Face<const N: usize> {
    pub indices: [usize; N],
    /// UV coordinates, `uvs[layer][corner]`
    pub uvs: Vec<[Uv; N]>,
    pub smooth: bool,
}

pub type Triangle = Face<3>;
pub type Quad = Face<4>;

impl<const N: usize> Face<N> {
    /// Face without UV layers
    pub fn new(indices: [usize; N]) -> Self {
        Self {
            indices,
            uvs: Vec::new(),
            smooth: false,
        }
    }

    pub fn with_uvs(indices: [usize; N], uvs: Vec<[Uv; N]>, smooth: bool) -> Self {
        Self {
            indices,
            uvs,
            smooth,
        }
    }

    /// Component count of each UV layer, taken from the first corner
    pub fn uv_layout(&self) -> Vec<u8> {
        self.uvs.iter().map(|layer| layer[0].len() as u8).collect()
    }

    /// Check that every corner of every layer has the given component count
    pub fn matches_layout(&self, layout: &[u8]) -> bool {
        self.uvs.len() == layout.len()
            && self
                .uvs
                .iter()
                .zip(layout)
                .all(|(layer, &comps)| layer.iter().all(|uv| uv.len() == comps as usize))
    }

    /// UVs of one corner over all layers
    pub fn corner_uvs(&self, corner: usize) -> Vec<Uv> {
        self.uvs.iter().map(|layer| layer[corner].clone()).collect()
    }

    /// Position of vertex `index` among the corners
    pub fn corner_of(&self, index: usize) -> Option<usize> {
        self.indices.iter().position(|&i| i == index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Directed edges in winding order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..N).map(move |k| (self.indices[k], self.indices[(k + 1) % N]))
    }

    /// Check if all corners reference different vertices
    pub fn has_unique_indices(&self) -> bool {
        (0..N).all(|a| (a + 1..N).all(|b| self.indices[a] != self.indices[b]))
    }
}

/// How a quad is split into two triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalvingStyle {
    /// Split along the diagonal from corner 0 to corner 2
    V0ToV2,
    /// Split along the diagonal from corner 1 to corner 3
    V1ToV3,
    /// Split along the shorter diagonal
    #[default]
    Shorter,
    /// Split along the longer diagonal
    Longer,
}

/// Faces sharing one material and UV layout
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Submesh {
    pub triangles: Vec<Triangle>,
    pub quads: Vec<Quad>,
    /// Component count of each UV layer
    pub uv_components: Vec<u8>,
    pub material: Option<String>,
}

impl Submesh {
    pub fn new(material: Option<String>, uv_components: Vec<u8>) -> Self {
        Self {
            triangles: Vec::new(),
            quads: Vec::new(),
            uv_components,
            material,
        }
    }

    pub fn face_count(&self) -> usize {
        self.triangles.len() + self.quads.len()
    }
}

/// Polygon mesh with submeshes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Vertex group names, indexed by group id
    pub vertex_groups: Vec<String>,
    pub submeshes: Vec<Submesh>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Append an empty submesh and return its index
    pub fn create_submesh(&mut self, material: Option<String>, uv_components: Vec<u8>) -> usize {
        self.submeshes.push(Submesh::new(material, uv_components));
        self.submeshes.len() - 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.triangles.len()).sum()
    }

    pub fn quad_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.quads.len()).sum()
    }

    pub fn face_count(&self) -> usize {
        self.submeshes.iter().map(Submesh::face_count).sum()
    }

    pub fn has_quads(&self) -> bool {
        self.submeshes.iter().any(|s| !s.quads.is_empty())
    }

    /// All triangles with the index of their submesh
    pub fn triangles(&self) -> impl Iterator<Item = (usize, &Triangle)> + '_ {
        self.submeshes
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.triangles.iter().map(move |t| (i, t)))
    }

    /// Corner positions of a triangle
    pub fn triangle_corners(&self, triangle: &Triangle) -> [Point3<f32>; 3] {
        triangle.indices.map(|i| self.vertices[i].position)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Look up a vertex group id by name
    pub fn vertex_group_id(&self, name: &str) -> Option<u32> {
        self.vertex_groups
            .iter()
            .position(|g| g == name)
            .map(|i| i as u32)
    }

    /// Check index ranges, UV layouts and vertex group names
    pub fn validate(&self) -> Result<(), MeshError> {
        let count = self.vertices.len();
        let mut names = BTreeSet::new();
        for name in &self.vertex_groups {
            if !name.is_empty() && !names.insert(name.as_str()) {
                return Err(MeshError::DuplicateVertexGroupName(name.clone()));
            }
        }

        for (submesh_id, submesh) in self.submeshes.iter().enumerate() {
            if let Some(&bad) = submesh
                .uv_components
                .iter()
                .find(|&&c| !(2..=4).contains(&c))
            {
                return Err(MeshError::InvalidUvComponents(bad));
            }

            let check_face = |indices: &[usize], layout_ok: bool, layout: Vec<u8>| {
                if let Some(&index) = indices.iter().find(|&&i| i >= count) {
                    return Err(MeshError::VertexOutOfRange { index, count });
                }
                if !layout_ok {
                    return Err(MeshError::UvLayoutMismatch {
                        submesh: submesh_id,
                        expected: submesh.uv_components.clone(),
                        found: layout,
                    });
                }
                Ok(())
            };
            for tri in &submesh.triangles {
                let ok = tri.matches_layout(&submesh.uv_components);
                check_face(&tri.indices[..], ok, tri.uv_layout())?;
            }
            for quad in &submesh.quads {
                let ok = quad.matches_layout(&submesh.uv_components);
                check_face(&quad.indices[..], ok, quad.uv_layout())?;
            }
        }
        Ok(())
    }

    /// Rewrite every face index through `map`
    pub(crate) fn remap_indices(&mut self, map: impl Fn(usize) -> usize) {
        for submesh in &mut self.submeshes {
            for tri in &mut submesh.triangles {
                tri.indices = tri.indices.map(&map);
            }
            for quad in &mut submesh.quads {
                quad.indices = quad.indices.map(&map);
            }
        }
    }

    /// Remove vertex `index` and shift all higher face indices down by one.
    ///
    /// Faces must no longer reference the removed vertex.
    pub(crate) fn remove_vertex(&mut self, index: usize) {
        self.vertices.remove(index);
        self.remap_indices(|i| if i > index { i - 1 } else { i });
    }
}
