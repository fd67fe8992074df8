// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plain data handed over by a host scene graph

use super::mesh::{Face, Mesh, Submesh, Uv, Vertex};
use crate::error::MeshError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw vertex of a host mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostVertex {
    pub position: [f32; 3],
    /// (vertex group id, weight) pairs
    #[serde(default)]
    pub groups: Vec<(u32, f32)>,
}

/// Raw polygon of a host mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostFace {
    pub vertices: Vec<usize>,
    /// UV coordinates, `uv_layers[layer][corner]`
    #[serde(default)]
    pub uv_layers: Vec<Vec<Uv>>,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub material: usize,
}

/// Mesh as exposed by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMesh {
    pub name: String,
    pub vertices: Vec<HostVertex>,
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    pub faces: Vec<HostFace>,
}

fn corner_uvs<const N: usize>(face: &HostFace) -> Result<Vec<[Uv; N]>, MeshError> {
    face.uv_layers
        .iter()
        .map(|layer| {
            <[Uv; N]>::try_from(layer.clone()).map_err(|layer| MeshError::UvCornerMismatch {
                corners: N,
                uvs: layer.len(),
            })
        })
        .collect()
}

fn store_face<const N: usize>(
    submesh_id: usize,
    submesh: &mut Submesh,
    layout_set: &mut bool,
    face: Face<N>,
) -> Result<Face<N>, MeshError> {
    let layout = face.uv_layout();
    if let Some(&bad) = layout.iter().find(|&&c| !(2..=4).contains(&c)) {
        return Err(MeshError::InvalidUvComponents(bad));
    }
    // The first face of a submesh decides its layout
    if !*layout_set {
        submesh.uv_components = layout;
        *layout_set = true;
    } else if !face.matches_layout(&submesh.uv_components) {
        return Err(MeshError::UvLayoutMismatch {
            submesh: submesh_id,
            expected: submesh.uv_components.clone(),
            found: layout,
        });
    }
    Ok(face)
}

impl Mesh {
    /// Build a mesh from host data.
    ///
    /// Faces are grouped to one submesh per host material, or to a single
    /// submesh without material if the host has none.
    pub fn from_host(host: HostMesh) -> Result<Mesh, MeshError> {
        let mut mesh = Mesh::new(host.name);
        mesh.vertex_groups = host.vertex_groups;

        for hv in host.vertices {
            let mut groups = BTreeMap::new();
            for (id, weight) in hv.groups {
                if groups.insert(id, weight).is_some() {
                    return Err(MeshError::DuplicateVertexGroup(id));
                }
            }
            mesh.add_vertex(Vertex::with_groups(Point3::from(hv.position), groups));
        }

        if host.materials.is_empty() {
            mesh.create_submesh(None, Vec::new());
        } else {
            for material in host.materials {
                mesh.create_submesh(Some(material), Vec::new());
            }
        }
        let mut layout_set = vec![false; mesh.submeshes.len()];

        let count = mesh.vertices.len();
        for face in &host.faces {
            if let Some(&index) = face.vertices.iter().find(|&&i| i >= count) {
                return Err(MeshError::VertexOutOfRange { index, count });
            }
            let submesh_count = mesh.submeshes.len();
            let submesh = mesh
                .submeshes
                .get_mut(face.material)
                .ok_or(MeshError::MaterialOutOfRange {
                    index: face.material,
                    count: submesh_count,
                })?;
            let submesh_layout_set = &mut layout_set[face.material];

            match face.vertices.len() {
                3 => {
                    let indices = [face.vertices[0], face.vertices[1], face.vertices[2]];
                    let tri = Face::with_uvs(indices, corner_uvs::<3>(face)?, face.smooth);
                    let tri = store_face(face.material, submesh, submesh_layout_set, tri)?;
                    submesh.triangles.push(tri);
                }
                4 => {
                    let indices = [
                        face.vertices[0],
                        face.vertices[1],
                        face.vertices[2],
                        face.vertices[3],
                    ];
                    let quad = Face::with_uvs(indices, corner_uvs::<4>(face)?, face.smooth);
                    let quad = store_face(face.material, submesh, submesh_layout_set, quad)?;
                    submesh.quads.push(quad);
                }
                n => return Err(MeshError::InvalidCornerCount(n)),
            }
        }

        log::debug!(
            "Built mesh \"{}\" from host data: {} vertices, {} submeshes",
            mesh.name,
            mesh.vertex_count(),
            mesh.submeshes.len()
        );
        Ok(mesh)
    }
}
