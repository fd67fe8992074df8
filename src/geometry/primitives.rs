// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed primitive solids
//!
//! Generated meshes share vertices between faces so that they pass the
//! closure check. Faces wind counter-clockwise when seen from outside.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f32>, center: bool },
    Sphere { r: f32, segments: u32, rings: u32 },
    Cylinder { h: f32, r: f32, segments: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f32>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f32, segments: u32, rings: u32) -> Self {
        Self::Sphere {
            r,
            segments: segments.max(3),
            rings: rings.max(2),
        }
    }

    pub fn cylinder(h: f32, r: f32, segments: u32) -> Self {
        Self::Cylinder {
            h,
            r,
            segments: segments.max(3),
        }
    }

    /// Mesh with a single submesh and no UV layers
    pub fn to_mesh(&self) -> Mesh {
        let (name, positions, triangles) = match self {
            Self::Cube { size, center } => ("cube", cube_positions(*size, *center), cube_triangles()),
            Self::Sphere { r, segments, rings } => {
                let (p, t) = generate_sphere(*r, *segments as usize, *rings as usize);
                ("sphere", p, t)
            }
            Self::Cylinder { h, r, segments } => {
                let (p, t) = generate_cylinder(*h, *r, *segments as usize);
                ("cylinder", p, t)
            }
        };

        let mut mesh = Mesh::new(name);
        for position in positions {
            mesh.add_vertex(Vertex::new(position));
        }
        let submesh = mesh.create_submesh(None, Vec::new());
        mesh.submeshes[submesh].triangles = triangles.into_iter().map(Triangle::new).collect();
        mesh
    }

    /// Mesh with one 2-component UV layer from planar projection.
    ///
    /// Each face is projected along the dominant axis of its normal.
    pub fn to_textured_mesh(&self) -> Mesh {
        let mut mesh = self.to_mesh();
        let positions: Vec<Point3<f32>> = mesh.vertices.iter().map(|v| v.position).collect();
        let submesh = &mut mesh.submeshes[0];
        submesh.uv_components = vec![2];
        for tri in &mut submesh.triangles {
            let p = tri.indices.map(|i| positions[i]);
            let normal = (p[1] - p[0]).cross(&(p[2] - p[0])).abs();
            let (a, b) = if normal.x >= normal.y && normal.x >= normal.z {
                (1, 2)
            } else if normal.y >= normal.z {
                (0, 2)
            } else {
                (0, 1)
            };
            tri.uvs = vec![p.map(|c| vec![c[a], c[b]])];
        }
        mesh
    }
}

fn cube_positions(size: Vector3<f32>, center: bool) -> Vec<Point3<f32>> {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = min + size;

    vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ]
}

fn cube_triangles() -> Vec<[usize; 3]> {
    vec![
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Top (y+)
        [7, 6, 2],
        [7, 2, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ]
}

/// Ring of points around the z axis
fn ring(radius: f32, z: f32, segments: usize) -> impl Iterator<Item = Point3<f32>> {
    (0..segments).map(move |j| {
        let theta = 2.0 * PI * j as f32 / segments as f32;
        Point3::new(radius * theta.cos(), radius * theta.sin(), z)
    })
}

fn generate_sphere(radius: f32, segments: usize, rings: usize) -> (Vec<Point3<f32>>, Vec<[usize; 3]>) {
    let mut positions = vec![Point3::new(0.0, 0.0, radius)];
    for i in 1..rings {
        let phi = PI * i as f32 / rings as f32;
        positions.extend(ring(radius * phi.sin(), radius * phi.cos(), segments));
    }
    positions.push(Point3::new(0.0, 0.0, -radius));

    let top = 0;
    let bottom = positions.len() - 1;
    let at = |ring: usize, j: usize| 1 + ring * segments + j % segments;

    let mut triangles = Vec::new();
    for j in 0..segments {
        triangles.push([top, at(0, j), at(0, j + 1)]);
    }
    for i in 0..rings - 2 {
        for j in 0..segments {
            let (a, b) = (at(i, j), at(i, j + 1));
            let (c, d) = (at(i + 1, j), at(i + 1, j + 1));
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }
    for j in 0..segments {
        triangles.push([bottom, at(rings - 2, j + 1), at(rings - 2, j)]);
    }

    (positions, triangles)
}

fn generate_cylinder(height: f32, radius: f32, segments: usize) -> (Vec<Point3<f32>>, Vec<[usize; 3]>) {
    // Bottom center at z=0, top center at z=height
    let mut positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, height)];
    positions.extend(ring(radius, 0.0, segments));
    positions.extend(ring(radius, height, segments));

    let bottom_center = 0;
    let top_center = 1;
    let bottom = |j: usize| 2 + j % segments;
    let top = |j: usize| 2 + segments + j % segments;

    let mut triangles = Vec::new();
    for j in 0..segments {
        triangles.push([bottom_center, bottom(j + 1), bottom(j)]);
        triangles.push([top_center, top(j), top(j + 1)]);
        triangles.push([top(j), bottom(j), bottom(j + 1)]);
        triangles.push([top(j), bottom(j + 1), top(j + 1)]);
    }

    (positions, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_centered_cube() {
        let mesh = Primitive::cube(Vector3::new(2.0, 4.0, 6.0), true).to_mesh();
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = Primitive::sphere(1.0, 8, 4).to_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 3 * 8);
        assert_eq!(mesh.triangle_count(), 8 + 2 * 8 * 2 + 8);
    }

    #[test]
    fn test_cylinder_counts() {
        let mesh = Primitive::cylinder(2.0, 1.0, 6).to_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 12);
        assert_eq!(mesh.triangle_count(), 24);
    }

    #[test]
    fn test_textured_cube_uvs() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_textured_mesh();
        assert_eq!(mesh.submeshes[0].uv_components, vec![2]);
        assert!(mesh.validate().is_ok());
        // Front face projects along z
        let front = &mesh.submeshes[0].triangles[0];
        assert_eq!(front.uvs[0][1], vec![1.0, 0.0]);
        assert_eq!(front.uvs[0][2], vec![1.0, 1.0]);
    }
}
