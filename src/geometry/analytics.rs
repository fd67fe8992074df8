// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh analytics and statistics

use super::Mesh;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Mesh statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    pub name: String,
    /// Signed volume in cubic units, negative for inside-out meshes
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Average vertex position [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub quad_count: usize,
    pub submesh_count: usize,
    pub vertex_group_count: usize,
    /// Every directed edge has a matching reverse edge
    pub is_closed: bool,
}

impl MeshStats {
    /// Create empty stats
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            quad_count: 0,
            submesh_count: 0,
            vertex_group_count: 0,
            is_closed: true,
        }
    }

    /// Analyze mesh geometry and compute statistics
    pub fn analyze(mesh: &Mesh) -> Self {
        let mut stats = Self::empty(&mesh.name);
        stats.vertex_count = mesh.vertex_count();
        stats.triangle_count = mesh.triangle_count();
        stats.quad_count = mesh.quad_count();
        stats.submesh_count = mesh.submeshes.len();
        stats.vertex_group_count = mesh.vertex_groups.len();
        stats.is_closed = mesh.is_closed_strict();

        if stats.vertex_count == 0 {
            return stats;
        }

        let bbox = mesh.bounding_box();
        stats.bbox = [
            bbox.min.x as f64,
            bbox.min.y as f64,
            bbox.min.z as f64,
            bbox.max.x as f64,
            bbox.max.y as f64,
            bbox.max.z as f64,
        ];

        for [v0, v1, v2] in face_triangles(mesh) {
            // Signed volume of tetrahedron formed by triangle and origin
            stats.volume += (v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0) as f64;
            stats.surface_area += ((v1 - v0).cross(&(v2 - v0)).norm() / 2.0) as f64;
        }

        let count = stats.vertex_count as f64;
        for vertex in &mesh.vertices {
            stats.centroid[0] += vertex.position.x as f64 / count;
            stats.centroid[1] += vertex.position.y as f64 / count;
            stats.centroid[2] += vertex.position.z as f64 / count;
        }

        stats
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║ {:<56} ║", self.name);
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Volume:          {:>12.4}                            ║", self.volume);
        println!("║ Surface Area:    {:>12.4}                            ║", self.surface_area);
        println!(
            "║ Centroid:        ({:>8.3}, {:>8.3}, {:>8.3})          ║",
            self.centroid[0], self.centroid[1], self.centroid[2]
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   Min: ({:>8.3}, {:>8.3}, {:>8.3})                    ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>8.3}, {:>8.3}, {:>8.3})                    ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║                                                          ║");
        println!("║ Vertices:        {:>12}                            ║", self.vertex_count);
        println!("║ Triangles:       {:>12}                            ║", self.triangle_count);
        println!("║ Quads:           {:>12}                            ║", self.quad_count);
        println!("║ Submeshes:       {:>12}                            ║", self.submesh_count);
        println!("║ Vertex groups:   {:>12}                            ║", self.vertex_group_count);
        println!(
            "║ Closed:          {:>12}                            ║",
            if self.is_closed { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Corner positions of all faces, quads split at their first corner
fn face_triangles(mesh: &Mesh) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
    let pos = move |i: usize| mesh.vertices[i].position;
    mesh.submeshes.iter().flat_map(move |submesh| {
        let tris = submesh
            .triangles
            .iter()
            .map(move |t| t.indices.map(pos));
        let quads = submesh.quads.iter().flat_map(move |q| {
            let [a, b, c, d] = q.indices.map(pos);
            [[a, b, c], [a, c, d]]
        });
        tris.chain(quads)
    })
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> MeshStats {
    MeshStats::analyze(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Face, Primitive, Vertex};
    use nalgebra::Vector3;

    #[test]
    fn test_analyze_cube() {
        let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
        let stats = analyze(&mesh);

        assert!((stats.volume - 1000.0).abs() < 1e-3);
        assert!((stats.surface_area - 600.0).abs() < 1e-3);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.triangle_count, 12);
        assert!(stats.is_closed);
        assert_eq!(stats.bbox, [-5.0, -5.0, -5.0, 5.0, 5.0, 5.0]);

        // Centroid should be near origin for centered cube
        assert!(stats.centroid.iter().all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn test_analyze_sphere() {
        let mesh = Primitive::sphere(5.0, 32, 16).to_mesh();
        let stats = analyze(&mesh);

        let expected_volume = 4.0 / 3.0 * std::f64::consts::PI * 5.0_f64.powi(3);
        let expected_area = 4.0 * std::f64::consts::PI * 5.0_f64.powi(2);

        assert!(
            (stats.volume - expected_volume).abs() < expected_volume * 0.05,
            "Volume {} not close to expected {}",
            stats.volume,
            expected_volume
        );
        assert!(
            (stats.surface_area - expected_area).abs() < expected_area * 0.05,
            "Surface area {} not close to expected {}",
            stats.surface_area,
            expected_area
        );
        assert!(stats.is_closed);
    }

    #[test]
    fn test_inside_out_volume_is_negative() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        for tri in &mut mesh.submeshes[0].triangles {
            tri.indices.swap(1, 2);
        }
        assert!((analyze(&mesh).volume + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quads_are_measured() {
        let mut mesh = Mesh::new("plate");
        for (x, y) in [(0.0, 0.0), (2.0, 0.0), (2.0, 3.0), (0.0, 3.0)] {
            mesh.add_vertex(Vertex::new(Point3::new(x, y, 0.0)));
        }
        let s = mesh.create_submesh(None, Vec::new());
        mesh.submeshes[s].quads.push(Face::new([0, 1, 2, 3]));

        let stats = analyze(&mesh);
        assert_eq!(stats.quad_count, 1);
        assert!((stats.surface_area - 6.0).abs() < 1e-6);
        assert!(!stats.is_closed);
    }

    #[test]
    fn test_empty_mesh() {
        let stats = analyze(&Mesh::new("nothing"));
        assert_eq!(stats, MeshStats::empty("nothing"));
    }
}
