// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology query tests

use hpp_mesh::geometry::triangle_intersection::TriangleCorners;
use hpp_mesh::geometry::{triangles_hit, HalvingStyle, Mesh, Primitive, Vertex};
use hpp_mesh::MeshError;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_point(rng: &mut StdRng, extent: f32) -> Point3<f32> {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

#[test]
fn test_rays_hit_convex_mesh_evenly() {
    let sphere = Primitive::sphere(1.0, 20, 10).to_mesh();
    let mut rng = StdRng::seed_from_u64(42);

    let mut crossing = 0;
    for _ in 0..50 {
        let origin = random_point(&mut rng, 1.0) + Vector3::new(0.0, 0.0, 5.0);
        let target = random_point(&mut rng, 0.5);
        let hits = sphere.ray_hits(&origin, &(target - origin), HalvingStyle::default());
        assert!(hits.len() % 2 == 0, "{} hits from {:?}", hits.len(), origin);
        assert!(hits.len() <= 2);
        if hits.len() == 2 {
            crossing += 1;
            assert!((hits[0].point - origin).norm() < (hits[1].point - origin).norm());
        }
    }
    // Every ray aims at the interior
    assert_eq!(crossing, 50);
}

#[test]
fn test_triangles_hit_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut hits = 0;
    for _ in 0..500 {
        let a: TriangleCorners = [(); 3].map(|_| random_point(&mut rng, 1.0));
        let b: TriangleCorners = [(); 3].map(|_| random_point(&mut rng, 1.0));
        let ab = triangles_hit(&a, &b, None, None);
        assert_eq!(ab, triangles_hit(&b, &a, None, None));
        hits += usize::from(ab);
    }
    assert!(hits > 0);
}

#[test]
fn test_cube_and_dented_cube_convexity() {
    let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    assert!(mesh.is_convex());
    assert_eq!(mesh.concaving_faces(), Ok(None));

    // Push the top corner inward past the tolerance
    mesh.vertices[6].position = Point3::new(0.9, 0.9, 0.9);
    assert!(!mesh.is_convex());
    assert!(mesh.concaving_faces().unwrap().is_some());
}

#[test]
fn test_split_and_reassemble() {
    let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    let mut pair = cube.clone();
    let offset = pair.vertex_count();
    for v in &cube.vertices {
        pair.add_vertex(Vertex::new(v.position + Vector3::new(3.0, 0.0, 0.0)));
    }
    let shifted: Vec<_> = cube.submeshes[0]
        .triangles
        .iter()
        .map(|t| {
            let mut t = t.clone();
            t.indices = t.indices.map(|i| i + offset);
            t
        })
        .collect();
    pair.submeshes[0].triangles.extend(shifted);

    let parts = pair.separate_loose_parts().unwrap();
    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert_eq!(part.vertex_count(), 8);
        assert_eq!(part.triangle_count(), 12);
        assert!(part.is_convex());
    }
    assert!(parts[1].vertices.iter().all(|v| v.position.x >= 3.0));
}

#[test]
fn test_open_mesh_cannot_be_split() {
    let mut mesh = Mesh::new("open");
    for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        mesh.add_vertex(Vertex::new(Point3::from(p)));
    }
    let s = mesh.create_submesh(None, Vec::new());
    mesh.submeshes[s]
        .triangles
        .push(hpp_mesh::geometry::Triangle::new([0, 1, 2]));
    assert_eq!(mesh.separate_loose_parts(), Err(MeshError::NotClosed));
}
