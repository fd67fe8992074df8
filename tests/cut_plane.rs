// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane cut verification tests

use approx::assert_relative_eq;
use hpp_mesh::geometry::{analyze, CutPlane, Primitive, Triangle};
use hpp_mesh::io::Encode;
use hpp_mesh::{CutError, Mesh, MeshError};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn unit_cube() -> Mesh {
    Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
}

fn random_plane(rng: &mut StdRng) -> CutPlane {
    let position = Point3::new(
        rng.gen_range(-0.5..0.5),
        rng.gen_range(-0.5..0.5),
        rng.gen_range(-0.5..0.5),
    );
    let normal = Vector3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    CutPlane::new(position, normal)
}

#[test]
fn test_oblique_cut_through_cube_center() {
    let plane = CutPlane::new(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.2, 0.1, 1.0));

    let mut front = unit_cube();
    let report = front.cut_with_plane(&plane).unwrap();
    assert_eq!(report.holes, 1);
    assert_eq!(report.islands, 0);
    assert!(front.is_closed_strict());

    let mut back = unit_cube();
    back.cut_with_plane(&plane.flipped()).unwrap();
    assert!(back.is_closed_strict());

    assert_relative_eq!(analyze(&front).volume, 0.5, epsilon = 1e-5);
    assert_relative_eq!(analyze(&back).volume, 0.5, epsilon = 1e-5);
}

#[test]
fn test_off_center_cut_volumes_are_complementary() {
    let plane = CutPlane::new(Point3::new(0.5, 0.5, 0.3), Vector3::new(0.0, 0.1, 1.0));

    let mut front = unit_cube();
    front.cut_with_plane(&plane).unwrap();
    let mut back = unit_cube();
    back.cut_with_plane(&plane.flipped()).unwrap();

    let front_volume = analyze(&front).volume;
    let back_volume = analyze(&back).volume;
    assert!(front_volume > back_volume);
    assert_relative_eq!(front_volume + back_volume, 1.0, epsilon = 1e-5);
}

#[test]
fn test_random_planes_through_sphere() {
    let sphere = Primitive::sphere(1.0, 24, 12).to_mesh();
    let full_volume = analyze(&sphere).volume;
    let original_bytes = sphere.to_bytes().unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let planes = 40;
    let mut successes = 0;
    for _ in 0..planes {
        let plane = random_plane(&mut rng);

        let mut front = sphere.clone();
        let mut back = sphere.clone();
        let front_result = front.cut_with_plane(&plane);
        let back_result = back.cut_with_plane(&plane.flipped());

        match (&front_result, &back_result) {
            (Ok(_), Ok(_)) => {
                successes += 1;
                assert!(front.is_closed_strict());
                assert!(back.is_closed_strict());
                let sum = analyze(&front).volume + analyze(&back).volume;
                assert_relative_eq!(sum, full_volume, max_relative = 1e-3);
            }
            _ => {
                for (result, mesh) in [(&front_result, &front), (&back_result, &back)] {
                    if let Err(err) = result {
                        assert!(err.is_recoverable(), "unexpected failure: {}", err);
                        assert_eq!(mesh.to_bytes().unwrap(), original_bytes);
                    }
                }
            }
        }
    }
    // Generic planes are expected to cut cleanly
    assert!(successes * 20 >= planes * 19, "{} of {} cuts succeeded", successes, planes);
}

/// Closed shell around an inside-out inner cube
fn hollow_cube() -> Mesh {
    let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let inner = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
    let offset = mesh.vertex_count();
    mesh.vertices.extend(inner.vertices);
    for tri in &inner.submeshes[0].triangles {
        let [a, b, c] = tri.indices;
        mesh.submeshes[0]
            .triangles
            .push(Triangle::new([a + offset, c + offset, b + offset]));
    }
    mesh
}

#[test]
fn test_cut_hollow_cube_joins_island() {
    let mut mesh = hollow_cube();
    assert_relative_eq!(analyze(&mesh).volume, 7.0, epsilon = 1e-5);

    let plane = CutPlane::new(Point3::new(0.0, 0.0, 0.1), Vector3::new(0.1, 0.05, 1.0));
    let report = mesh.cut_with_plane(&plane).unwrap();

    assert_eq!(report.holes, 1);
    assert_eq!(report.islands, 1);
    assert!(report.cap_triangles >= 8);
    assert!(mesh.is_closed_strict());
    // Outer 4 * 0.9 minus inner 1 * 0.4
    assert_relative_eq!(analyze(&mesh).volume, 3.2, epsilon = 1e-4);
}

#[test]
fn test_failed_cut_leaves_mesh_unchanged() {
    let mut mesh = unit_cube();
    mesh.submeshes[0].triangles.pop();
    let before = mesh.to_bytes().unwrap();

    let plane = CutPlane::new(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.0, 0.0, 1.0));
    let err = mesh.cut_with_plane(&plane).unwrap_err();

    assert_eq!(err, CutError::Invalid(MeshError::NotClosed));
    assert!(!err.is_recoverable());
    assert_eq!(mesh.to_bytes().unwrap(), before);
}

#[test]
fn test_cap_into_dedicated_submesh() {
    let mut mesh = Primitive::cylinder(2.0, 1.0, 16).to_textured_mesh();
    let cap = mesh.create_submesh(Some("cap".into()), vec![2]);

    let plane = CutPlane::new(Point3::new(0.0, 0.0, 0.4), Vector3::new(0.0, 0.0, -1.0))
        .with_submesh(cap)
        .with_smooth(true);
    let report = mesh.cut_with_plane(&plane).unwrap();

    assert_eq!(report.holes, 1);
    assert!(report.cap_triangles >= 14);
    assert!(mesh.is_closed_strict());
    assert!(!mesh.submeshes[cap].triangles.is_empty());
    assert!(mesh.submeshes[cap].triangles.iter().all(|t| t.smooth));
    assert!(mesh.vertices.iter().all(|v| v.position.z <= 0.4 + 1e-5));
}
