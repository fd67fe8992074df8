// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane cut
//!
//! Cutting keeps the part of a closed mesh in front of a plane and closes
//! the opening with cap faces that point against the plane normal. The cut
//! runs on a scratch copy. The input mesh is only replaced once the result
//! is known to be closed.
//!
//! Phases:
//! 1. Slice every triangle and collect the kept pieces ([`slice`])
//! 2. Chain the open boundary into loops and join islands into holes ([`loops`])
//! 3. Triangulate the holes ([`fill`])
//! 4. Check closure and remove redundant vertices

mod fill;
mod loops;
mod slice;

pub use slice::TrianglePattern;

use crate::config::Tolerances;
use crate::error::{CutError, GeometryError, MeshError};
use crate::geometry::mesh::{HalvingStyle, Mesh};
use crate::geometry::plane::perpendicular;
use fill::CapStyle;
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Plane to cut with and the appearance of the cap
#[derive(Debug, Clone, PartialEq)]
pub struct CutPlane {
    pub position: Point3<f32>,
    /// Points to the kept side
    pub normal: Vector3<f32>,
    /// Smoothing flag of cap faces
    pub smooth: bool,
    /// Texture axes for projecting cap UVs, derived from the normal if unset
    pub texture_axes: Option<(Vector3<f32>, Vector3<f32>)>,
    /// Submesh receiving the cap faces
    pub submesh: usize,
    /// Halving of quads before cutting
    pub halving_style: HalvingStyle,
}

impl CutPlane {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            smooth: false,
            texture_axes: None,
            submesh: 0,
            halving_style: HalvingStyle::default(),
        }
    }

    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    pub fn with_texture_axes(mut self, u: Vector3<f32>, v: Vector3<f32>) -> Self {
        self.texture_axes = Some((u, v));
        self
    }

    pub fn with_submesh(mut self, submesh: usize) -> Self {
        self.submesh = submesh;
        self
    }

    pub fn with_halving_style(mut self, style: HalvingStyle) -> Self {
        self.halving_style = style;
        self
    }

    /// Same plane keeping the other side
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            ..self.clone()
        }
    }

    /// Texture axes of the cap
    pub fn cap_texture_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        self.texture_axes.unwrap_or_else(|| {
            let n = self.normal.normalize();
            let u = perpendicular(&n).normalize();
            (u, n.cross(&u))
        })
    }
}

/// Summary of a successful cut
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CutReport {
    /// Triangles kept unchanged
    pub kept: usize,
    /// Triangles crossing the plane
    pub split: usize,
    /// Triangles removed completely
    pub dropped: usize,
    pub holes: usize,
    pub islands: usize,
    pub cap_triangles: usize,
    /// Vertices removed by the welder, `None` if welding was rolled back
    pub welded: Option<usize>,
}

/// Cut `mesh` with `plane` and return the kept part.
///
/// `mesh` is not modified. It must be closed after its quads are halved.
pub fn cut(mesh: &Mesh, plane: &CutPlane, tolerances: &Tolerances) -> Result<(Mesh, CutReport), CutError> {
    if plane.normal.norm() == 0.0 {
        return Err(MeshError::Geometry(GeometryError::ZeroNormal).into());
    }
    if plane.submesh >= mesh.submeshes.len() {
        return Err(MeshError::SubmeshOutOfRange {
            index: plane.submesh,
            count: mesh.submeshes.len(),
        }
        .into());
    }

    let mut source = mesh.clone();
    if source.has_quads() {
        source.convert_quads_to_tris(plane.halving_style);
    }
    if !source.is_closed_with(tolerances) {
        return Err(MeshError::NotClosed.into());
    }

    let slices = slice::slice_mesh(&source, &plane.position, &plane.normal, tolerances)?;
    let mut report = CutReport {
        kept: slices.kept,
        split: slices.split,
        dropped: slices.dropped,
        ..Default::default()
    };

    let lines = slice::boundary_cut_lines(&slices.submeshes)?;
    let paths = loops::extract_loops(lines)?;

    let cap_normal = -plane.normal.normalize();
    let mut cut_loops = loops::sort_loops(paths, &slices.vertices, &cap_normal, tolerances.travel_angle)?;
    report.holes = cut_loops.holes.len();
    report.islands = cut_loops.islands.len();
    loops::absorb_islands(&mut cut_loops, &slices.vertices, &cap_normal)?;

    let (u_axis, v_axis) = plane.cap_texture_axes();
    let cap = CapStyle {
        normal: cap_normal,
        smooth: plane.smooth,
        u_axis,
        v_axis,
        layout: slices.submeshes[plane.submesh].uv_components.clone(),
    };
    let mut submeshes = slices.submeshes;
    while let Some(hole) = cut_loops.holes.pop() {
        let triangles = fill::fill_hole(hole, &slices.vertices, &cap)?;
        report.cap_triangles += triangles.len();
        submeshes[plane.submesh].triangles.extend(triangles);
    }

    let mut result = Mesh {
        name: source.name,
        vertices: slices.vertices,
        vertex_groups: source.vertex_groups,
        submeshes,
    };
    if !result.is_closed_with(tolerances) {
        return Err(CutError::NotClosed);
    }

    let unwelded = result.clone();
    match result.merge_useless_vertices_with(tolerances) {
        Ok(count) if result.is_closed_strict() => report.welded = Some(count),
        Ok(_) => {
            log::warn!("Mesh {:?} was opened by welding after cut, keeping unwelded result", result.name);
            result = unwelded;
        }
        Err(err) => {
            log::warn!("Welding {:?} after cut failed: {}", result.name, err);
            result = unwelded;
        }
    }

    log::debug!(
        "Cut {:?}: {} vertices, {} triangles, {} cap triangles",
        result.name,
        result.vertex_count(),
        result.triangle_count(),
        report.cap_triangles
    );
    Ok((result, report))
}

impl Mesh {
    /// Cut with default tolerances, replacing this mesh on success
    pub fn cut_with_plane(&mut self, plane: &CutPlane) -> Result<CutReport, CutError> {
        self.cut_with_plane_with(plane, &Tolerances::default())
    }

    /// Cut with custom tolerances, leaving this mesh untouched on failure
    pub fn cut_with_plane_with(
        &mut self,
        plane: &CutPlane,
        tolerances: &Tolerances,
    ) -> Result<CutReport, CutError> {
        let (result, report) = cut(self, plane, tolerances)?;
        *self = result;
        Ok(report)
    }
}
