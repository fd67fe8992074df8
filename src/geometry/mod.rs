// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod analytics;
mod bbox;
mod closure;
pub mod cut;
mod host;
mod mesh;
pub mod plane;
mod primitives;
mod topology;
pub mod triangle_intersection;
mod weld;

pub use analytics::{analyze, MeshStats};
pub use bbox::{BoundingBox, BoundingSphere};
pub use cut::{cut, CutPlane, CutReport, TrianglePattern};
pub use host::{HostFace, HostMesh, HostVertex};
pub use mesh::{Face, HalvingStyle, Mesh, Quad, Submesh, Triangle, Uv, Vertex};
pub use plane::RayHit;
pub use primitives::Primitive;
pub use topology::ConcaveEdge;
pub use triangle_intersection::triangles_hit;
