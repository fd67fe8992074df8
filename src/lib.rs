// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! HPP mesh kernel
//!
//! Closed-solid validation and welding, plane cutting with hole filling,
//! topology queries and the HPP binary mesh/scene codec.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod utils;

pub use config::{MeshConfig, Tolerances};
pub use error::{CodecError, CutError, GeometryError, MeshError};
pub use geometry::{CutPlane, CutReport, HalvingStyle, HostMesh, Mesh, MeshStats, Primitive};
pub use io::{read_file, write_file, HppFile, MeshFile, SceneFile};
