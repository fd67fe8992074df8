// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types shared by the geometry, mesh and codec layers

use thiserror::Error;

/// Precondition failures of the vector and plane primitives
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("plane normal must not have zero length")]
    ZeroNormal,
    #[error("segment must not have zero length")]
    ZeroLengthSegment,
    #[error("segment runs parallel to the plane")]
    ParallelSegment,
    #[error("both segment ends are on the same side of the plane")]
    NoStraddle,
    #[error("segment does not reach the plane (parameter {0})")]
    ParameterOutOfRange(f32),
    #[error("projection axes are parallel")]
    DegenerateAxes,
}

/// Invariant violations of the mesh data model.
///
/// These indicate malformed input or a logic defect and are never repaired.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("face references vertex #{index} but mesh has only {count} vertices")]
    VertexOutOfRange { index: usize, count: usize },
    #[error("face has {0} corners, only triangles and quads are supported")]
    InvalidCornerCount(usize),
    #[error("vertex group #{0} defined more than once for a vertex")]
    DuplicateVertexGroup(u32),
    #[error("vertex group \"{0}\" defined twice")]
    DuplicateVertexGroupName(String),
    #[error("submesh #{submesh} has faces with UV layout {found:?}, expected {expected:?}")]
    UvLayoutMismatch {
        submesh: usize,
        expected: Vec<u8>,
        found: Vec<u8>,
    },
    #[error("face has {corners} corners but a UV layer with {uvs} coordinates")]
    UvCornerMismatch { corners: usize, uvs: usize },
    #[error("UV layer has {0} components, only 2 to 4 are supported")]
    InvalidUvComponents(u8),
    #[error("material index {index} out of range ({count} materials)")]
    MaterialOutOfRange { index: usize, count: usize },
    #[error("submesh index {index} out of range ({count} submeshes)")]
    SubmeshOutOfRange { index: usize, count: usize },
    #[error("{0} does not support quads, convert them to triangles first")]
    QuadsPresent(&'static str),
    #[error("mesh is not closed")]
    NotClosed,
    #[error("internal defect: {0}")]
    Defect(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Failure of a plane cut.
///
/// Every variant except [`CutError::Invalid`] is an expected outcome of
/// numerically ambiguous geometry. The mesh is left unmodified in all cases.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CutError {
    #[error("no following cut line found")]
    OpenCutPath,
    #[error("cut path has too few vertices ({0})")]
    CutPathTooShort(usize),
    #[error("cut path has invalid travel angle ({0} degrees)")]
    InvalidTravelAngle(f32),
    #[error("cut path contains zero length segments")]
    DegenerateCutPath,
    #[error("edge {from}->{to} has {surplus} unmatched copies")]
    AmbiguousBoundary { from: usize, to: usize, surplus: i64 },
    #[error("island could not be joined to any hole")]
    UnmergeableIsland,
    #[error("too hard hole to fill")]
    UnfillableHole,
    #[error("edge does not reach the cut plane")]
    MissedCutPoint,
    #[error("resulting mesh is not closed")]
    NotClosed,
    #[error("invalid mesh: {0}")]
    Invalid(#[from] MeshError),
}

impl CutError {
    /// True for failures caused by ambiguous geometry, false for defects
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CutError::Invalid(_))
    }

    /// Human readable reason of the failure
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Errors raised while reading or writing HPP data
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header \"{0}\"")]
    InvalidHeader(String),
    #[error("string is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
