// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut loops
//!
//! Cut lines are chained into closed loops. Loops winding positively around
//! the cap normal are holes, the others are islands inside holes. Islands are
//! spliced into a hole through a bridge so that only holes remain.

use crate::error::CutError;
use crate::geometry::mesh::Vertex;
use crate::geometry::plane::{angle_at_plane, linesegments_intersect_at_plane};
use crate::utils::math::angle_between;
use nalgebra::{Point3, Vector3};

/// Closed loops of vertex ids, split by winding
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct CutLoops {
    pub holes: Vec<Vec<usize>>,
    pub islands: Vec<Vec<usize>>,
}

/// Connection between an island corner and a hole corner
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bridge {
    island_point: usize,
    hole: usize,
    hole_point: usize,
    /// Both corners are the same vertex
    shared: bool,
}

/// Chain directed cut lines head to tail into closed loops
pub(super) fn extract_loops(mut lines: Vec<[usize; 2]>) -> Result<Vec<Vec<usize>>, CutError> {
    let mut loops = Vec::new();
    while let Some(first) = lines.pop() {
        let begin = first[0];
        let mut path = vec![begin];
        let mut line = first;
        while line[1] != begin {
            let next = lines
                .iter()
                .position(|l| l[0] == line[1])
                .ok_or(CutError::OpenCutPath)?;
            line = lines.remove(next);
            if path.last() != Some(&line[0]) {
                path.push(line[0]);
            }
        }
        while !path.is_empty() && path.first() == path.last() {
            path.pop();
        }
        if path.is_empty() {
            continue;
        }
        if path.len() < 3 {
            return Err(CutError::CutPathTooShort(path.len()));
        }
        loops.push(path);
    }
    Ok(loops)
}

/// Sum of signed turns when travelling once around `path`, in degrees
pub(super) fn travel_angle(
    path: &[usize],
    vertices: &[Vertex],
    normal: &Vector3<f32>,
) -> Result<f32, CutError> {
    let len = path.len();
    let mut turn = 0.0;
    for i in 0..len {
        let this = vertices[path[i]].position;
        let to_prev = vertices[path[(i + len - 1) % len]].position - this;
        let to_next = vertices[path[(i + 1) % len]].position - this;
        let angle = angle_between(&to_prev, &to_next).ok_or(CutError::DegenerateCutPath)?;
        let diff = 180.0 - angle;
        if normal.dot(&to_next.cross(&to_prev)) > 0.0 {
            turn += diff;
        } else {
            turn -= diff;
        }
    }
    Ok(turn)
}

/// Split loops into holes and islands by their travel angle
pub(super) fn sort_loops(
    paths: Vec<Vec<usize>>,
    vertices: &[Vertex],
    normal: &Vector3<f32>,
    max_deviation: f32,
) -> Result<CutLoops, CutError> {
    let mut loops = CutLoops::default();
    for path in paths {
        let turn = travel_angle(&path, vertices, normal)?;
        if (turn.abs() - 360.0).abs() > max_deviation {
            return Err(CutError::InvalidTravelAngle(turn));
        }
        if turn > 0.0 {
            loops.holes.push(path);
        } else {
            loops.islands.push(path);
        }
    }
    log::debug!(
        "Found {} holes and {} islands",
        loops.holes.len(),
        loops.islands.len()
    );
    Ok(loops)
}

/// Check that `dir` leaves a corner inside the sector from `to_next` to `to_prev`
fn inside_sector(
    to_next: &Vector3<f32>,
    dir: &Vector3<f32>,
    to_prev: &Vector3<f32>,
    normal: &Vector3<f32>,
) -> bool {
    let angles = (
        angle_at_plane(to_next, to_prev, normal),
        angle_at_plane(to_next, dir, normal),
        angle_at_plane(dir, to_prev, normal),
    );
    match angles {
        (Some(max), Some(a), Some(b)) => a <= max && b <= max,
        _ => false,
    }
}

/// Check if segment `a`-`b` crosses any segment of `paths`.
///
/// The two segments touching corner `ignore_point` of path `ignore_path`
/// are skipped.
fn hits_other_lines(
    vertices: &[Vertex],
    a: &Point3<f32>,
    b: &Point3<f32>,
    paths: &[Vec<usize>],
    ignore_path: usize,
    ignore_point: usize,
) -> bool {
    paths.iter().enumerate().any(|(path_id, path)| {
        let len = path.len();
        (0..len).any(|point| {
            if path_id == ignore_path && (point == ignore_point || (point + 1) % len == ignore_point) {
                return false;
            }
            let p = &vertices[path[point]].position;
            let q = &vertices[path[(point + 1) % len]].position;
            linesegments_intersect_at_plane(p, q, a, b)
        })
    })
}

/// Shortest valid bridge from island `island_id` to any hole
fn find_bridge(
    loops: &CutLoops,
    island_id: usize,
    vertices: &[Vertex],
    normal: &Vector3<f32>,
) -> Option<Bridge> {
    let island = &loops.islands[island_id];
    let island_len = island.len();
    let pos = |id: usize| vertices[id].position;

    let mut best = None;
    let mut nearest = f32::MAX;
    for island_point in 0..island_len {
        let i_this = pos(island[island_point]);
        let i_to_next = pos(island[(island_point + 1) % island_len]) - i_this;
        let i_to_prev = pos(island[(island_point + island_len - 1) % island_len]) - i_this;

        for (hole_id, hole) in loops.holes.iter().enumerate() {
            let hole_len = hole.len();
            for hole_point in 0..hole_len {
                if island[island_point] == hole[hole_point] {
                    return Some(Bridge {
                        island_point,
                        hole: hole_id,
                        hole_point,
                        shared: true,
                    });
                }

                let h_this = pos(hole[hole_point]);
                let line = h_this - i_this;
                let length = line.norm();
                if length > nearest {
                    continue;
                }
                if !inside_sector(&i_to_next, &line, &i_to_prev, normal) {
                    continue;
                }
                let h_to_next = pos(hole[(hole_point + 1) % hole_len]) - h_this;
                let h_to_prev = pos(hole[(hole_point + hole_len - 1) % hole_len]) - h_this;
                if !inside_sector(&h_to_next, &-line, &h_to_prev, normal) {
                    continue;
                }
                if hits_other_lines(vertices, &i_this, &h_this, &loops.holes, hole_id, hole_point)
                    || hits_other_lines(
                        vertices,
                        &i_this,
                        &h_this,
                        &loops.islands,
                        island_id,
                        island_point,
                    )
                {
                    continue;
                }

                nearest = length;
                best = Some(Bridge {
                    island_point,
                    hole: hole_id,
                    hole_point,
                    shared: false,
                });
            }
        }
    }
    best
}

/// Splice `island` into its hole at `bridge`
fn join(hole: &[usize], island: &[usize], bridge: &Bridge) -> Vec<usize> {
    let (hp, ip) = (bridge.hole_point, bridge.island_point);
    let mut joined = Vec::with_capacity(hole.len() + island.len() + 2);
    if bridge.shared {
        joined.extend_from_slice(&hole[..hp]);
        joined.extend_from_slice(&island[ip..]);
        joined.extend_from_slice(&island[..ip]);
    } else {
        // The bridge is walked in both directions
        joined.extend_from_slice(&hole[..=hp]);
        joined.extend_from_slice(&island[ip..]);
        joined.extend_from_slice(&island[..=ip]);
    }
    joined.extend_from_slice(&hole[hp..]);
    joined
}

/// Merge every island into a hole
pub(super) fn absorb_islands(
    loops: &mut CutLoops,
    vertices: &[Vertex],
    normal: &Vector3<f32>,
) -> Result<(), CutError> {
    let mut failures = 0;
    while !loops.islands.is_empty() {
        if loops.holes.is_empty() || failures >= loops.islands.len() {
            return Err(CutError::UnmergeableIsland);
        }
        let island_id = loops.islands.len() - 1;
        let bridge = find_bridge(loops, island_id, vertices, normal);
        let island = loops.islands.remove(island_id);
        match bridge {
            Some(bridge) => {
                log::debug!(
                    "Joining island of {} vertices to hole #{}",
                    island.len(),
                    bridge.hole
                );
                let hole = &mut loops.holes[bridge.hole];
                *hole = join(hole, &island, &bridge);
                failures = 0;
            }
            None => {
                // Retry after the other islands
                loops.islands.insert(0, island);
                failures += 1;
            }
        }
    }
    Ok(())
}
