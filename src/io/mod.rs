// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - binary codec and HPP mesh/scene files

pub mod codec;
mod file;
mod records;

pub use codec::{Decode, Encode};
pub use file::{
    read_file, read_from, write_file, write_to, HppFile, MeshFile, SceneFile, HEADER_LEN,
    MESH_MAGIC, SCENE_MAGIC,
};
pub use records::{
    Action, Armature, Bone, BoneChannels, Channel, ChannelPoint, Material, Object, Portal, Room,
};
