// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Descriptive records stored next to meshes: armatures, materials and the
//! portal/room/object layout of a scene

use super::codec::{
    read_f32, read_len, read_list, read_matrix3, read_matrix4, read_string, read_vector3,
    write_f32, write_len, write_matrix3, write_matrix4, write_str, write_vector3, Decode, Encode,
};
use crate::error::CodecError;
use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Bone rest pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub position: Vector3<f32>,
    pub rotation: Matrix3<f32>,
    /// Name of the parent bone, `None` for a root bone
    pub parent: Option<String>,
}

impl Bone {
    pub fn root(position: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: Matrix3::identity(),
            parent: None,
        }
    }
}

/// Animated property of a bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    LocX,
    LocY,
    LocZ,
    QuatX,
    QuatY,
    QuatZ,
    QuatW,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl Channel {
    /// All channels in wire order
    pub const ALL: [Channel; 10] = [
        Channel::LocX,
        Channel::LocY,
        Channel::LocZ,
        Channel::QuatX,
        Channel::QuatY,
        Channel::QuatZ,
        Channel::QuatW,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
    ];
}

/// Keyframe of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPoint {
    pub time: f32,
    pub value: f32,
    pub weight: f32,
}

/// Keyframes of all channels of one bone, indexed by [`Channel`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoneChannels {
    pub channels: [Vec<ChannelPoint>; 10],
}

impl BoneChannels {
    pub fn get(&self, channel: Channel) -> &[ChannelPoint] {
        &self.channels[channel as usize]
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut Vec<ChannelPoint> {
        &mut self.channels[channel as usize]
    }
}

/// Animation, keyframes by bone name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub bones: BTreeMap<String, BoneChannels>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Armature {
    pub bones: BTreeMap<String, Bone>,
    pub actions: BTreeMap<String, Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub color: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
    pub ambient: f32,
    pub emit: f32,
    pub alpha: f32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(1.0, 1.0, 1.0),
            shininess: 0.5,
            ambient: 1.0,
            emit: 0.0,
            alpha: 1.0,
        }
    }
}

/// Room of a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub transform: Matrix4<f32>,
    pub mesh: String,
}

/// Object placed in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub transform: Matrix4<f32>,
    pub mesh: String,
}

/// Opening between two rooms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub front_room: String,
    pub back_room: String,
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    /// Outline relative to `position`
    pub vertices: Vec<Vector3<f32>>,
}

/// Read `count` named entries into a map, failing on duplicate names
fn read_named<R: Read, T>(
    r: &mut R,
    what: &str,
    mut item: impl FnMut(&mut R) -> Result<T, CodecError>,
) -> Result<BTreeMap<String, T>, CodecError> {
    let count = read_len(r)?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let name = read_string(r)?;
        let value = item(r)?;
        if map.insert(name.clone(), value).is_some() {
            return Err(CodecError::InvalidData(format!("duplicate {} \"{}\"", what, name)));
        }
    }
    Ok(map)
}

impl Encode for Bone {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_vector3(w, &self.position)?;
        write_matrix3(w, &self.rotation)?;
        write_str(w, self.parent.as_deref().unwrap_or(""))
    }
}

impl Decode for Bone {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let position = read_vector3(r)?;
        let rotation = read_matrix3(r)?;
        let parent = read_string(r)?;
        Ok(Self {
            position,
            rotation,
            parent: (!parent.is_empty()).then_some(parent),
        })
    }
}

impl Encode for ChannelPoint {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_f32(w, self.time)?;
        write_f32(w, self.value)?;
        write_f32(w, self.weight)
    }
}

impl Decode for ChannelPoint {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            time: read_f32(r)?,
            value: read_f32(r)?,
            weight: read_f32(r)?,
        })
    }
}

impl Encode for BoneChannels {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        for points in &self.channels {
            write_len(w, points.len())?;
            for point in points {
                point.encode(w)?;
            }
        }
        Ok(())
    }
}

impl Decode for BoneChannels {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let mut bone = BoneChannels::default();
        for channel in Channel::ALL {
            let points = read_list(r, ChannelPoint::decode)?;
            for (i, point) in points.iter().enumerate() {
                if points[..i].iter().any(|p| p.time == point.time) {
                    return Err(CodecError::InvalidData(format!(
                        "duplicate keyframe time {} in {:?}",
                        point.time, channel
                    )));
                }
            }
            *bone.get_mut(channel) = points;
        }
        Ok(bone)
    }
}

impl Encode for Action {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_len(w, self.bones.len())?;
        for (name, channels) in &self.bones {
            write_str(w, name)?;
            channels.encode(w)?;
        }
        Ok(())
    }
}

impl Decode for Action {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            bones: read_named(r, "action bone", BoneChannels::decode)?,
        })
    }
}

impl Encode for Armature {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_len(w, self.bones.len())?;
        for (name, bone) in &self.bones {
            write_str(w, name)?;
            bone.encode(w)?;
        }
        write_len(w, self.actions.len())?;
        for (name, action) in &self.actions {
            write_str(w, name)?;
            action.encode(w)?;
        }
        Ok(())
    }
}

impl Decode for Armature {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let bones = read_named(r, "bone", Bone::decode)?;
        let actions = read_named(r, "action", Action::decode)?;
        Ok(Self { bones, actions })
    }
}

impl Encode for Material {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_str(w, &self.name)?;
        write_vector3(w, &self.color)?;
        write_vector3(w, &self.specular)?;
        for value in [self.shininess, self.ambient, self.emit, self.alpha] {
            write_f32(w, value)?;
        }
        Ok(())
    }
}

impl Decode for Material {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            name: read_string(r)?,
            color: read_vector3(r)?,
            specular: read_vector3(r)?,
            shininess: read_f32(r)?,
            ambient: read_f32(r)?,
            emit: read_f32(r)?,
            alpha: read_f32(r)?,
        })
    }
}

impl Encode for Room {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_matrix4(w, &self.transform)?;
        write_str(w, &self.mesh)
    }
}

impl Decode for Room {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            transform: read_matrix4(r)?,
            mesh: read_string(r)?,
        })
    }
}

impl Encode for Object {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_matrix4(w, &self.transform)?;
        write_str(w, &self.mesh)
    }
}

impl Decode for Object {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            transform: read_matrix4(r)?,
            mesh: read_string(r)?,
        })
    }
}

impl Encode for Portal {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_str(w, &self.front_room)?;
        write_str(w, &self.back_room)?;
        write_vector3(w, &self.position)?;
        write_vector3(w, &self.normal)?;
        write_len(w, self.vertices.len())?;
        for vertex in &self.vertices {
            write_vector3(w, vertex)?;
        }
        Ok(())
    }
}

impl Decode for Portal {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            front_room: read_string(r)?,
            back_room: read_string(r)?,
            position: read_vector3(r)?,
            normal: read_vector3(r)?,
            vertices: read_list(r, read_vector3)?,
        })
    }
}
