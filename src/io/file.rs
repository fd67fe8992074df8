// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh and scene files
//!
//! Both kinds start with a 32-byte ASCII magic, padded with spaces.

use super::codec::{
    read_list, read_string, read_u8, write_len, write_str, write_u8, Decode, Encode,
};
use super::records::{Armature, Material, Object, Portal, Room};
use crate::error::CodecError;
use crate::geometry::Mesh;
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const MESH_MAGIC: &str = "HPP_MESH_1.01";
pub const SCENE_MAGIC: &str = "HPP_SCENE_1.01";
pub const HEADER_LEN: usize = 32;

/// Single mesh with its armature and materials
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshFile {
    pub mesh: Mesh,
    pub armature: Option<Armature>,
    pub materials: Vec<Material>,
}

impl MeshFile {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            ..Default::default()
        }
    }
}

/// Complete scene
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneFile {
    pub portals: Vec<Portal>,
    pub rooms: Vec<(String, Room)>,
    pub objects: Vec<(String, Object)>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HppFile {
    Mesh(MeshFile),
    Scene(SceneFile),
}

impl HppFile {
    /// All meshes contained in the file
    pub fn meshes(&self) -> &[Mesh] {
        match self {
            HppFile::Mesh(file) => std::slice::from_ref(&file.mesh),
            HppFile::Scene(scene) => &scene.meshes,
        }
    }

    pub fn magic(&self) -> &'static str {
        match self {
            HppFile::Mesh(_) => MESH_MAGIC,
            HppFile::Scene(_) => SCENE_MAGIC,
        }
    }
}

fn write_header<W: Write>(w: &mut W, magic: &str) -> Result<(), CodecError> {
    w.write_all(format!("{:<width$}", magic, width = HEADER_LEN).as_bytes())?;
    Ok(())
}

fn read_header<R: Read>(r: &mut R) -> Result<String, CodecError> {
    let mut buf = [0u8; HEADER_LEN];
    r.read_exact(&mut buf)?;
    let header = String::from_utf8_lossy(&buf);
    Ok(header.trim_end_matches(' ').to_string())
}

fn encode_all<W: Write, T: Encode>(w: &mut W, items: &[T]) -> Result<(), CodecError> {
    write_len(w, items.len())?;
    items.iter().try_for_each(|item| item.encode(w))
}

fn encode_named<W: Write, T: Encode>(w: &mut W, items: &[(String, T)]) -> Result<(), CodecError> {
    write_len(w, items.len())?;
    for (name, item) in items {
        write_str(w, name)?;
        item.encode(w)?;
    }
    Ok(())
}

fn decode_named<R: Read, T: Decode>(r: &mut R) -> Result<Vec<(String, T)>, CodecError> {
    read_list(r, |r| Ok((read_string(r)?, T::decode(r)?)))
}

impl Encode for MeshFile {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        self.mesh.encode(w)?;
        match &self.armature {
            Some(armature) => {
                write_u8(w, 1)?;
                armature.encode(w)?;
            }
            None => write_u8(w, 0)?,
        }
        encode_all(w, &self.materials)
    }
}

impl Decode for MeshFile {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let mesh = Mesh::decode(r)?;
        let armature = match read_u8(r)? {
            0 => None,
            _ => Some(Armature::decode(r)?),
        };
        let materials = read_list(r, Material::decode)?;
        Ok(Self {
            mesh,
            armature,
            materials,
        })
    }
}

impl Encode for SceneFile {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        encode_all(w, &self.portals)?;
        encode_named(w, &self.rooms)?;
        encode_named(w, &self.objects)?;
        encode_all(w, &self.meshes)?;
        encode_all(w, &self.materials)
    }
}

impl Decode for SceneFile {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            portals: read_list(r, Portal::decode)?,
            rooms: decode_named(r)?,
            objects: decode_named(r)?,
            meshes: read_list(r, Mesh::decode)?,
            materials: read_list(r, Material::decode)?,
        })
    }
}

/// Write a file with its header
pub fn write_to<W: Write>(w: &mut W, file: &HppFile) -> Result<(), CodecError> {
    write_header(w, file.magic())?;
    match file {
        HppFile::Mesh(mesh_file) => mesh_file.encode(w),
        HppFile::Scene(scene) => scene.encode(w),
    }
}

/// Read a file, detecting its kind from the header
pub fn read_from<R: Read>(r: &mut R) -> Result<HppFile, CodecError> {
    let header = read_header(r)?;
    match header.as_str() {
        MESH_MAGIC => Ok(HppFile::Mesh(MeshFile::decode(r)?)),
        SCENE_MAGIC => Ok(HppFile::Scene(SceneFile::decode(r)?)),
        _ => Err(CodecError::InvalidHeader(header)),
    }
}

pub fn write_file(path: impl AsRef<Path>, file: &HppFile) -> Result<(), CodecError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(&mut writer, file)?;
    writer.flush()?;
    debug!("Wrote {} to {}", file.magic(), path.display());
    Ok(())
}

pub fn read_file(path: impl AsRef<Path>) -> Result<HppFile, CodecError> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let file = read_from(&mut reader)?;
    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(CodecError::InvalidData(format!(
            "trailing data after {} body",
            file.magic()
        )));
    }
    debug!("Read {} from {}", file.magic(), path.display());
    Ok(file)
}
