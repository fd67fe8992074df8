// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary codec
//!
//! All values are written big-endian in a fixed order: `u32` counts and
//! indices, `f32` floats, `u8` flags and `u32` length-prefixed UTF-8
//! strings. Decoding checks the same invariants as [`Mesh::validate`].

use crate::error::{CodecError, MeshError};
use crate::geometry::{Face, Mesh, Submesh, Uv, Vertex};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

/// Types with a binary representation
pub trait Encode {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError>;

    /// Encode into a new buffer
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// Types that can be read back from their binary representation
pub trait Decode: Sized {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError>;

    /// Decode from a buffer, rejecting trailing bytes
    fn from_bytes(mut bytes: &[u8]) -> Result<Self, CodecError> {
        let value = Self::decode(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(CodecError::InvalidData(format!(
                "{} trailing bytes",
                bytes.len()
            )));
        }
        Ok(value)
    }
}

pub fn write_u8<W: Write>(w: &mut W, value: u8) -> Result<(), CodecError> {
    w.write_all(&[value])?;
    Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), CodecError> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub fn write_f32<W: Write>(w: &mut W, value: f32) -> Result<(), CodecError> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Write a count or index, failing if it does not fit in `u32`
pub fn write_len<W: Write>(w: &mut W, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len)
        .map_err(|_| CodecError::InvalidData(format!("count {} does not fit in 32 bits", len)))?;
    write_u32(w, len)
}

pub fn write_str<W: Write>(w: &mut W, s: &str) -> Result<(), CodecError> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

pub fn write_vector3<W: Write>(w: &mut W, v: &Vector3<f32>) -> Result<(), CodecError> {
    v.iter().try_for_each(|&c| write_f32(w, c))
}

/// Write a 3x3 matrix row by row
pub fn write_matrix3<W: Write>(w: &mut W, m: &Matrix3<f32>) -> Result<(), CodecError> {
    for row in 0..3 {
        for col in 0..3 {
            write_f32(w, m[(row, col)])?;
        }
    }
    Ok(())
}

/// Write a 4x4 matrix row by row
pub fn write_matrix4<W: Write>(w: &mut W, m: &Matrix4<f32>) -> Result<(), CodecError> {
    for row in 0..4 {
        for col in 0..4 {
            write_f32(w, m[(row, col)])?;
        }
    }
    Ok(())
}

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn read_f32<R: Read>(r: &mut R) -> Result<f32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_be_bytes(buf))
}

pub fn read_len<R: Read>(r: &mut R) -> Result<usize, CodecError> {
    Ok(read_u32(r)? as usize)
}

pub fn read_string<R: Read>(r: &mut R) -> Result<String, CodecError> {
    let len = read_len(r)?;
    let mut buf = Vec::new();
    r.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(String::from_utf8(buf)?)
}

pub fn read_vector3<R: Read>(r: &mut R) -> Result<Vector3<f32>, CodecError> {
    Ok(Vector3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?))
}

pub fn read_matrix3<R: Read>(r: &mut R) -> Result<Matrix3<f32>, CodecError> {
    let mut m = Matrix3::zeros();
    for row in 0..3 {
        for col in 0..3 {
            m[(row, col)] = read_f32(r)?;
        }
    }
    Ok(m)
}

pub fn read_matrix4<R: Read>(r: &mut R) -> Result<Matrix4<f32>, CodecError> {
    let mut m = Matrix4::zeros();
    for row in 0..4 {
        for col in 0..4 {
            m[(row, col)] = read_f32(r)?;
        }
    }
    Ok(m)
}

/// Read a count-prefixed list
pub fn read_list<R: Read, T>(
    r: &mut R,
    mut item: impl FnMut(&mut R) -> Result<T, CodecError>,
) -> Result<Vec<T>, CodecError> {
    let count = read_len(r)?;
    // Counts come from untrusted input, so grow as items arrive
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(item(r)?);
    }
    Ok(items)
}

impl Encode for Vertex {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_vector3(w, &self.position.coords)?;
        write_len(w, self.groups.len())?;
        for (&id, &weight) in &self.groups {
            write_u32(w, id)?;
            write_f32(w, weight)?;
        }
        Ok(())
    }
}

impl Decode for Vertex {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let position = Point3::from(read_vector3(r)?);
        let count = read_len(r)?;
        let mut groups = BTreeMap::new();
        for _ in 0..count {
            let id = read_u32(r)?;
            let weight = read_f32(r)?;
            if groups.insert(id, weight).is_some() {
                return Err(MeshError::DuplicateVertexGroup(id).into());
            }
        }
        Ok(Vertex::with_groups(position, groups))
    }
}

fn encode_face<W: Write, const N: usize>(face: &Face<N>, w: &mut W) -> Result<(), CodecError> {
    for &index in &face.indices {
        write_len(w, index)?;
    }
    for layer in &face.uvs {
        for uv in layer {
            uv.iter().try_for_each(|&c| write_f32(w, c))?;
        }
    }
    write_u8(w, u8::from(face.smooth))
}

fn decode_face<R: Read, const N: usize>(r: &mut R, layout: &[u8]) -> Result<Face<N>, CodecError> {
    let mut indices = [0usize; N];
    for index in &mut indices {
        *index = read_len(r)?;
    }
    let mut uvs = Vec::with_capacity(layout.len());
    for &comps in layout {
        let mut layer: [Uv; N] = std::array::from_fn(|_| Vec::new());
        for uv in &mut layer {
            *uv = (0..comps).map(|_| read_f32(r)).collect::<Result<_, _>>()?;
        }
        uvs.push(layer);
    }
    let smooth = read_u8(r)? != 0;
    Ok(Face::with_uvs(indices, uvs, smooth))
}

impl Encode for Submesh {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_len(w, self.uv_components.len())?;
        for &comps in &self.uv_components {
            write_u8(w, comps)?;
        }
        write_len(w, self.triangles.len())?;
        for tri in &self.triangles {
            encode_face(tri, w)?;
        }
        write_len(w, self.quads.len())?;
        for quad in &self.quads {
            encode_face(quad, w)?;
        }
        write_str(w, self.material.as_deref().unwrap_or(""))
    }
}

impl Decode for Submesh {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let uv_components = read_list(r, |r| {
            let comps = read_u8(r)?;
            if !(2..=4).contains(&comps) {
                return Err(MeshError::InvalidUvComponents(comps).into());
            }
            Ok(comps)
        })?;
        let triangles = read_list(r, |r| decode_face(r, &uv_components))?;
        let quads = read_list(r, |r| decode_face(r, &uv_components))?;
        let material = read_string(r)?;
        Ok(Submesh {
            triangles,
            quads,
            uv_components,
            material: (!material.is_empty()).then_some(material),
        })
    }
}

impl Encode for Mesh {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_str(w, &self.name)?;
        write_len(w, self.vertices.len())?;
        for vertex in &self.vertices {
            vertex.encode(w)?;
        }
        write_len(w, self.vertex_groups.len())?;
        for group in &self.vertex_groups {
            write_str(w, group)?;
        }
        write_len(w, self.submeshes.len())?;
        for submesh in &self.submeshes {
            submesh.encode(w)?;
        }
        Ok(())
    }
}

impl Decode for Mesh {
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let name = read_string(r)?;
        let vertices = read_list(r, Vertex::decode)?;

        let mut names = BTreeSet::new();
        let vertex_groups = read_list(r, |r| {
            let group = read_string(r)?;
            if !group.is_empty() && !names.insert(group.clone()) {
                return Err(MeshError::DuplicateVertexGroupName(group).into());
            }
            Ok(group)
        })?;
        let submeshes = read_list(r, Submesh::decode)?;

        let mesh = Mesh {
            name,
            vertices,
            vertex_groups,
            submeshes,
        };
        mesh.validate()?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Triangle};

    #[test]
    fn test_primitives_are_big_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 1).unwrap();
        write_f32(&mut buf, 1.0).unwrap();
        write_str(&mut buf, "ab").unwrap();
        assert_eq!(buf, [0, 0, 0, 1, 0x3f, 0x80, 0, 0, 0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn test_vertex_layout() {
        let vertex = Vertex::with_groups(Point3::new(1.0, 2.0, 3.0), BTreeMap::from([(7, 0.5)]));
        let bytes = vertex.to_bytes().unwrap();
        // Position, group count, one (id, weight) pair
        assert_eq!(bytes.len(), 12 + 4 + 8);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 1]);
        assert_eq!(&bytes[16..20], &[0, 0, 0, 7]);
        assert_eq!(Vertex::from_bytes(&bytes).unwrap(), vertex);
    }

    #[test]
    fn test_duplicate_vertex_group_id() {
        let mut bytes = Vec::new();
        write_vector3(&mut bytes, &Vector3::zeros()).unwrap();
        write_u32(&mut bytes, 2).unwrap();
        for _ in 0..2 {
            write_u32(&mut bytes, 4).unwrap();
            write_f32(&mut bytes, 1.0).unwrap();
        }
        assert!(matches!(
            Vertex::from_bytes(&bytes),
            Err(CodecError::Mesh(MeshError::DuplicateVertexGroup(4)))
        ));
    }

    #[test]
    fn test_submesh_without_material() {
        let mut submesh = Submesh::new(None, vec![3]);
        submesh.triangles.push(Triangle::with_uvs(
            [0, 1, 2],
            vec![[vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]]],
            true,
        ));
        let bytes = submesh.to_bytes().unwrap();
        // Ends with a zero length material name
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
        assert_eq!(Submesh::from_bytes(&bytes).unwrap(), submesh);
    }

    #[test]
    fn test_invalid_uv_components() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 1).unwrap();
        write_u8(&mut bytes, 5).unwrap();
        assert!(matches!(
            Submesh::from_bytes(&bytes),
            Err(CodecError::Mesh(MeshError::InvalidUvComponents(5)))
        ));
    }

    #[test]
    fn test_mesh_index_out_of_range() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        mesh.submeshes[0].triangles[0].indices[0] = 42;
        let bytes = mesh.to_bytes().unwrap();
        assert!(matches!(
            Mesh::from_bytes(&bytes),
            Err(CodecError::Mesh(MeshError::VertexOutOfRange { index: 42, count: 8 }))
        ));
    }

    #[test]
    fn test_duplicate_group_names() {
        let mut mesh = Mesh::new("groups");
        mesh.vertex_groups = vec!["hip".into(), String::new(), String::new(), "hip".into()];
        let bytes = mesh.to_bytes().unwrap();
        assert!(matches!(
            Mesh::from_bytes(&bytes),
            Err(CodecError::Mesh(MeshError::DuplicateVertexGroupName(name))) if name == "hip"
        ));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false)
            .to_mesh()
            .to_bytes()
            .unwrap();
        assert!(matches!(
            Mesh::from_bytes(&bytes[..bytes.len() - 3]),
            Err(CodecError::Io(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = Mesh::new("tail").to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(Mesh::from_bytes(&bytes), Err(CodecError::InvalidData(_))));
    }

    #[test]
    fn test_invalid_utf8_name() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 2).unwrap();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(read_string(&mut bytes.as_slice()), Err(CodecError::Utf8(_))));
    }
}
