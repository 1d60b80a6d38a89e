//! Little-endian binary codec for the octree wire format (SPEC_FULL §4.7).
//!
//! Layout: `center (3×f32) | size (f32) | nodeCount (u32) | nodes (u32[]) |
//! brickCount (u32) | bricks (u32[brickCount*stride])`. No magic/version
//! header — the layout is pinned exactly, not versioned, matching the
//! distilled spec. Follows the manual little-endian framing idiom of
//! `voxel/edit/log.rs` (`read_vec3`/`write_vec3`, fixed-size stack buffers,
//! `read_exact`), against this module's own field layout instead of an
//! edit log's.

use std::io::{self, Read, Write};

use glam::Vec3;

use super::error::OctreeError;

/// Everything the codec needs from an `Octree` to serialize it, decoupled
/// from the `Octree` type itself so this module has no dependency on
/// `octree.rs`.
pub struct OctreeSnapshot {
    pub center: Vec3,
    pub size: f32,
    pub nodes: Vec<u32>,
    pub brick_stride: usize,
    pub bricks: Vec<u32>,
}

pub fn write(writer: &mut impl Write, snapshot: &OctreeSnapshot) -> io::Result<()> {
    write_vec3(writer, snapshot.center)?;
    writer.write_all(&snapshot.size.to_le_bytes())?;

    let node_count = snapshot.nodes.len() as u32;
    writer.write_all(&node_count.to_le_bytes())?;
    for word in &snapshot.nodes {
        writer.write_all(&word.to_le_bytes())?;
    }

    debug_assert_eq!(snapshot.bricks.len() % snapshot.brick_stride.max(1), 0);
    let brick_count = if snapshot.brick_stride == 0 {
        0
    } else {
        (snapshot.bricks.len() / snapshot.brick_stride) as u32
    };
    writer.write_all(&brick_count.to_le_bytes())?;
    for word in &snapshot.bricks {
        writer.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

/// Read a snapshot back, given the `brick_element_count` (`BRICK_ELEMENT_COUNT`)
/// the writer and reader must agree on out of band. Truncated or impossible
/// streams surface `OctreeError::CorruptStream`.
pub fn read(reader: &mut impl Read, brick_element_count: usize) -> Result<OctreeSnapshot, OctreeError> {
    let center = read_vec3(reader)?;
    let size = read_f32(reader)?;

    let node_count = read_u32(reader)? as usize;
    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        nodes.push(read_u32(reader)?);
    }

    let brick_count = read_u32(reader)? as usize;
    let mut bricks = Vec::with_capacity(brick_count * brick_element_count);
    for _ in 0..brick_count * brick_element_count {
        bricks.push(read_u32(reader)?);
    }

    Ok(OctreeSnapshot { center, size, nodes, brick_stride: brick_element_count, bricks })
}

fn write_vec3(writer: &mut impl Write, v: Vec3) -> io::Result<()> {
    writer.write_all(&v.x.to_le_bytes())?;
    writer.write_all(&v.y.to_le_bytes())?;
    writer.write_all(&v.z.to_le_bytes())
}

fn read_vec3(reader: &mut impl Read) -> Result<Vec3, OctreeError> {
    Ok(Vec3::new(read_f32(reader)?, read_f32(reader)?, read_f32(reader)?))
}

fn read_f32(reader: &mut impl Read) -> Result<f32, OctreeError> {
    let mut buf = [0u8; 4];
    read_exact_corrupt(reader, &mut buf, "f32")?;
    Ok(f32::from_le_bytes(buf))
}

fn read_u32(reader: &mut impl Read) -> Result<u32, OctreeError> {
    let mut buf = [0u8; 4];
    read_exact_corrupt(reader, &mut buf, "u32")?;
    Ok(u32::from_le_bytes(buf))
}

fn read_exact_corrupt(reader: &mut impl Read, buf: &mut [u8], what: &str) -> Result<(), OctreeError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            log::warn!("octree codec: truncated stream reading {what}");
            Err(OctreeError::CorruptStream(format!("truncated while reading {what}")))
        }
        Err(e) => Err(OctreeError::Io(e)),
    }
}
