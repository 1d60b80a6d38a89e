//! Brick sampling and classification shared by the builder and the
//! updater's Phase 2. A brick is always one of three outcomes per
//! SPEC_FULL §3: empty (never stored, parent becomes `InternalLeaf`),
//! constant-nonzero (never stored, parent becomes `Leaf`), or
//! heterogeneous (stored, parent becomes `LeafWithBrick`).

use glam::Vec3;

use super::color::pack_rgb888;
use super::config::BrickShape;
use super::oracle::VoxelData;

/// Outcome of sampling and classifying one node's region into a brick.
pub enum BrickOutcome {
    Empty,
    Constant(u32),
    Heterogeneous(Vec<u32>),
}

/// Sample `data` on a `shape`-sized uniform lattice inside the cube
/// `[center - extent, center + extent]` and classify the result. `extent`
/// is the node's half-extent (so the cube has side `2*extent`).
pub fn build_brick(data: &impl VoxelData, center: Vec3, extent: f32, shape: BrickShape) -> BrickOutcome {
    match shape {
        BrickShape::Color { side } => build_color_brick(data, center, extent, side),
        BrickShape::Occupancy => build_occupancy_brick(data, center, extent),
    }
}

/// Sample position for brick grid coordinate `(x,y,z)` out of `side^3`,
/// uniformly spaced including both cube faces: `p = min + (xyz/(side-1))*2*extent`.
pub fn sample_point(center: Vec3, extent: f32, side: usize, x: usize, y: usize, z: usize) -> Vec3 {
    let min = center - Vec3::splat(extent);
    let denom = (side.max(2) - 1) as f32;
    let step = (2.0 * extent) / denom;
    min + Vec3::new(x as f32 * step, y as f32 * step, z as f32 * step)
}

fn build_color_brick(data: &impl VoxelData, center: Vec3, extent: f32, side: usize) -> BrickOutcome {
    let mut words = Vec::with_capacity(side * side * side);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                words.push(data.sample(sample_point(center, extent, side, x, y, z)));
            }
        }
    }
    classify(words)
}

fn build_occupancy_brick(data: &impl VoxelData, center: Vec3, extent: f32) -> BrickOutcome {
    const SIDE: usize = 8;
    let mut bits = [0u64; 8];
    let mut any_set = false;
    let mut index = 0usize;
    for z in 0..SIDE {
        for y in 0..SIDE {
            for x in 0..SIDE {
                if data.sample(sample_point(center, extent, SIDE, x, y, z)) != 0 {
                    let word = index / 64;
                    let bit = 63 - (index % 64);
                    bits[word] |= 1u64 << bit;
                    any_set = true;
                }
                index += 1;
            }
        }
    }
    if !any_set {
        return BrickOutcome::Empty;
    }
    // Occupancy bricks carry no per-voxel color, so a fully-set brick still
    // needs storage as a brick (the "constant" fold only applies to color
    // bricks, where a uniform nonzero sample value collapses to one Leaf).
    let words: Vec<u32> = bits
        .iter()
        .flat_map(|w| [(*w >> 32) as u32, (*w & 0xFFFF_FFFF) as u32])
        .collect();
    BrickOutcome::Heterogeneous(words)
}

/// Grid side of a stored brick: `side` for color bricks, fixed `8` for the
/// occupancy bitmap (an 8x8x8 grid packed into 8 `u64` words).
pub fn brick_side(shape: BrickShape) -> usize {
    match shape {
        BrickShape::Color { side } => side,
        BrickShape::Occupancy => 8,
    }
}

/// Read the raw voxel word at grid coordinate `(x,y,z)` out of a stored
/// brick's words, for the enumerator. For occupancy bricks this is `1` or
/// `0`, not a color; the enumerator only tests it for non-zero.
pub fn voxel_at(words: &[u32], shape: BrickShape, side: usize, x: usize, y: usize, z: usize) -> u32 {
    let index = x + side * (y + side * z);
    match shape {
        BrickShape::Color { .. } => words[index],
        BrickShape::Occupancy => {
            let word = index / 64;
            let bit = 63 - (index % 64);
            let packed = ((words[word * 2] as u64) << 32) | words[word * 2 + 1] as u64;
            ((packed >> bit) & 1) as u32
        }
    }
}

fn classify(words: Vec<u32>) -> BrickOutcome {
    let mut iter = words.iter().copied();
    let first = match iter.next() {
        Some(v) => v,
        None => return BrickOutcome::Empty,
    };
    if words.iter().all(|&w| w == 0) {
        return BrickOutcome::Empty;
    }
    if first != 0 && words.iter().all(|&w| w == first) {
        return BrickOutcome::Constant(pack_constant(first));
    }
    BrickOutcome::Heterogeneous(words)
}

/// Oracle samples may carry more than the 24-bit RGB888 a `Leaf` payload
/// holds; mask down to the bits the node format actually stores.
fn pack_constant(sample: u32) -> u32 {
    let (r, g, b) = (
        ((sample >> 16) & 0xFF) as u8,
        ((sample >> 8) & 0xFF) as u8,
        (sample & 0xFF) as u8,
    );
    pack_rgb888(r, g, b)
}
