//! Didactic single-threaded construction strategy (SPEC_FULL §4.8).
//!
//! `build_dense` walks a `VoxelData` sample grid directly with a plain
//! recursive descent: no frontiers, no locking beyond the pools' own short
//! mutexes, and no `rayon`. It always resolves down to `LEAF_NODE_SCALE`
//! rather than consulting the LOD policy, since it has no notion of an
//! observer — the simpler of two construction strategies, never invoked
//! from the parallel path. Grounded on this crate's own single-threaded
//! recursive `OctreeBuilder::build_node` (this module's own prior,
//! teacher-derived form), retargeted onto the packed `Node`/pool
//! representation this spec requires.

use glam::Vec3;

use super::brick::{build_brick, BrickOutcome};
use super::builder::LEAF_NODE_SCALE;
use super::config::OctreeConfig;
use super::error::{OctreeError, Result};
use super::node::{Node, DIRECTIONS};
use super::oracle::VoxelData;
use super::pool::{BrickPool, NodePool};

/// Build a tree against `data` with no view-dependence: every non-empty
/// region is resolved all the way down to `LEAF_NODE_SCALE`. Never runs
/// concurrently with [`super::builder::generate`].
pub fn build_dense(
    center: Vec3,
    size: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    config: &OctreeConfig,
    data: &(impl VoxelData + ?Sized),
) -> Result<()> {
    if size <= 0.0 {
        return Err(OctreeError::PreconditionViolation(format!("root size must be positive, got {size}")));
    }
    build_node(0, center, 2.0 * size, node_pool, brick_pool, config, data)
}

fn build_node(
    index: u32,
    center: Vec3,
    extent: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    config: &OctreeConfig,
    data: &(impl VoxelData + ?Sized),
) -> Result<()> {
    let half_extent = extent / 2.0;
    let min = center - Vec3::splat(half_extent);
    let max = center + Vec3::splat(half_extent);

    if data.is_region_empty(min, max) {
        return Ok(());
    }

    if extent <= LEAF_NODE_SCALE {
        match build_brick(data, center, half_extent, config.brick_shape) {
            BrickOutcome::Empty => node_pool.set(index, Node::INTERNAL_LEAF),
            BrickOutcome::Constant(color) => node_pool.set(index, Node::leaf(color)),
            BrickOutcome::Heterogeneous(words) => {
                let brick_index = brick_pool.append(&words);
                node_pool.set(index, Node::leaf_with_brick(brick_index));
            }
        }
        return Ok(());
    }

    let child_block = node_pool.append_child_block();
    node_pool.set(index, Node::internal(child_block));

    let quarter = extent / 4.0;
    for (i, dir) in DIRECTIONS.iter().enumerate() {
        let child_center = center + dir.as_vec3() * quarter;
        build_node(child_block + i as u32, child_center, extent / 2.0, node_pool, brick_pool, config, data)?;
    }
    Ok(())
}
