//! Parallel top-down construction (SPEC_FULL §4.4).
//!
//! Maintains two BFS frontiers of `{center, node_index, is_fresh}` and
//! processes one depth at a time behind a `rayon` fork-join barrier,
//! following `generation/mod.rs`'s `par_iter().filter_map(...).collect()`
//! shape rather than a hand-rolled thread pool, and the original source's
//! `ParallelOctree::Generate` for the double-buffered frontier structure
//! itself.

use glam::Vec3;
use rayon::prelude::*;

use super::brick::{build_brick, BrickOutcome};
use super::config::OctreeConfig;
use super::error::{OctreeError, Result};
use super::node::{Node, DIRECTIONS};
use super::oracle::VoxelData;
use super::pool::{BrickPool, NodePool};

/// The smallest node extent the builder will resolve to a leaf rather than
/// continue subdividing; matches the finest band of the default LOD table.
pub const LEAF_NODE_SCALE: f32 = 1.0;

/// Aggregate counts returned once the frontier empties, for the caller and
/// for the `info!` summary log (§4.4).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuildStats {
    pub node_count: usize,
    pub brick_count: usize,
    pub depth_reached: u32,
}

#[derive(Clone, Copy, Debug)]
struct FrontierItem {
    center: Vec3,
    node_index: u32,
    #[allow(dead_code)]
    is_fresh: bool,
}

/// Full parallel build against `data`, seeding only the root and
/// subdividing/promoting until every branch resolves to a leaf kind.
/// `node_pool`/`brick_pool` must already exist with the root node at index
/// 0 (as `NodePool::new()` provides).
pub fn generate(
    center: Vec3,
    size: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    config: &OctreeConfig,
    data: &(impl VoxelData + ?Sized),
    observer: Vec3,
) -> Result<BuildStats> {
    if size <= 0.0 {
        return Err(OctreeError::PreconditionViolation(format!("root size must be positive, got {size}")));
    }

    match config.worker_threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .expect("failed to build scoped rayon thread pool")
            .install(|| generate_on_current_pool(center, size, node_pool, brick_pool, config, data, observer)),
        None => generate_on_current_pool(center, size, node_pool, brick_pool, config, data, observer),
    }
}

/// The BFS loop itself, run on whichever `rayon` pool is current — the
/// global pool, or the scoped one `generate` installs for
/// `OctreeConfig::worker_threads`.
fn generate_on_current_pool(
    center: Vec3,
    size: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    config: &OctreeConfig,
    data: &(impl VoxelData + ?Sized),
    observer: Vec3,
) -> Result<BuildStats> {
    let mut frontier = vec![FrontierItem { center, node_index: 0, is_fresh: true }];
    let mut extent = 2.0 * size;
    let mut depth = 0u32;

    while !frontier.is_empty() {
        log::debug!("octree build: depth {depth}, frontier {}, extent {extent}", frontier.len());

        if let Some(max_nodes) = config.max_nodes {
            if node_pool.len() as u32 > max_nodes {
                return Err(OctreeError::PoolExhausted {
                    resource: "nodes",
                    limit: max_nodes,
                    observed: node_pool.len() as u32,
                });
            }
        }

        let half_extent = extent / 2.0;
        let results: Vec<Result<Vec<FrontierItem>>> = frontier
            .par_iter()
            .map(|item| {
                let guarded = std::panic::AssertUnwindSafe(|| {
                    classify_and_process(item, extent, half_extent, data, observer, node_pool, brick_pool, config)
                });
                std::panic::catch_unwind(guarded).unwrap_or_else(|_| {
                    Err(OctreeError::OracleFault(format!(
                        "voxel data oracle panicked while classifying node at {:?}",
                        item.center
                    )))
                })
            })
            .collect();

        let mut next = Vec::new();
        for result in results {
            next.extend(result?);
        }

        frontier = next;
        extent = half_extent;
        depth += 1;
    }

    let stats = BuildStats {
        node_count: node_pool.len(),
        brick_count: brick_pool.brick_count(),
        depth_reached: depth,
    };
    log::info!(
        "octree build complete: depth {}, {} nodes, {} bricks",
        stats.depth_reached, stats.node_count, stats.brick_count
    );
    Ok(stats)
}

fn classify_and_process(
    item: &FrontierItem,
    extent: f32,
    half_extent: f32,
    data: &(impl VoxelData + ?Sized),
    observer: Vec3,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    config: &OctreeConfig,
) -> Result<Vec<FrontierItem>> {
    let min = item.center - Vec3::splat(half_extent);
    let max = item.center + Vec3::splat(half_extent);

    if data.is_region_empty(min, max) {
        // Already InternalLeaf (either the pre-seeded root or a freshly
        // appended child); nothing to write.
        return Ok(Vec::new());
    }

    let lod = config.lod_table.required_extent((observer - item.center).length());

    if lod >= extent || extent <= LEAF_NODE_SCALE {
        match build_brick(data, item.center, half_extent, config.brick_shape) {
            BrickOutcome::Empty => node_pool.set(item.node_index, Node::INTERNAL_LEAF),
            BrickOutcome::Constant(color) => node_pool.set(item.node_index, Node::leaf(color)),
            BrickOutcome::Heterogeneous(words) => {
                let brick_index = brick_pool.append(&words);
                if let Some(max_bricks) = config.max_bricks {
                    if brick_index >= max_bricks {
                        return Err(OctreeError::PoolExhausted {
                            resource: "bricks",
                            limit: max_bricks,
                            observed: brick_index + 1,
                        });
                    }
                }
                node_pool.set(item.node_index, Node::leaf_with_brick(brick_index));
            }
        }
        return Ok(Vec::new());
    }

    let child_block = node_pool.append_child_block();
    node_pool.set(item.node_index, Node::internal(child_block));

    let quarter = extent / 4.0;
    let mut children = Vec::with_capacity(8);
    for (i, dir) in DIRECTIONS.iter().enumerate() {
        children.push(FrontierItem {
            center: item.center + dir.as_vec3() * quarter,
            node_index: child_block + i as u32,
            is_fresh: true,
        });
    }
    Ok(children)
}
