//! View-dependent refine/coarsen pass (SPEC_FULL §4.5).
//!
//! Two phases: a single-threaded BFS classification pass that only touches
//! node words and free lists, followed by a `rayon` fork-join pass that
//! samples and writes the bricks the classification pass scheduled.
//! Grounded on the original source's `ParallelOctree::Update` case table
//! and on this crate's own builder for the Phase 2 fork-join idiom.

use std::collections::VecDeque;

use glam::Vec3;
use rayon::prelude::*;

use super::brick::{build_brick, BrickOutcome};
use super::config::OctreeConfig;
use super::error::{OctreeError, Result};
use super::node::{Node, NodeKind, DIRECTIONS};
use super::oracle::VoxelData;
use super::pool::{BrickPool, FreeList, NodePool};

/// Counts of nodes touched by one `update` call, returned instead of `()`
/// so a caller or test can assert convergence without re-walking the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateStats {
    pub refined: u32,
    pub coarsened: u32,
    pub bricks_rebuilt: u32,
}

impl UpdateStats {
    /// `true` once a call makes no changes at all — the fixed point
    /// referenced by SPEC_FULL §8's update-convergence law.
    pub fn is_noop(&self) -> bool {
        self.refined == 0 && self.coarsened == 0 && self.bricks_rebuilt == 0
    }
}

struct QueueItem {
    index: u32,
    center: Vec3,
    extent: f32,
    is_fresh: bool,
}

struct BrickJob {
    index: u32,
    center: Vec3,
    extent: f32,
}

fn chebyshev(a: Vec3, b: Vec3) -> f32 {
    let d = (a - b).abs();
    d.x.max(d.y).max(d.z)
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    root_center: Vec3,
    root_size: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    free_node_blocks: &FreeList,
    free_brick_blocks: &FreeList,
    config: &OctreeConfig,
    data: &(impl VoxelData + ?Sized),
    observer: Vec3,
) -> Result<UpdateStats> {
    let mut stats = UpdateStats::default();
    let mut jobs = Vec::new();

    let mut queue = VecDeque::new();
    queue.push_back(QueueItem { index: 0, center: root_center, extent: 2.0 * root_size, is_fresh: false });

    while let Some(item) = queue.pop_front() {
        let node = node_pool.get(item.index);
        let expected = config.lod_table.required_extent(chebyshev(observer, item.center));

        match node.kind() {
            NodeKind::Leaf | NodeKind::LeafWithBrick => {
                if expected < item.extent {
                    if node.kind() == NodeKind::LeafWithBrick {
                        free_brick_blocks.push(node.payload());
                    }
                    let child_block = free_node_blocks.try_pop().unwrap_or_else(|| node_pool.append_child_block());
                    for i in 0..8u32 {
                        node_pool.set(child_block + i, Node::INTERNAL_LEAF);
                    }
                    node_pool.set(item.index, Node::internal(child_block));
                    stats.refined += 1;

                    let new_extent = item.extent / 2.0;
                    let quarter = item.extent / 4.0;
                    for (i, dir) in DIRECTIONS.iter().enumerate() {
                        queue.push_back(QueueItem {
                            index: child_block + i as u32,
                            center: item.center + dir.as_vec3() * quarter,
                            extent: new_extent,
                            is_fresh: true,
                        });
                    }
                }
            }
            NodeKind::Internal => {
                if expected >= item.extent {
                    free_node_blocks.push(node.payload());
                    jobs.push(BrickJob { index: item.index, center: item.center, extent: item.extent });
                    node_pool.set(item.index, Node::leaf_with_brick(0));
                    stats.coarsened += 1;
                } else {
                    let child_block = node.payload();
                    let new_extent = item.extent / 2.0;
                    let quarter = item.extent / 4.0;
                    for (i, dir) in DIRECTIONS.iter().enumerate() {
                        queue.push_back(QueueItem {
                            index: child_block + i as u32,
                            center: item.center + dir.as_vec3() * quarter,
                            extent: new_extent,
                            is_fresh: false,
                        });
                    }
                }
            }
            NodeKind::InternalLeaf => {
                if item.is_fresh && expected >= item.extent {
                    jobs.push(BrickJob { index: item.index, center: item.center, extent: item.extent });
                }
            }
        }
    }

    log::debug!("octree update phase 1: {} refined, {} coarsened, {} brick jobs", stats.refined, stats.coarsened, jobs.len());

    stats.bricks_rebuilt = jobs.len() as u32;
    let run_phase_2 = || -> Result<()> {
        jobs.par_iter()
            .map(|job| {
                let guarded = std::panic::AssertUnwindSafe(|| {
                    let half_extent = job.extent / 2.0;
                    match build_brick(data, job.center, half_extent, config.brick_shape) {
                        BrickOutcome::Empty => node_pool.set(job.index, Node::INTERNAL_LEAF),
                        BrickOutcome::Constant(color) => node_pool.set(job.index, Node::leaf(color)),
                        BrickOutcome::Heterogeneous(words) => {
                            let brick_index = match free_brick_blocks.try_pop() {
                                Some(idx) => {
                                    brick_pool.write_at(idx, &words);
                                    idx
                                }
                                None => brick_pool.append(&words),
                            };
                            node_pool.set(job.index, Node::leaf_with_brick(brick_index));
                        }
                    }
                });
                std::panic::catch_unwind(guarded).map_err(|_| {
                    OctreeError::OracleFault(format!(
                        "voxel data oracle panicked while rebuilding brick at {:?}",
                        job.center
                    ))
                })
            })
            .collect::<Result<Vec<()>>>()?;
        Ok(())
    };
    match config.worker_threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .expect("failed to build scoped rayon thread pool")
            .install(run_phase_2)?,
        None => run_phase_2()?,
    }

    log::info!(
        "octree update complete: {} refined, {} coarsened, {} bricks rebuilt",
        stats.refined, stats.coarsened, stats.bricks_rebuilt
    );
    Ok(stats)
}
