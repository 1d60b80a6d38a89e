//! Sparse Voxel Octree container (SPEC_FULL §6): owns the pools, free
//! lists, and config, and exposes `generate`/`update`/`list_voxels`/
//! `write`/`read` as the public API. Shape grounded on this module's own
//! prior `Octree` container (owned fields, `with_capacity`, zero-copy
//! slice accessors), generalized to the spec's pool/free-list/config
//! fields.

use std::io::{Read, Write};

use glam::{Vec3, Vec4};

use crate::math::Frustum;

use super::builder::{self, BuildStats};
use super::codec::{self, OctreeSnapshot};
use super::config::OctreeConfig;
use super::cpu_builder;
use super::enumerate;
use super::error::{OctreeError, Result};
use super::oracle::VoxelData;
use super::pool::{BrickPool, FreeList, NodePool};
use super::updater::{self, UpdateStats};

/// A sparse voxel octree with bricked leaves: the node pool, brick pool,
/// and their free lists, tied to a root center/half-extent and a
/// construction-time [`OctreeConfig`].
pub struct Octree {
    center: Vec3,
    /// Root cube half-extent; the root cube spans `[center - size, center + size]`.
    size: f32,
    node_pool: NodePool,
    brick_pool: BrickPool,
    free_node_blocks: FreeList,
    free_brick_blocks: FreeList,
    config: OctreeConfig,
}

impl Octree {
    /// An empty octree (root is `InternalLeaf`) at `center` with half-extent
    /// `size`. `generate` or `build_dense` populates it against a field.
    pub fn new(center: Vec3, size: f32, config: OctreeConfig) -> Result<Self> {
        if size <= 0.0 {
            return Err(OctreeError::PreconditionViolation(format!("root size must be positive, got {size}")));
        }
        let stride = config.brick_shape.element_count();
        Ok(Self {
            center,
            size,
            node_pool: NodePool::new(),
            brick_pool: BrickPool::new(stride),
            free_node_blocks: FreeList::new(),
            free_brick_blocks: FreeList::new(),
            config,
        })
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Full parallel build against `data` and `observer` (§4.4). Safe to
    /// call on a freshly-constructed, empty tree.
    pub fn generate(&self, data: &(impl VoxelData + ?Sized), observer: Vec3) -> Result<BuildStats> {
        builder::generate(self.center, self.size, &self.node_pool, &self.brick_pool, &self.config, data, observer)
    }

    /// The didactic single-threaded variant (§4.8). Never call this
    /// concurrently with `generate` or `update` on the same tree.
    pub fn build_dense(&self, data: &(impl VoxelData + ?Sized)) -> Result<()> {
        cpu_builder::build_dense(self.center, self.size, &self.node_pool, &self.brick_pool, &self.config, data)
    }

    /// Incremental view-dependent refine/coarsen pass against the current
    /// observer (§4.5). Returns a summary of nodes touched.
    pub fn update(&self, data: &(impl VoxelData + ?Sized), observer: Vec3) -> Result<UpdateStats> {
        updater::update(
            self.center,
            self.size,
            &self.node_pool,
            &self.brick_pool,
            &self.free_node_blocks,
            &self.free_brick_blocks,
            &self.config,
            data,
            observer,
        )
    }

    /// Frustum-culled voxel extraction for GPU instanced draw (§4.6).
    pub fn list_voxels(&self, frustum: &Frustum) -> Vec<Vec4> {
        enumerate::list_voxels(self.center, self.size, &self.node_pool, &self.brick_pool, self.config.brick_shape, frustum)
    }

    /// Snapshot of the node pool as raw packed `u32`s, for GPU upload.
    pub fn node_pools(&self) -> Vec<u32> {
        self.node_pool.snapshot_raw()
    }

    /// Snapshot of the brick pool as raw `u32`s, for GPU upload.
    pub fn brick_pools(&self) -> Vec<u32> {
        self.brick_pool.snapshot_raw()
    }

    /// Number of reclaimed node-child-blocks currently awaiting reuse.
    /// Exposed for tests asserting free-list reuse bounds pool growth (§8).
    pub fn free_node_count(&self) -> usize {
        self.free_node_blocks.len()
    }

    /// Number of reclaimed brick slots currently awaiting reuse.
    pub fn free_brick_count(&self) -> usize {
        self.free_brick_blocks.len()
    }

    /// Write the codec's binary layout (§4.7) to `writer`.
    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        let snapshot = OctreeSnapshot {
            center: self.center,
            size: self.size,
            nodes: self.node_pool.snapshot_raw(),
            brick_stride: self.brick_pool.stride(),
            bricks: self.brick_pool.snapshot_raw(),
        };
        codec::write(writer, &snapshot)?;
        Ok(())
    }

    /// Read back a tree previously written by [`Octree::write`]. The
    /// reader and writer must agree on `config.brick_shape`'s element
    /// count; a truncated or malformed stream surfaces `CorruptStream`.
    pub fn read(reader: &mut impl Read, config: OctreeConfig) -> Result<Self> {
        let stride = config.brick_shape.element_count();
        let snapshot = codec::read(reader, stride)?;
        let node_pool = NodePool::new();
        node_pool.replace_with(snapshot.nodes.into_iter().map(super::node::Node::from_raw).collect());
        let brick_pool = BrickPool::new(stride);
        brick_pool.replace_with(snapshot.bricks);
        Ok(Self {
            center: snapshot.center,
            size: snapshot.size,
            node_pool,
            brick_pool,
            free_node_blocks: FreeList::new(),
            free_brick_blocks: FreeList::new(),
            config,
        })
    }
}
