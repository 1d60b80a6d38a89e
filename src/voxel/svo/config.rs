//! Construction-time tunables threaded explicitly into `Octree::new`,
//! never read from globals or the environment.

use super::lod::LodTable;

/// Which dense brick layout a tree uses, fixed for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrickShape {
    /// `N^3` 32-bit packed-color words.
    Color { side: usize },
    /// 8x8x8 occupancy bits packed into 8 `u64` words (`N=8` fixed), stored
    /// as 16 `u32` words (2 per `u64`).
    Occupancy,
}

impl BrickShape {
    /// Words per brick (`BRICK_ELEMENT_COUNT`), which the codec and brick
    /// pool must agree on. For `Occupancy` this is the `u32` word count
    /// (16), not the `u64` count (8) — `brick.rs::build_occupancy_brick`
    /// splits each `u64` into two `u32`s before storing.
    pub fn element_count(self) -> usize {
        match self {
            BrickShape::Color { side } => side * side * side,
            BrickShape::Occupancy => 16,
        }
    }
}

impl Default for BrickShape {
    fn default() -> Self {
        BrickShape::Color { side: 8 }
    }
}

/// Construction-time tunables for one `Octree`. `Default` gives the common
/// case: 8-sided color bricks, the six-band LOD table, no pool caps,
/// hardware-parallelism worker count.
#[derive(Clone, Debug)]
pub struct OctreeConfig {
    pub brick_shape: BrickShape,
    pub lod_table: LodTable,
    /// `None` means unbounded; exceeding a configured cap surfaces
    /// `OctreeError::PoolExhausted`.
    pub max_nodes: Option<u32>,
    pub max_bricks: Option<u32>,
    /// `None` defers to `rayon`'s global thread pool / hardware parallelism.
    pub worker_threads: Option<usize>,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            brick_shape: BrickShape::default(),
            lod_table: LodTable::default(),
            max_nodes: None,
            max_bricks: None,
            worker_threads: None,
        }
    }
}
