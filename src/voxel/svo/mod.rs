//! Sparse Voxel Octree: construction, view-dependent refinement, frustum
//! culling, and binary serialization over a pointer-compressed, bit-packed
//! node pool with bricked leaves.

pub mod brick;
pub mod builder;
pub mod codec;
pub mod color;
pub mod config;
pub mod cpu_builder;
pub mod enumerate;
pub mod error;
pub mod lod;
pub mod node;
pub mod octree;
pub mod oracle;
pub mod pool;
pub mod updater;

pub use builder::BuildStats;
pub use config::{BrickShape, OctreeConfig};
pub use error::{OctreeError, Result};
pub use lod::LodTable;
pub use node::{Node, NodeKind, DIRECTIONS};
pub use octree::Octree;
pub use oracle::{DenseField, SphereField, VoxelData};
pub use pool::{BrickPool, FreeList, NodePool};
pub use updater::UpdateStats;
