//! Error types for the Rktri engine

use thiserror::Error;

/// Top-level error type for crate entry points that sit above the octree
/// core's own [`crate::voxel::svo::OctreeError`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("voxel error: {0}")]
    Voxel(#[from] crate::voxel::svo::OctreeError),
}
