//! Error taxonomy for octree construction, update, and persistence.

use thiserror::Error;

/// Failure modes surfaced by the octree core. Every fallible entry point
/// returns this instead of panicking on caller-supplied data.
#[derive(Debug, Error)]
pub enum OctreeError {
    /// Codec reader hit truncation or an impossible count before finishing.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// An optional `max_nodes`/`max_bricks` cap was hit during build/update.
    #[error("pool exhausted: {resource} limit {limit} reached ({observed} in use)")]
    PoolExhausted {
        resource: &'static str,
        limit: u32,
        observed: u32,
    },

    /// Bad input: negative size, infeasible root, or similar.
    #[error("precondition violation: {0}")]
    PreconditionViolation(String),

    /// The caller-supplied `VoxelData` oracle panicked during a callback.
    #[error("oracle fault: {0}")]
    OracleFault(String),

    /// Underlying IO failure while reading or writing the codec's stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// `Result` alias used throughout the octree core.
pub type Result<T> = std::result::Result<T, OctreeError>;
