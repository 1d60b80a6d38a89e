//! Sparse voxel octree: parallel construction, view-dependent refinement,
//! frustum-culled enumeration, and binary serialization over a
//! pointer-compressed, bit-packed node pool with bricked leaves.

pub mod core;
pub mod math;
pub mod voxel;
