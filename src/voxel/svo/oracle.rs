//! External scalar-field contract the builder/updater sample against.
//!
//! Unlike [`super::classifier::RegionClassifier`] (which this trait's shape
//! is grounded on), `VoxelData` carries no terrain-specific hints — it is a
//! two-method capability boundary: a point sample and a conservative
//! region-emptiness probe.

use glam::Vec3;

/// The region-emptiness lattice resolution used by the default
/// `is_region_empty` implementation.
const DEFAULT_LATTICE: usize = 32;

/// A scalar/color field the octree core samples against. Implementations
/// must be safe to call from multiple builder/updater worker threads.
///
/// `sample` returning `0` means empty; any nonzero value is an opaque voxel
/// word interpreted by the brick layout (color or occupancy, per
/// [`super::config::BrickShape`]).
pub trait VoxelData: Send + Sync {
    /// Sample the field at a single point.
    fn sample(&self, p: Vec3) -> u32;

    /// Conservative probe: `true` only if no nonzero sample exists anywhere
    /// in `[min, max]`. The default implementation walks a fixed lattice;
    /// override it when a cheaper exact test (e.g. an SDF bound) is
    /// available, but any override must remain conservative in the `true`
    /// direction — a region reported empty must truly be empty everywhere
    /// the builder might query within it.
    fn is_region_empty(&self, min: Vec3, max: Vec3) -> bool {
        let step = (max - min) / (DEFAULT_LATTICE - 1) as f32;
        for xi in 0..DEFAULT_LATTICE {
            for yi in 0..DEFAULT_LATTICE {
                for zi in 0..DEFAULT_LATTICE {
                    let p = min
                        + Vec3::new(step.x * xi as f32, step.y * yi as f32, step.z * zi as f32);
                    if self.sample(p) != 0 {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Procedural oracle: a solid sphere of `color` against empty background.
/// Test/example convenience standing in for a GPU-fed field.
#[derive(Clone, Copy, Debug)]
pub struct SphereField {
    pub center: Vec3,
    pub radius: f32,
    pub color: u32,
}

impl SphereField {
    pub fn new(center: Vec3, radius: f32, color: u32) -> Self {
        Self { center, radius, color }
    }
}

impl VoxelData for SphereField {
    fn sample(&self, p: Vec3) -> u32 {
        if (p - self.center).length() <= self.radius { self.color } else { 0 }
    }

    fn is_region_empty(&self, min: Vec3, max: Vec3) -> bool {
        // Conservative: the region is empty only if the *closest* point of
        // the AABB to the sphere center still lies outside the radius.
        let closest = Vec3::new(
            p_clamp(self.center.x, min.x, max.x),
            p_clamp(self.center.y, min.y, max.y),
            p_clamp(self.center.z, min.z, max.z),
        );
        (closest - self.center).length() > self.radius
    }
}

fn p_clamp(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

/// Dense-array oracle: an explicit `N^3` voxel grid fixture, for tests that
/// need to pin exact sample values rather than derive them from a formula.
#[derive(Clone, Debug)]
pub struct DenseField {
    min: Vec3,
    max: Vec3,
    dim: usize,
    samples: Vec<u32>,
}

impl DenseField {
    /// `samples` must have exactly `dim^3` entries in x-major, then y, then
    /// z order: `samples[x + dim*(y + dim*z)]`.
    pub fn new(min: Vec3, max: Vec3, dim: usize, samples: Vec<u32>) -> Self {
        debug_assert_eq!(samples.len(), dim * dim * dim);
        Self { min, max, dim, samples }
    }

    fn index_for(&self, p: Vec3) -> Option<usize> {
        let size = self.max - self.min;
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return None;
        }
        let rel = (p - self.min) / size;
        if rel.x < 0.0 || rel.x > 1.0 || rel.y < 0.0 || rel.y > 1.0 || rel.z < 0.0 || rel.z > 1.0 {
            return None;
        }
        let last = (self.dim - 1) as f32;
        let x = (rel.x * last).round() as usize;
        let y = (rel.y * last).round() as usize;
        let z = (rel.z * last).round() as usize;
        Some(x + self.dim * (y + self.dim * z))
    }
}

impl VoxelData for DenseField {
    fn sample(&self, p: Vec3) -> u32 {
        match self.index_for(p) {
            Some(i) => self.samples[i],
            None => 0,
        }
    }
}
