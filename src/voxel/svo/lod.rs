//! Distance-to-required-extent policy driving builder subdivision and
//! updater refine/coarsen decisions.

/// Six-band step table: `required_extent` returns the smallest extent in
/// this table whose upper distance bound exceeds the query distance.
pub const DEFAULT_EXTENTS: [f32; 6] = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0];

/// Distance upper bounds paired index-for-index with [`DEFAULT_EXTENTS`].
/// Matches `streaming/lod.rs`'s `LOD_DISTANCES` banding convention: the
/// last band is unbounded.
pub const DEFAULT_DISTANCES: [f32; 6] = [8.0, 16.0, 32.0, 64.0, 128.0, f32::MAX];

/// A monotone (non-decreasing) step function from observer distance to the
/// required node extent at that distance, overridable via [`super::config::OctreeConfig`].
#[derive(Clone, Debug)]
pub struct LodTable {
    distances: [f32; 6],
    extents: [f32; 6],
}

impl LodTable {
    /// Build a table from paired `(distance_bound, extent)` bands. Bands
    /// must already be sorted by ascending distance; the last bound should
    /// be `f32::MAX` so every distance resolves to some extent.
    pub fn new(distances: [f32; 6], extents: [f32; 6]) -> Self {
        Self { distances, extents }
    }

    /// `requiredExtent(distance)` from SPEC_FULL §4.3: the extent of the
    /// first band whose distance bound exceeds `distance`. Left-closed,
    /// matching `streaming/lod.rs::lod_from_distance`'s `distance < max_dist`
    /// comparison (§9 open question, resolved in DESIGN.md).
    pub fn required_extent(&self, distance: f32) -> f32 {
        for (bound, extent) in self.distances.iter().zip(self.extents.iter()) {
            if distance < *bound {
                return *extent;
            }
        }
        *self.extents.last().unwrap()
    }
}

impl Default for LodTable {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCES, DEFAULT_EXTENTS)
    }
}
