//! Frustum-culled voxel extraction (SPEC_FULL §4.6).
//!
//! BFS with the same two-frontier shape as the builder; culls against
//! `math/frustum.rs::Frustum::intersects_aabb` (reused unmodified) and
//! emits `(center, half_extent)` records through a single mutex, matching
//! the original source's `ParallelOctree::ListVoxels`/`ListVoxelsFromBrick`.

use std::sync::Mutex;

use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::math::{Aabb, Frustum};

use super::brick::{brick_side, voxel_at};
use super::config::BrickShape;
use super::node::{NodeKind, DIRECTIONS};
use super::pool::{BrickPool, NodePool};

#[derive(Clone, Copy, Debug)]
struct FrontierItem {
    center: Vec3,
    node_index: u32,
    half_extent: f32,
}

/// Walk the tree rooted at `(root_center, root_half_extent)`, culling
/// against `frustum`, and return one `(center.xyz, half_extent)` record
/// (packed as a `Vec4`) per resolved voxel.
pub fn list_voxels(
    root_center: Vec3,
    root_half_extent: f32,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    brick_shape: BrickShape,
    frustum: &Frustum,
) -> Vec<Vec4> {
    let emissions: Mutex<Vec<Vec4>> = Mutex::new(Vec::new());
    let mut frontier = vec![FrontierItem { center: root_center, node_index: 0, half_extent: root_half_extent }];

    while !frontier.is_empty() {
        let next: Vec<FrontierItem> = frontier
            .par_iter()
            .flat_map_iter(|item| visit(item, node_pool, brick_pool, brick_shape, frustum, &emissions))
            .collect();
        frontier = next;
    }

    emissions.into_inner().unwrap()
}

fn visit(
    item: &FrontierItem,
    node_pool: &NodePool,
    brick_pool: &BrickPool,
    brick_shape: BrickShape,
    frustum: &Frustum,
    emissions: &Mutex<Vec<Vec4>>,
) -> Vec<FrontierItem> {
    let aabb = Aabb::from_center_half_extent(item.center, Vec3::splat(item.half_extent));
    if !frustum.intersects_aabb(&aabb) {
        return Vec::new();
    }

    let node = node_pool.get(item.node_index);
    match node.kind() {
        NodeKind::InternalLeaf => Vec::new(),
        NodeKind::Internal => {
            let child_block = node.payload();
            let child_half_extent = item.half_extent / 2.0;
            DIRECTIONS
                .iter()
                .enumerate()
                .map(|(i, dir)| FrontierItem {
                    center: item.center + dir.as_vec3() * child_half_extent,
                    node_index: child_block + i as u32,
                    half_extent: child_half_extent,
                })
                .collect()
        }
        NodeKind::Leaf => {
            emissions.lock().unwrap().push(Vec4::new(item.center.x, item.center.y, item.center.z, item.half_extent));
            Vec::new()
        }
        NodeKind::LeafWithBrick => {
            emit_brick_voxels(item, node.payload(), brick_pool, brick_shape, emissions);
            Vec::new()
        }
    }
}

fn emit_brick_voxels(
    item: &FrontierItem,
    brick_index: u32,
    brick_pool: &BrickPool,
    brick_shape: BrickShape,
    emissions: &Mutex<Vec<Vec4>>,
) {
    let words = brick_pool.read_at(brick_index);
    let side = brick_side(brick_shape);
    let min = item.center - Vec3::splat(item.half_extent);
    let unit_half = item.half_extent / side as f32;
    let mut local = Vec::new();
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                if voxel_at(&words, brick_shape, side, x, y, z) != 0 {
                    let offset = Vec3::new(x as f32, y as f32, z as f32) * (2.0 * unit_half) + Vec3::splat(unit_half);
                    let center = min + offset;
                    local.push(Vec4::new(center.x, center.y, center.z, unit_half));
                }
            }
        }
    }
    if !local.is_empty() {
        emissions.lock().unwrap().extend(local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::svo::builder;
    use crate::voxel::svo::config::OctreeConfig;
    use crate::voxel::svo::oracle::SphereField;
    use glam::Mat4;

    fn open_frustum() -> Frustum {
        let proj = Mat4::orthographic_rh(-10_000.0, 10_000.0, -10_000.0, 10_000.0, 0.01, 20_000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5000.0), Vec3::ZERO, Vec3::Y);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_empty_tree_emits_nothing() {
        let node_pool = NodePool::new();
        let brick_pool = BrickPool::new(512);
        let frustum = open_frustum();
        let voxels = list_voxels(Vec3::ZERO, 8.0, &node_pool, &brick_pool, BrickShape::default(), &frustum);
        assert!(voxels.is_empty());
    }

    #[test]
    fn test_constant_field_emits_one_leaf_voxel() {
        let node_pool = NodePool::new();
        let brick_pool = BrickPool::new(512);
        let mut config = OctreeConfig::default();
        config.lod_table = crate::voxel::svo::lod::LodTable::new([f32::MAX; 6], [32.0; 6]);
        struct ConstantField;
        impl crate::voxel::svo::oracle::VoxelData for ConstantField {
            fn sample(&self, _p: Vec3) -> u32 {
                0x00FF00
            }
            fn is_region_empty(&self, _min: Vec3, _max: Vec3) -> bool {
                false
            }
        }
        builder::generate(Vec3::ZERO, 8.0, &node_pool, &brick_pool, &config, &ConstantField, Vec3::ZERO).unwrap();

        let frustum = open_frustum();
        let voxels = list_voxels(Vec3::ZERO, 8.0, &node_pool, &brick_pool, config.brick_shape, &frustum);
        assert_eq!(voxels.len(), 1);
        assert_eq!(voxels[0], Vec4::new(0.0, 0.0, 0.0, 8.0));
    }

    #[test]
    fn test_sphere_field_voxels_stay_within_radius_bound() {
        let node_pool = NodePool::new();
        let brick_pool = BrickPool::new(512);
        let config = OctreeConfig::default();
        let data = SphereField::new(Vec3::ZERO, 20.0, 1);
        builder::generate(Vec3::ZERO, 32.0, &node_pool, &brick_pool, &config, &data, Vec3::ZERO).unwrap();

        let frustum = open_frustum();
        let voxels = list_voxels(Vec3::ZERO, 32.0, &node_pool, &brick_pool, config.brick_shape, &frustum);
        let sqrt3 = 3f32.sqrt();
        for v in &voxels {
            let center = Vec3::new(v.x, v.y, v.z);
            assert!(center.length() - sqrt3 * v.w <= 20.0 + 0.5, "voxel at {center:?} too far from sphere");
        }
    }
}
