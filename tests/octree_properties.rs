//! Black-box integration tests against the public `Octree` API, covering
//! the round-trip, idempotence, convergence, and culling scenarios.

use std::io::Cursor;

use glam::{Mat4, Vec3, Vec4};

use rktri_svo::math::Frustum;
use rktri_svo::voxel::svo::{BrickShape, DenseField, Octree, OctreeConfig, SphereField};

fn open_frustum() -> Frustum {
    let proj = Mat4::orthographic_rh(-64.0, 64.0, -64.0, 64.0, 0.01, 1000.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 500.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_view_projection(&(proj * view))
}

fn voxel_key(v: &Vec4) -> (u32, u32, u32, u32) {
    (v.x.to_bits(), v.y.to_bits(), v.z.to_bits(), v.w.to_bits())
}

fn sorted_voxels(octree: &Octree, frustum: &Frustum) -> Vec<Vec4> {
    let mut voxels = octree.list_voxels(frustum);
    voxels.sort_by_key(voxel_key);
    voxels
}

/// Scenario 1: sphere field built with one worker and with eight agrees on
/// voxel count and on the radius bound for every emitted voxel.
#[test]
fn sphere_field_voxel_count_matches_across_worker_counts_and_stays_in_bounds() {
    let data = SphereField::new(Vec3::ZERO, 20.0, 1);
    let frustum = open_frustum();

    let build = |threads: usize| {
        let mut config = OctreeConfig::default();
        config.worker_threads = Some(threads);
        let octree = Octree::new(Vec3::ZERO, 32.0, config).unwrap();
        octree.generate(&data, Vec3::ZERO).unwrap();
        octree
    };

    let single = build(1);
    let many = build(8);

    assert_eq!(single.node_pools().len(), many.node_pools().len());

    let sqrt3 = 3f32.sqrt();
    for v in single.list_voxels(&frustum).iter().chain(many.list_voxels(&frustum).iter()) {
        let center = Vec3::new(v.x, v.y, v.z);
        assert!(center.length() - sqrt3 * v.w <= 20.0 + 0.5, "voxel {center:?} escapes the sphere bound");
    }
}

/// Scenario 2: a constant-color cube collapses to exactly one Leaf, no
/// bricks stored.
#[test]
fn constant_color_cube_collapses_to_one_leaf() {
    struct ConstantCube;
    impl rktri_svo::voxel::svo::VoxelData for ConstantCube {
        fn sample(&self, p: Vec3) -> u32 {
            if p.x.abs() <= 10.0 && p.y.abs() <= 10.0 && p.z.abs() <= 10.0 {
                0x00FF00
            } else {
                0
            }
        }
        fn is_region_empty(&self, min: Vec3, max: Vec3) -> bool {
            max.x < -10.0 || min.x > 10.0 || max.y < -10.0 || min.y > 10.0 || max.z < -10.0 || min.z > 10.0
        }
    }

    let mut config = OctreeConfig::default();
    config.lod_table = rktri_svo::voxel::svo::LodTable::new([f32::MAX; 6], [32.0; 6]);
    let octree = Octree::new(Vec3::ZERO, 16.0, config).unwrap();
    octree.generate(&ConstantCube, Vec3::ZERO).unwrap();

    assert_eq!(octree.brick_pools().len(), 0);
    let frustum = open_frustum();
    let voxels = octree.list_voxels(&frustum);
    assert_eq!(voxels.len(), 1);
    assert_eq!(voxels[0].w, 16.0);
}

/// Scenario 3: codec round-trip, bytewise equal pools and an identical
/// voxel multiset after deserialization.
#[test]
fn codec_round_trip_preserves_pools_and_voxels() {
    let data = SphereField::new(Vec3::ZERO, 20.0, 0x00FF00);
    let octree = Octree::new(Vec3::ZERO, 32.0, OctreeConfig::default()).unwrap();
    octree.generate(&data, Vec3::ZERO).unwrap();

    let mut buf = Vec::new();
    octree.write(&mut buf).unwrap();

    let restored = Octree::read(&mut Cursor::new(&buf), OctreeConfig::default()).unwrap();
    assert_eq!(restored.node_pools(), octree.node_pools());
    assert_eq!(restored.brick_pools(), octree.brick_pools());

    let frustum = open_frustum();
    assert_eq!(sorted_voxels(&octree, &frustum), sorted_voxels(&restored, &frustum));
}

/// Scenario 3 (file-backed variant): the same round-trip through a real
/// file on disk, via `tempfile`, rather than an in-memory buffer.
#[test]
fn codec_round_trip_through_a_real_file() {
    let data = SphereField::new(Vec3::ZERO, 12.0, 0x00FF00);
    let octree = Octree::new(Vec3::ZERO, 16.0, OctreeConfig::default()).unwrap();
    octree.generate(&data, Vec3::ZERO).unwrap();

    let mut file = tempfile::tempfile().unwrap();
    octree.write(&mut file).unwrap();

    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(0)).unwrap();

    let restored = Octree::read(&mut file, OctreeConfig::default()).unwrap();
    assert_eq!(restored.node_pools(), octree.node_pools());
    assert_eq!(restored.brick_pools(), octree.brick_pools());
}

/// Scenario 4: coarsening towards a distant observer, then updating back
/// towards the original observer, reaches a fixed point again (the
/// updater refines at most one level per call per branch, so full
/// re-convergence can take several calls — see `updater.rs`'s case table).
#[test]
fn coarsen_then_reapproach_converges_again() {
    let data = SphereField::new(Vec3::ZERO, 20.0, 0x00FF00);
    let octree = Octree::new(Vec3::ZERO, 32.0, OctreeConfig::default()).unwrap();
    octree.generate(&data, Vec3::ZERO).unwrap();

    let far_stats = octree.update(&data, Vec3::new(1000.0, 0.0, 0.0)).unwrap();
    assert!(far_stats.coarsened > 0, "moving far away should coarsen the tree built close up");

    let mut last = octree.update(&data, Vec3::ZERO).unwrap();
    for _ in 0..16 {
        let next = octree.update(&data, Vec3::ZERO).unwrap();
        if next.is_noop() {
            return;
        }
        last = next;
    }
    panic!("update did not reconverge after moving the observer back: last={last:?}");
}

/// Scenario 5: free-list reuse caps pool growth under repeated
/// refine/coarsen at the same site. `update` reads its LOD bands from the
/// `Octree`'s own stored config, so refine/coarsen is driven by moving the
/// observer near/far against a single distance-varying `lod_table` (two
/// bands: near is finest, far is coarsest), the same way the updater's own
/// unit test alternates configs but without needing to swap the octree's
/// config out from under it.
#[test]
fn repeated_refine_coarsen_does_not_grow_pools_unbounded() {
    let mut config = OctreeConfig::default();
    config.lod_table = rktri_svo::voxel::svo::LodTable::new([4.0, f32::MAX, f32::MAX, f32::MAX, f32::MAX, f32::MAX], [0.5, 32.0, 32.0, 32.0, 32.0, 32.0]);
    // A sphere boundary inside the root cube (half-extent 8) so some nodes
    // resolve heterogeneous and actually exercise the brick free list, not
    // just the node free list.
    let data = SphereField::new(Vec3::ZERO, 5.0, 0x00FF00);
    let octree = Octree::new(Vec3::ZERO, 8.0, config).unwrap();

    // Build near (finest resolution), so the first coarsen pass below has
    // something to reclaim.
    octree.generate(&data, Vec3::ZERO).unwrap();
    octree.update(&data, Vec3::ZERO).unwrap();

    let near = Vec3::ZERO;
    let far = Vec3::new(1000.0, 0.0, 0.0);
    let peak_nodes = octree.node_pools().len();
    let peak_bricks = octree.brick_pools().len();

    for _ in 0..100 {
        octree.update(&data, far).unwrap();
        octree.update(&data, near).unwrap();
    }

    assert!(octree.node_pools().len() <= peak_nodes + 128, "node pool grew without bound under repeated refine/coarsen");
    assert!(octree.brick_pools().len() <= peak_bricks + 128, "brick pool grew without bound under repeated refine/coarsen");

    // The free lists themselves must stabilize once the refine/coarsen
    // cycle has reached its steady-state shape, not merely grow forever in
    // lockstep with the (bounded) pools.
    let free_nodes_before = octree.free_node_count();
    let free_bricks_before = octree.free_brick_count();
    for _ in 0..10 {
        octree.update(&data, far).unwrap();
        octree.update(&data, near).unwrap();
    }
    assert_eq!(octree.free_node_count(), free_nodes_before, "free node-block list should have stabilized");
    assert_eq!(octree.free_brick_count(), free_bricks_before, "free brick list should have stabilized");
}

/// Scenario 6: a frustum tilted to one side of the root only emits voxels
/// from that side, modulo the one-cell border the spec allows.
#[test]
fn lopsided_frustum_only_emits_voxels_from_its_half() {
    let data = SphereField::new(Vec3::ZERO, 1000.0, 0x00FF00);
    let mut config = OctreeConfig::default();
    config.lod_table = rktri_svo::voxel::svo::LodTable::new([f32::MAX; 6], [8.0; 6]);
    let octree = Octree::new(Vec3::ZERO, 16.0, config).unwrap();
    octree.generate(&data, Vec3::ZERO).unwrap();

    // Same eye/up convention as `open_frustum` (looking down -Z from a
    // distant +Z eye, so view-space x/y line up with world x/y), but with
    // asymmetric bounds that only admit the +x, +y half of the root cube.
    let proj = Mat4::orthographic_rh(-1.0, 100.0, -1.0, 100.0, 0.01, 20_000.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5000.0), Vec3::ZERO, Vec3::Y);
    let frustum = Frustum::from_view_projection(&(proj * view));

    let all_voxels = octree.list_voxels(&open_frustum());
    let half_voxels = octree.list_voxels(&frustum);

    assert!(!half_voxels.is_empty());
    assert!(half_voxels.len() < all_voxels.len());
    // "Modulo the one-cell border": a voxel straddling the cut plane may
    // still be emitted, but no emitted voxel can lie entirely on the far
    // (excluded) side of it.
    for v in &half_voxels {
        assert!(v.x + v.w >= -1.0 && v.y + v.w >= -1.0, "voxel {v:?} lies entirely outside the culled +x+y half");
    }
}

/// Scenario 7: a truncated stream surfaces `CorruptStream`, and an
/// over-tight `max_nodes` surfaces `PoolExhausted`.
#[test]
fn truncated_stream_and_exhausted_pool_surface_typed_errors() {
    let data = SphereField::new(Vec3::ZERO, 12.0, 0x00FF00);
    let octree = Octree::new(Vec3::ZERO, 16.0, OctreeConfig::default()).unwrap();
    octree.generate(&data, Vec3::ZERO).unwrap();

    let mut buf = Vec::new();
    octree.write(&mut buf).unwrap();
    buf.truncate(buf.len() - 4);
    let err = Octree::read(&mut Cursor::new(&buf), OctreeConfig::default()).unwrap_err();
    assert!(matches!(err, rktri_svo::voxel::svo::OctreeError::CorruptStream(_)));

    let mut tight_config = OctreeConfig::default();
    tight_config.max_nodes = Some(2);
    let tight = Octree::new(Vec3::ZERO, 1000.0, tight_config).unwrap();
    let big_field = SphereField::new(Vec3::ZERO, 900.0, 0x00FF00);
    let err = tight.generate(&big_field, Vec3::ZERO).unwrap_err();
    assert!(matches!(err, rktri_svo::voxel::svo::OctreeError::PoolExhausted { .. }));
}

/// Scenario 8: the didactic single-threaded builder agrees with the
/// parallel builder on the voxel multiset for the same field.
#[test]
fn cpu_builder_agrees_with_parallel_builder() {
    let mut config = OctreeConfig::default();
    config.lod_table = rktri_svo::voxel::svo::LodTable::new([f32::MAX; 6], [1.0; 6]);
    config.brick_shape = BrickShape::Color { side: 4 };
    let data = SphereField::new(Vec3::ZERO, 6.0, 0x00FF00);

    let dense = Octree::new(Vec3::ZERO, 8.0, config.clone()).unwrap();
    dense.build_dense(&data).unwrap();

    let parallel = Octree::new(Vec3::ZERO, 8.0, config).unwrap();
    parallel.generate(&data, Vec3::ZERO).unwrap();

    let frustum = open_frustum();
    assert_eq!(sorted_voxels(&dense, &frustum), sorted_voxels(&parallel, &frustum));
}

/// A dense grid-backed field round-trips through the same API as the
/// analytic sphere, exercising `DenseField` end to end.
#[test]
fn dense_field_builds_and_enumerates() {
    let mut samples = vec![0u32; 64];
    samples[0] = 0x00FF00;
    let field = DenseField::new(Vec3::splat(-2.0), Vec3::splat(2.0), 4, samples);

    let octree = Octree::new(Vec3::ZERO, 4.0, OctreeConfig::default()).unwrap();
    octree.generate(&field, Vec3::ZERO).unwrap();

    let frustum = open_frustum();
    assert!(!octree.list_voxels(&frustum).is_empty());
}
