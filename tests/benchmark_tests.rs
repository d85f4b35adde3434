//! Performance benchmarks for hot paths in the authority and client

use client::reconciler::Reconciler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use server::authority::{Authority, WorldConfig};
use shared::{
    select_kind, HeightField, ItemState, KindCatalog, Packet, ParticipantState, RollingTerrain,
    Vec3,
};
use std::collections::BTreeMap;
use std::time::Instant;

/// Benchmarks rarity-weighted kind selection
#[test]
fn benchmark_select_kind() {
    let catalog = KindCatalog::standard();
    let mut rng = StdRng::seed_from_u64(1);
    let rolls: Vec<f64> = (0..100_000).map(|_| rng.gen()).collect();

    let start = Instant::now();
    let mut total_value = 0i64;
    for r in &rolls {
        total_value += select_kind(&catalog, *r).value as i64;
    }
    let duration = start.elapsed();

    println!(
        "Kind selection: {} draws in {:?} ({:.2} ns/draw), total value {}",
        rolls.len(),
        duration,
        duration.as_nanos() as f64 / rolls.len() as f64,
        total_value
    );

    // Should complete in under 100ms for 100k draws
    assert!(duration.as_millis() < 100);
}

/// Benchmarks terrain height queries used at placement and by movement
#[test]
fn benchmark_terrain_height() {
    let terrain = RollingTerrain::new(7);
    let iterations = 100_000;

    let start = Instant::now();
    let mut sum = 0.0f32;
    for i in 0..iterations {
        let x = (i % 360) as f32 - 180.0;
        let z = (i / 360) as f32 - 180.0;
        sum += terrain.height_at(x, z);
    }
    let duration = start.elapsed();

    println!(
        "Terrain height: {} queries in {:?} (checksum {:.1})",
        iterations, duration, sum
    );
    assert!(sum.is_finite());
    assert!(duration.as_millis() < 500);
}

/// Benchmarks claim handling across a large pool
#[test]
fn benchmark_claim_throughput() {
    let config = WorldConfig {
        item_count: 10_000,
        seed: Some(3),
        ..WorldConfig::default()
    };
    let mut authority = Authority::from_config(&config);
    authority.on_join(1, "Bench").unwrap();

    let start = Instant::now();
    for item_id in 0..10_000 {
        authority.handle(1, Packet::CollectIntent { item_id }, 0);
    }
    let duration = start.elapsed();

    println!(
        "Claims: 10000 in {:?} ({:.2} μs/claim)",
        duration,
        duration.as_micros() as f64 / 10_000.0
    );

    assert_eq!(authority.pool().available_count(), 0);
    assert_eq!(authority.roster().get(1).unwrap().inventory.values().sum::<u32>(), 10_000);
    assert!(duration.as_millis() < 1000);

    let start = Instant::now();
    let respawned = authority.on_timer(u64::MAX);
    println!("Respawn sweep: {} items in {:?}", respawned.len(), start.elapsed());
    assert_eq!(respawned.len(), 10_000);
}

/// Benchmarks encoding of a full join snapshot
#[test]
fn benchmark_snapshot_encoding() {
    let items: Vec<ItemState> = (0..200)
        .map(|id| ItemState {
            id,
            position: Vec3::new(id as f32, 0.1, -(id as f32)),
            kind: "Chanterelle".to_string(),
            value: 5,
            color: 0xFFD700,
            collected: id % 3 == 0,
        })
        .collect();
    let participants: Vec<ParticipantState> = (1..=64)
        .map(|id| ParticipantState {
            id,
            name: format!("Forager{}", id),
            position: Vec3::new(0.0, 1.6, 0.0),
            orientation: Vec3::ZERO,
            score: id as i32,
            inventory: BTreeMap::from([("Common".to_string(), id)]),
        })
        .collect();
    let snapshot = Packet::InitSnapshot {
        self_id: 64,
        participants,
        items,
    };

    let iterations = 1_000;
    let start = Instant::now();
    let mut bytes = 0;
    for _ in 0..iterations {
        bytes = snapshot.encode().unwrap().len();
    }
    let duration = start.elapsed();

    println!(
        "Snapshot encoding: {} bytes, {} iterations in {:?}",
        bytes, iterations, duration
    );
    assert!(bytes < shared::framing::MAX_FRAME_PAYLOAD as usize);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks the client applying a burst of relayed poses
#[test]
fn benchmark_reconciler_pose_burst() {
    let mut reconciler = Reconciler::new();
    let participants = (1..=16)
        .map(|id| ParticipantState {
            id,
            name: format!("Forager{}", id),
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            score: 0,
            inventory: BTreeMap::new(),
        })
        .collect();
    reconciler.apply(Packet::InitSnapshot {
        self_id: 1,
        participants,
        items: Vec::new(),
    });

    let iterations = 100_000u32;
    let start = Instant::now();
    for i in 0..iterations {
        reconciler.apply(Packet::ParticipantPose {
            id: 2 + i % 15,
            position: Vec3::new(i as f32, 1.6, 0.0),
            orientation: Vec3::ZERO,
        });
        if i % 16 == 0 {
            reconciler.interpolate_remotes(shared::REMOTE_SMOOTHING);
        }
    }
    let duration = start.elapsed();

    println!("Pose burst: {} packets in {:?}", iterations, duration);
    assert_eq!(reconciler.remotes().count(), 15);
    assert!(duration.as_millis() < 1000);
}
