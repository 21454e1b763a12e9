//! # ECS Performance Benchmark
//!
//! Entity creation, component attachment and joins over an arena-backed
//! world.
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{define_component, Ecs, EntityHandle};

/// Entity count for the steady-state benchmarks.
const ENTITY_COUNT: u32 = 100_000;

/// Arena size, comfortably above what `ENTITY_COUNT` entities need.
const ARENA_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

define_component!(Position, 1);
define_component!(Velocity, 2);

/// Spawns `count` entities; every one gets a position, every other one a velocity.
fn populate(ecs: &mut Ecs<'_>, count: u32) -> Vec<EntityHandle> {
    (0..count)
        .map(|i| {
            let entity = ecs.new_entity().expect("capacity");
            #[allow(clippy::cast_precision_loss)]
            let f = i as f32;
            ecs.insert_component(entity, Position { x: f, y: f, z: f })
                .expect("arena");
            if i % 2 == 0 {
                ecs.insert_component(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 })
                    .expect("arena");
            }
            entity
        })
        .collect()
}

/// Benchmark: Create N entities in a fresh world.
fn bench_spawn_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_entities");
    let mut buffer = vec![0u8; ARENA_BYTES];

    for count in [10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ecs = Ecs::new(&mut buffer, count).expect("world");
                for _ in 0..count {
                    black_box(ecs.new_entity().expect("capacity"));
                }
                ecs.live_entities()
            });
        });
    }

    group.finish();
}

/// Benchmark: Create entities and attach components.
fn bench_add_components(c: &mut Criterion) {
    let mut buffer = vec![0u8; ARENA_BYTES];

    c.bench_function("add_components_100K", |b| {
        b.iter(|| {
            let mut ecs = Ecs::new(&mut buffer, ENTITY_COUNT).expect("world");
            black_box(populate(&mut ecs, ENTITY_COUNT).len())
        });
    });
}

/// Benchmark: Single-component and two-component joins.
fn bench_for_each(c: &mut Criterion) {
    let mut buffer = vec![0u8; ARENA_BYTES];
    let mut ecs = Ecs::new(&mut buffer, ENTITY_COUNT).expect("world");
    populate(&mut ecs, ENTITY_COUNT);

    let mut group = c.benchmark_group("for_each");

    group.bench_function("position_100K", |b| {
        b.iter(|| {
            ecs.for_each::<(Position,), _>(|_, (pos,)| pos.x += 0.001)
                .expect("query");
            black_box(ecs.component_count::<Position>())
        });
    });

    group.bench_function("position_velocity_50K", |b| {
        b.iter(|| {
            ecs.for_each::<(Position, Velocity), _>(|_, (pos, vel)| {
                pos.x += vel.x * 0.016;
                pos.y += vel.y * 0.016;
                pos.z += vel.z * 0.016;
            })
            .expect("query");
            black_box(ecs.component_count::<Velocity>())
        });
    });

    group.finish();
}

/// Benchmark: Remove and recreate entities, exercising both free lists.
fn bench_remove_recreate_cycle(c: &mut Criterion) {
    let mut buffer = vec![0u8; ARENA_BYTES];
    let mut ecs = Ecs::new(&mut buffer, ENTITY_COUNT).expect("world");
    let mut entities = populate(&mut ecs, ENTITY_COUNT);

    c.bench_function("remove_recreate_cycle_10K", |b| {
        b.iter(|| {
            for entity in entities.iter_mut().step_by(10) {
                ecs.remove_entity(*entity);
                *entity = ecs.new_entity().expect("capacity");
                ecs.insert_component(*entity, Position::default())
                    .expect("arena");
            }
            black_box(ecs.live_entities())
        });
    });
}

criterion_group!(
    benches,
    bench_spawn_entities,
    bench_add_components,
    bench_for_each,
    bench_remove_recreate_cycle,
);

criterion_main!(benches);
