//! Decay sweep and opinion query benchmarks
//!
//! Run with: cargo bench --bench decay_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statecraft::core::types::CountryId;
use statecraft::diplomacy::{NullSink, OpinionModifier, RelationshipStore};
use statecraft::math::Fixed64;

const COUNTRIES: u16 = 200;

/// Store with `modifiers` modifiers spread across random pairs
fn populated_store(modifiers: usize) -> RelationshipStore {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut store = RelationshipStore::new();
    for _ in 0..modifiers {
        let a = rng.gen_range(1..COUNTRIES);
        let b = rng.gen_range(a + 1..=COUNTRIES);
        let modifier = OpinionModifier::new(
            rng.gen_range(1..=8),
            Fixed64::from_int(rng.gen_range(-50..=50)),
            rng.gen_range(0..360),
            rng.gen_range(30..=720),
        );
        let tick = modifier.applied_tick;
        store
            .add_opinion_modifier(CountryId(a), CountryId(b), modifier, tick, &mut NullSink)
            .unwrap();
    }
    store
}

fn bench_decay_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("decay_sweep");
    group.sample_size(20);

    for modifiers in [10_000usize, 100_000] {
        let store = populated_store(modifiers);
        for workers in [1usize, 4, 16] {
            group.bench_with_input(
                BenchmarkId::new(format!("{}_modifiers", modifiers), workers),
                &workers,
                |b, &workers| {
                    b.iter_batched(
                        || {
                            let mut store = store.clone();
                            store.set_decay_workers(workers);
                            store
                        },
                        |mut store| black_box(store.decay_opinion_modifiers(400)),
                        criterion::BatchSize::LargeInput,
                    )
                },
            );
        }
    }
    group.finish();
}

fn bench_get_opinion(c: &mut Criterion) {
    let store = populated_store(50_000);
    c.bench_function("get_opinion_all_pairs_of_one_country", |b| {
        b.iter(|| {
            let mut total = Fixed64::ZERO;
            for other in 2..=COUNTRIES {
                total = total.saturating_add(store.get_opinion(CountryId(1), CountryId(other), black_box(200)));
            }
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_decay_sweep, bench_get_opinion);
criterion_main!(benches);
