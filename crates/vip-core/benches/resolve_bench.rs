//! Benchmarks for tier resolution.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vip_core::{TierDefinition, TierTable, resolve};

fn wide_table(tiers: u32) -> TierTable {
    let defs = (0..tiers)
        .map(|level| TierDefinition::new(level, format!("Tier{level}"), u64::from(level) * 1_000))
        .collect();
    TierTable::new(defs).unwrap_or_default()
}

fn bench_resolve(c: &mut Criterion) {
    let default_table = TierTable::default();
    c.bench_function("resolve_default_table", |b| {
        b.iter(|| resolve(black_box(42_000), black_box(&default_table)));
    });

    let wide = wide_table(256);
    c.bench_function("resolve_256_tiers", |b| {
        b.iter(|| resolve(black_box(128_500), black_box(&wide)));
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
