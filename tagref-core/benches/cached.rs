//! Benchmarks for cached property reads and tag validation.
//!
//! Run with: cargo bench -p tagref-core --bench cached

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tagref_core::{combine, Env, Object, Ref, RootReference, Tag, Value};

/// Build a chain of nested objects `depth` levels deep and return the root
/// plus the innermost object.
fn nested(env: &Env, depth: usize) -> (Object, Object) {
    let root = env.object();
    let mut current = root.clone();
    for _ in 0..depth {
        let child = env.object();
        current.set("next", Value::Object(child.clone()));
        current = child;
    }
    current.set("leaf", Value::from(1));
    (root, current)
}

fn path(env: &Env, root: Object, depth: usize) -> Ref {
    let mut reference: Ref = Arc::new(RootReference::new(env, root));
    for _ in 0..depth {
        reference = reference.get("next");
    }
    reference.get("leaf")
}

fn bench_valid_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/valid");

    for depth in [1, 4, 16] {
        let env = Env::default();
        let (root, _) = nested(&env, depth);
        let leaf = path(&env, root, depth);
        leaf.value();

        group.bench_with_input(BenchmarkId::new("read", depth), &(), |b, _| {
            b.iter(|| black_box(leaf.value()))
        });
    }

    group.finish();
}

fn bench_recompute_after_dirty(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/dirty");

    for depth in [1, 4, 16] {
        let env = Env::default();
        let (root, innermost) = nested(&env, depth);
        let leaf = path(&env, root, depth);
        let mut n = 0;

        group.bench_with_input(BenchmarkId::new("read", depth), &(), |b, _| {
            b.iter(|| {
                n += 1;
                innermost.set("leaf", Value::from(n));
                black_box(leaf.value())
            })
        });
    }

    group.finish();
}

fn bench_combined_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag/combined_validate");

    for width in [2, 8, 32] {
        let env = Env::default();
        let inputs: Vec<Tag> = (0..width).map(|_| Tag::dirtyable(env.clock())).collect();
        let combined = combine(inputs);
        let seen = combined.value();

        group.bench_with_input(BenchmarkId::new("validate", width), &(), |b, _| {
            b.iter(|| black_box(combined.validate(seen)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_valid_reads,
    bench_recompute_after_dirty,
    bench_combined_validate
);
criterion_main!(benches);
