//! # Pool Benchmark
//!
//! Measures the cost of recycling scratch buffers through `ObjectPool`
//! against allocating a fresh one per message.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netbits_core::{ObjectPool, PoolConfig, Poolable};

const SCRATCH_CAPACITY: usize = 1024;

struct Scratch(Vec<u8>);

impl Poolable for Scratch {
    fn reset(&mut self) {
        self.0.clear();
    }
}

fn fill(scratch: &mut Vec<u8>) {
    for i in 0..256u32 {
        scratch.push((i & 0xFF) as u8);
    }
}

fn bench_fresh_allocation(c: &mut Criterion) {
    c.bench_function("scratch_fresh_alloc", |b| {
        b.iter(|| {
            let mut scratch = Vec::with_capacity(SCRATCH_CAPACITY);
            fill(&mut scratch);
            black_box(scratch.len())
        });
    });
}

fn bench_pooled(c: &mut Criterion) {
    let pool = ObjectPool::new(PoolConfig::default(), || {
        Scratch(Vec::with_capacity(SCRATCH_CAPACITY))
    });

    // Warm the pool
    let warm = pool.get();
    let _ = pool.put(warm);

    c.bench_function("scratch_pooled_get_put", |b| {
        b.iter(|| {
            let mut scratch = pool.get();
            fill(&mut scratch.0);
            let len = scratch.0.len();
            let _ = pool.put(scratch);
            black_box(len)
        });
    });
}

fn bench_pooled_burst(c: &mut Criterion) {
    let pool = ObjectPool::new(PoolConfig::default(), || {
        Scratch(Vec::with_capacity(SCRATCH_CAPACITY))
    });

    c.bench_function("scratch_pooled_burst_32", |b| {
        b.iter(|| {
            let held: Vec<_> = (0..32).map(|_| pool.get()).collect();
            for scratch in held {
                let _ = pool.put(scratch);
            }
            black_box(pool.available())
        });
    });
}

criterion_group!(benches, bench_fresh_allocation, bench_pooled, bench_pooled_burst);
criterion_main!(benches);
