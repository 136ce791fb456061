//! HNSW insert and search benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kombu_hnsw::{HnswIndex, HnswParams};
use kombu_vector::{Distance, Vector, VectorId, VectorStore};
use std::sync::Arc;

fn generate_vectors(n: usize, dims: usize) -> Vec<(VectorId, Vector)> {
    (0..n)
        .map(|i| {
            let data: Vec<f32> = (0..dims).map(|j| ((i * j) % 100) as f32 / 100.0).collect();
            (i as VectorId, Vector::new(data))
        })
        .collect()
}

fn params() -> HnswParams {
    HnswParams {
        distance: Distance::Euclidean,
        ..HnswParams::default()
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_build");
    group.sample_size(10);

    for n in [100, 1000].iter() {
        let vectors = generate_vectors(*n, 128);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| {
                let store = Arc::new(VectorStore::new());
                store.upsert(black_box(vectors.clone()));
                let index = HnswIndex::new(Arc::downgrade(&store), params());
                index.rebuild().unwrap();
                index
            })
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_search");

    for n in [1000, 10000].iter() {
        let store = Arc::new(VectorStore::new());
        store.upsert(generate_vectors(*n, 128));
        let index = HnswIndex::new(Arc::downgrade(&store), params());
        index.rebuild().unwrap();

        let query = Vector::new((0..128).map(|i| i as f32 / 128.0).collect());

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| index.search_knn(black_box(&query), 10).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
