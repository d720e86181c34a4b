//! Collection store benchmarks
//!
//! Measures the typed layer on top of the engine:
//! - put_one: one transaction per entity
//! - get: snapshot read plus JSON decode
//! - scan: lazy sub-prefix iteration
//! - write_raw_values: raw JSON streaming without decode

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};

use seatbook_collections::{CollectionStore, Model, WriteBatch};
use seatbook_engine::Engine;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    group_id: String,
    code: String,
    price: u64,
}

impl Model for Item {
    const COLLECTION: &'static str = "items";

    fn key(&self) -> String {
        format!("{}/{}", self.group_id, self.code)
    }
}

fn seeded_store(groups: usize, per_group: usize) -> CollectionStore {
    let store = CollectionStore::new(Engine::open().unwrap());
    let mut batch = WriteBatch::new();
    for g in 0..groups {
        for i in 0..per_group {
            batch
                .add(&Item {
                    group_id: format!("g{}", g),
                    code: format!("c{:04}", i),
                    price: 10,
                })
                .unwrap();
        }
    }
    store.put(&batch).unwrap();
    store
}

fn bench_put(c: &mut Criterion) {
    let store = seeded_store(0, 0);
    let mut group = c.benchmark_group("collections_put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_one", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let item = Item {
                group_id: "bench".to_string(),
                code: format!("c{}", i),
                price: i,
            };
            store.put_one(black_box(&item)).unwrap();
            i += 1;
        });
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let store = seeded_store(10, 100);

    c.bench_function("collections_get", |b| {
        b.iter(|| {
            let item: Item = store.get(black_box("g5/c0050")).unwrap();
            black_box(item);
        });
    });
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("collections_scan");

    for per_group in [10usize, 100, 1000] {
        let store = seeded_store(4, per_group);
        group.throughput(Throughput::Elements(per_group as u64));
        group.bench_with_input(BenchmarkId::from_parameter(per_group), &per_group, |b, _| {
            b.iter(|| {
                let count = store.scan::<Item>(Some("g2")).unwrap().count();
                black_box(count);
            });
        });
    }

    group.finish();
}

fn bench_write_raw_values(c: &mut Criterion) {
    let store = seeded_store(1, 1000);
    let mut buf = Vec::with_capacity(64 * 1024);

    c.bench_function("collections_write_raw_values", |b| {
        b.iter(|| {
            buf.clear();
            let n = store.write_raw_values("items", &mut buf).unwrap();
            black_box(n);
        });
    });
}

criterion_group!(
    benches,
    bench_put,
    bench_get,
    bench_scan,
    bench_write_raw_values
);
criterion_main!(benches);
