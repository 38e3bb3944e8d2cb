use criterion::{criterion_group, criterion_main, Criterion};
use graphmem::{
    HeapTrackingArrayList, HeapTrackingLongHashSet, LocalMemoryTracker, MemoryGroup, MemoryPools,
    MemoryTracker,
};
use std::hint::black_box;

fn bench_tracker_small_allocations(c: &mut Criterion) {
    let pools = MemoryPools::new();
    let pool = pools.pool(MemoryGroup::Transaction, 0, None);

    c.bench_function("tracker_allocate_release_64b", |b| {
        let tracker = LocalMemoryTracker::new(pool.clone());
        b.iter(|| {
            tracker.allocate_heap(black_box(64)).unwrap();
            tracker.release_heap(black_box(64));
        })
    });
}

fn bench_long_hash_set_insert(c: &mut Criterion) {
    let pools = MemoryPools::new();
    let pool = pools.pool(MemoryGroup::Query, 0, None);

    c.bench_function("long_hash_set_insert_10k", |b| {
        let tracker = LocalMemoryTracker::new(pool.clone());
        b.iter(|| {
            let mut set = HeapTrackingLongHashSet::new(&tracker).unwrap();
            for i in 0..10_000i64 {
                set.add(black_box(i)).unwrap();
            }
            black_box(set.len());
        })
    });
}

fn bench_array_list_push(c: &mut Criterion) {
    let pools = MemoryPools::new();
    let pool = pools.pool(MemoryGroup::Query, 0, None);

    c.bench_function("array_list_push_10k", |b| {
        let tracker = LocalMemoryTracker::new(pool.clone());
        b.iter(|| {
            let mut list = HeapTrackingArrayList::new(&tracker).unwrap();
            for i in 0..10_000u64 {
                list.push(black_box(i)).unwrap();
            }
            black_box(list.len());
        })
    });
}

criterion_group!(
    benches,
    bench_tracker_small_allocations,
    bench_long_hash_set_insert,
    bench_array_list_push
);
criterion_main!(benches);
