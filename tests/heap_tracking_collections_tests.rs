//! Exact accounting of self-tracking collections against a pool

use graphmem::{HeapTrackingArrayList, HeapTrackingLongHashSet, LocalMemoryTracker};
use graphmem::{MemoryGroup, MemoryPool, MemoryPools, MemoryTracker};
use graphmem_core::heap::long_array_heap_size;
use std::mem::size_of;
use std::sync::Arc;

fn setup() -> (MemoryPools, Arc<MemoryPool>, LocalMemoryTracker) {
    let pools = MemoryPools::new();
    let pool = pools.pool(MemoryGroup::Transaction, 0, None);
    let tracker = LocalMemoryTracker::new(Arc::clone(&pool));
    (pools, pool, tracker)
}

// Deep size: the set struct itself plus its slot table.
fn measure_set(set: &HeapTrackingLongHashSet<'_>) -> u64 {
    (size_of::<HeapTrackingLongHashSet<'_>>() + set.table_len() * size_of::<i64>()) as u64
}

fn measure_list<T: Copy>(list: &HeapTrackingArrayList<'_, T>) -> u64 {
    (size_of::<HeapTrackingArrayList<'_, T>>() + list.capacity() * size_of::<T>()) as u64
}

#[test]
fn calculate_empty_size() {
    let (_pools, pool, tracker) = setup();
    assert_eq!(tracker.estimated_heap_memory(), 0);
    assert_eq!(pool.used_heap(), 0);

    let set = HeapTrackingLongHashSet::new(&tracker).unwrap();
    assert_eq!(tracker.estimated_heap_memory(), measure_set(&set));

    set.close();
    assert_eq!(tracker.estimated_heap_memory(), 0);
}

#[test]
fn react_to_growth() {
    let (_pools, pool, tracker) = setup();
    let mut set = HeapTrackingLongHashSet::new(&tracker).unwrap();
    assert_eq!(tracker.estimated_heap_memory(), measure_set(&set));

    let mut last = tracker.estimated_heap_memory();
    for i in 0..200 {
        set.add(i).unwrap();
        let now = tracker.estimated_heap_memory();
        assert!(now >= last);
        assert_eq!(now, measure_set(&set));
        assert!(pool.used_heap() >= now);
        last = now;
    }
    assert_eq!(set.len(), 200);

    set.close();
    assert_eq!(tracker.estimated_heap_memory(), 0);

    tracker.reset();
    assert_eq!(pool.used_heap(), 0);
}

#[test]
fn handle_large_arrays_without_overflowing() {
    assert!(long_array_heap_size(268_435_455) > 0);
    assert!(HeapTrackingLongHashSet::footprint(1 << 30) > 0);
}

#[test]
fn several_collections_share_one_tracker() {
    let (_pools, pool, tracker) = setup();
    let mut set = HeapTrackingLongHashSet::new(&tracker).unwrap();
    let mut list = HeapTrackingArrayList::new(&tracker).unwrap();

    for i in 0..300i64 {
        set.add(i * 3).unwrap();
        list.push(i).unwrap();
        assert_eq!(
            tracker.estimated_heap_memory(),
            measure_set(&set) + measure_list(&list)
        );
    }
    assert!(pool.used_heap() >= tracker.estimated_heap_memory());

    let list_bytes = measure_list(&list);
    set.close();
    assert_eq!(tracker.estimated_heap_memory(), list_bytes);
    list.close();
    assert_eq!(tracker.estimated_heap_memory(), 0);

    tracker.close();
    assert_eq!(pool.used_heap(), 0);
}

#[test]
fn growth_rejected_by_pool_unwinds_cleanly() {
    let pools = MemoryPools::new();
    let pool = pools.pool(MemoryGroup::Query, 2048, None);
    let tracker = LocalMemoryTracker::new(Arc::clone(&pool));

    let mut set = HeapTrackingLongHashSet::new(&tracker).unwrap();
    let mut inserted = 0;
    let err = loop {
        match set.add(1000 + inserted) {
            Ok(_) => inserted += 1,
            Err(e) => break e,
        }
    };
    assert!(err.is_limit_exceeded());
    assert_eq!(set.len() as i64, inserted);
    assert_eq!(tracker.estimated_heap_memory(), measure_set(&set));
    assert!(pool.used_heap() <= 2048);

    // Scope owner unwinds: drop the collection and reset the tracker.
    drop(set);
    tracker.reset();
    assert_eq!(pool.used_heap(), 0);

    // And the scope can carry on.
    let mut set = HeapTrackingLongHashSet::new(&tracker).unwrap();
    set.add(42).unwrap();
    assert_eq!(tracker.estimated_heap_memory(), measure_set(&set));
}
