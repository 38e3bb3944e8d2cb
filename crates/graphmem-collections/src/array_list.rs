//! Growable array of `Copy` values with exact heap accounting.
//!
//! Elements are `Copy`, so they own no heap of their own and the footprint is
//! `size_of::<Self>()` + `capacity * size_of::<T>()`. Capacity grows by 1.5x.
//! The tracker is charged for the requested capacity before allocating, then
//! reconciled against the capacity the allocator actually returned.

use std::fmt;
use std::mem::size_of;

use graphmem_core::error::Result;
use graphmem_core::heap::{array_heap_size, shallow_size_of};
use graphmem_core::tracker::MemoryTracker;

pub const DEFAULT_INITIAL_CAPACITY: usize = 10;

pub struct HeapTrackingArrayList<'a, T: Copy> {
    tracker: &'a dyn MemoryTracker,
    items: Vec<T>,
    reported: u64,
}

impl<'a, T: Copy> HeapTrackingArrayList<'a, T> {
    pub fn new(tracker: &'a dyn MemoryTracker) -> Result<Self> {
        Self::with_capacity(tracker, DEFAULT_INITIAL_CAPACITY)
    }

    pub fn with_capacity(tracker: &'a dyn MemoryTracker, capacity: usize) -> Result<Self> {
        let mut list = Self {
            tracker,
            items: Vec::new(),
            reported: 0,
        };
        list.charge(Self::footprint(list.items.capacity()))?;
        list.replace_storage(capacity)?;
        Ok(list)
    }

    /// Exact footprint of a list with `capacity` slots.
    pub fn footprint(capacity: usize) -> u64 {
        shallow_size_of::<Self>() + array_heap_size(capacity, size_of::<T>())
    }

    /// Bytes currently reported to the tracker.
    pub fn heap_size(&self) -> u64 {
        self.reported
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.get(index).copied()
    }

    /// Overwrite the element at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        self.items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Append `value`, growing first if full. On error the list is unchanged.
    pub fn push(&mut self, value: T) -> Result<()> {
        let cap = self.items.capacity();
        if self.items.len() == cap {
            let grown = cap.saturating_add(cap >> 1).max(cap.saturating_add(1));
            self.replace_storage(grown)?;
        }
        self.items.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Keep the first `len` elements. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Reallocate to fit the current length.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.items.capacity() > self.items.len() {
            self.replace_storage(self.items.len())?;
        }
        Ok(())
    }

    /// Remove every element and free the backing storage.
    pub fn clear(&mut self) {
        self.items = Vec::new();
        self.settle(Self::footprint(self.items.capacity()));
    }

    /// Release everything this list reported. Equivalent to dropping it.
    pub fn close(self) {}

    // Move the elements into fresh storage of `capacity` slots. Either the
    // list ends up on the new storage with an exact report, or it keeps the
    // old storage and its old report.
    fn replace_storage(&mut self, capacity: usize) -> Result<()> {
        let before = self.reported;
        self.charge(Self::footprint(capacity))?;
        let mut next = Vec::with_capacity(capacity);
        next.extend_from_slice(&self.items);
        let actual = Self::footprint(next.capacity());
        if let Err(e) = self.charge(actual) {
            self.settle(before);
            return Err(e);
        }
        self.items = next;
        self.settle(actual);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            capacity = self.items.capacity(),
            bytes = self.reported,
            "array list resized"
        );
        Ok(())
    }

    fn charge(&mut self, size: u64) -> Result<()> {
        if size > self.reported {
            self.tracker.allocate_heap(size - self.reported)?;
            self.reported = size;
        }
        Ok(())
    }

    fn settle(&mut self, size: u64) {
        if size < self.reported {
            self.tracker.release_heap(self.reported - size);
            self.reported = size;
        }
    }
}

impl<T: Copy> Drop for HeapTrackingArrayList<'_, T> {
    fn drop(&mut self) {
        if self.reported > 0 {
            self.tracker.release_heap(self.reported);
            self.reported = 0;
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for HeapTrackingArrayList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'s, T: Copy> IntoIterator for &'s HeapTrackingArrayList<'_, T> {
    type Item = &'s T;
    type IntoIter = std::slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmem_core::config::UNLIMITED;
    use graphmem_core::group::MemoryGroup;
    use graphmem_mem::{LocalMemoryTracker, MemoryPool};
    use std::sync::Arc;

    fn tracker() -> LocalMemoryTracker {
        LocalMemoryTracker::new(Arc::new(MemoryPool::new(MemoryGroup::Query, UNLIMITED, None)))
    }

    fn measure<T: Copy>(list: &HeapTrackingArrayList<'_, T>) -> u64 {
        (size_of::<HeapTrackingArrayList<'_, T>>() + list.items.capacity() * size_of::<T>())
            as u64
    }

    #[test]
    fn grows_by_half_and_stays_exact() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::<u64>::new(&tracker).unwrap();
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));
        let mut last = tracker.estimated_heap_memory();
        for i in 0..1000u64 {
            list.push(i).unwrap();
            let now = tracker.estimated_heap_memory();
            assert!(now >= last);
            assert_eq!(now, measure(&list));
            last = now;
        }
        assert_eq!(list.len(), 1000);
        assert_eq!(list.get(999), Some(999));
        assert_eq!(list.iter().sum::<u64>(), 999 * 1000 / 2);
    }

    #[test]
    fn zero_capacity_list_grows_one_at_a_time_first() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::<u32>::with_capacity(&tracker, 0).unwrap();
        assert_eq!(list.heap_size(), HeapTrackingArrayList::<u32>::footprint(0));
        list.push(7).unwrap();
        assert!(list.capacity() >= 1);
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));
    }

    #[test]
    fn set_pop_truncate() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::new(&tracker).unwrap();
        for i in 0..5i32 {
            list.push(i).unwrap();
        }
        assert_eq!(list.set(2, 20), Some(2));
        assert_eq!(list.set(9, 0), None);
        assert_eq!(list.pop(), Some(4));
        list.truncate(2);
        assert_eq!(list.as_slice(), &[0, 1]);
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));
    }

    #[test]
    fn shrink_and_clear_release_bytes() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::new(&tracker).unwrap();
        for i in 0..100u16 {
            list.push(i).unwrap();
        }
        list.truncate(3);
        list.shrink_to_fit().unwrap();
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));

        list.clear();
        assert!(list.is_empty());
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));
        assert_eq!(
            tracker.estimated_heap_memory(),
            HeapTrackingArrayList::<u16>::footprint(0)
        );
    }

    #[test]
    fn zero_sized_elements_cost_only_the_struct() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::<()>::new(&tracker).unwrap();
        for _ in 0..100 {
            list.push(()).unwrap();
        }
        assert_eq!(
            tracker.estimated_heap_memory(),
            shallow_size_of::<HeapTrackingArrayList<'_, ()>>()
        );
    }

    #[test]
    fn failed_growth_keeps_contents() {
        let limit = HeapTrackingArrayList::<u64>::footprint(DEFAULT_INITIAL_CAPACITY);
        let pool = Arc::new(MemoryPool::new(MemoryGroup::Query, limit, None));
        let tracker = LocalMemoryTracker::new(pool);
        let mut list = HeapTrackingArrayList::new(&tracker).unwrap();
        for i in 0..DEFAULT_INITIAL_CAPACITY as u64 {
            list.push(i).unwrap();
        }
        assert!(list.push(99).unwrap_err().is_limit_exceeded());
        assert_eq!(list.len(), DEFAULT_INITIAL_CAPACITY);
        assert_eq!(tracker.estimated_heap_memory(), measure(&list));
    }

    #[test]
    fn close_zeroes_tracker() {
        let tracker = tracker();
        let mut list = HeapTrackingArrayList::new(&tracker).unwrap();
        list.push(1.5f64).unwrap();
        list.close();
        assert_eq!(tracker.estimated_heap_memory(), 0);
    }
}
