//! Open-addressing `i64` set with exact heap accounting.
//!
//! Layout: one boxed `i64` slice whose length is a power of two. Slot value
//! `EMPTY` (0) marks a free slot and `REMOVED` (1) a tombstone; the real keys
//! 0 and 1 live in a two-bit field instead. Data plus tombstones never exceed
//! half the table, so linear probing always reaches an empty slot.
//!
//! Footprint = `size_of::<Self>()` + `table.len() * 8`. Table length only
//! changes on growth, `compact()` and `clear()`.

use std::fmt;

use graphmem_core::error::Result;
use graphmem_core::heap::{long_array_heap_size, shallow_size_of};
use graphmem_core::tracker::MemoryTracker;

const EMPTY: i64 = 0;
const REMOVED: i64 = 1;

pub const DEFAULT_INITIAL_CAPACITY: usize = 8;
const MIN_TABLE_LEN: usize = 4;
const MAX_TABLE_LEN: usize = 1 << 30;

pub struct HeapTrackingLongHashSet<'a> {
    tracker: &'a dyn MemoryTracker,
    table: Box<[i64]>,
    occupied_with_data: usize,
    occupied_with_sentinels: usize,
    // bit 0: key 0 present, bit 1: key 1 present
    sentinel_keys: u8,
    reported: u64,
}

fn spread(key: i64) -> u64 {
    let mut x = key as u64;
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

fn is_sentinel(key: i64) -> bool {
    key == EMPTY || key == REMOVED
}

fn table_len_for(capacity: usize) -> usize {
    let wanted = capacity
        .checked_mul(2)
        .filter(|&n| n <= MAX_TABLE_LEN)
        .unwrap_or_else(|| panic!("HeapTrackingLongHashSet capacity overflow: {capacity}"));
    wanted.next_power_of_two().max(MIN_TABLE_LEN)
}

impl<'a> HeapTrackingLongHashSet<'a> {
    pub fn new(tracker: &'a dyn MemoryTracker) -> Result<Self> {
        Self::with_capacity(tracker, DEFAULT_INITIAL_CAPACITY)
    }

    /// Set sized to hold `capacity` keys before its first growth.
    ///
    /// # Panics
    /// If the table would need more than 2^30 slots.
    pub fn with_capacity(tracker: &'a dyn MemoryTracker, capacity: usize) -> Result<Self> {
        let len = table_len_for(capacity);
        let size = Self::footprint(len);
        tracker.allocate_heap(size)?;
        Ok(Self {
            tracker,
            table: vec![EMPTY; len].into_boxed_slice(),
            occupied_with_data: 0,
            occupied_with_sentinels: 0,
            sentinel_keys: 0,
            reported: size,
        })
    }

    /// Exact footprint of a set whose table has `table_len` slots.
    pub fn footprint(table_len: usize) -> u64 {
        debug_assert!(table_len <= MAX_TABLE_LEN);
        shallow_size_of::<Self>() + long_array_heap_size(table_len as u32)
    }

    /// Bytes currently reported to the tracker.
    pub fn heap_size(&self) -> u64 {
        self.reported
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    pub fn len(&self) -> usize {
        self.occupied_with_data + self.sentinel_keys.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: i64) -> bool {
        if is_sentinel(key) {
            return self.sentinel_keys & (1 << key) != 0;
        }
        self.probe(key).0
    }

    /// Insert `key`; `Ok(false)` if it was already present. On error the set
    /// is unchanged.
    pub fn add(&mut self, key: i64) -> Result<bool> {
        if is_sentinel(key) {
            let bit = 1u8 << key;
            let fresh = self.sentinel_keys & bit == 0;
            self.sentinel_keys |= bit;
            return Ok(fresh);
        }
        let (found, mut slot) = self.probe(key);
        if found {
            return Ok(false);
        }
        if self.table[slot] == EMPTY && self.occupied() + 1 > self.max_occupied() {
            self.rehash_and_grow()?;
            slot = self.probe(key).1;
        }
        if self.table[slot] == REMOVED {
            self.occupied_with_sentinels -= 1;
        }
        self.table[slot] = key;
        self.occupied_with_data += 1;
        Ok(true)
    }

    pub fn remove(&mut self, key: i64) -> bool {
        if is_sentinel(key) {
            let bit = 1u8 << key;
            let present = self.sentinel_keys & bit != 0;
            self.sentinel_keys &= !bit;
            return present;
        }
        let (found, slot) = self.probe(key);
        if found {
            self.table[slot] = REMOVED;
            self.occupied_with_data -= 1;
            self.occupied_with_sentinels += 1;
        }
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        [EMPTY, REMOVED]
            .into_iter()
            .filter(move |&k| self.sentinel_keys & (1 << k) != 0)
            .chain(self.table.iter().copied().filter(|&k| !is_sentinel(k)))
    }

    /// Rebuild into the smallest table that holds the current keys, dropping
    /// tombstones.
    pub fn compact(&mut self) {
        let len = table_len_for(self.occupied_with_data).min(self.table.len());
        if len < self.table.len() || self.occupied_with_sentinels > 0 {
            self.rehash(len);
            self.settle();
        }
    }

    /// Remove every key and shrink back to the default table.
    pub fn clear(&mut self) {
        self.sentinel_keys = 0;
        self.occupied_with_data = 0;
        self.occupied_with_sentinels = 0;
        let len = table_len_for(DEFAULT_INITIAL_CAPACITY).min(self.table.len());
        if len == self.table.len() {
            self.table.fill(EMPTY);
        } else {
            self.table = vec![EMPTY; len].into_boxed_slice();
            self.settle();
        }
    }

    /// Release everything this set reported. Equivalent to dropping it.
    pub fn close(self) {}

    fn occupied(&self) -> usize {
        self.occupied_with_data + self.occupied_with_sentinels
    }

    fn max_occupied(&self) -> usize {
        self.table.len() >> 1
    }

    // Returns (found, slot): the key's slot if found, otherwise the first
    // tombstone on the probe path or the terminating empty slot.
    fn probe(&self, key: i64) -> (bool, usize) {
        let mask = self.table.len() - 1;
        let mut idx = spread(key) as usize & mask;
        let mut tombstone = None;
        loop {
            match self.table[idx] {
                k if k == key => return (true, idx),
                EMPTY => return (false, tombstone.unwrap_or(idx)),
                REMOVED => {
                    tombstone.get_or_insert(idx);
                }
                _ => {}
            }
            idx = (idx + 1) & mask;
        }
    }

    // Live keys below 3/4 of the occupancy cap: the table is clogged with
    // tombstones, rebuild at the same size. Otherwise double.
    fn rehash_and_grow(&mut self) -> Result<()> {
        let len = self.table.len();
        let new_len = if self.occupied_with_data * 4 < self.max_occupied() * 3 {
            len
        } else {
            len.checked_mul(2)
                .filter(|&n| n <= MAX_TABLE_LEN)
                .unwrap_or_else(|| panic!("HeapTrackingLongHashSet capacity overflow: {len}"))
        };
        let size = Self::footprint(new_len);
        if size > self.reported {
            self.tracker.allocate_heap(size - self.reported)?;
            self.reported = size;
        }
        self.rehash(new_len);
        Ok(())
    }

    fn rehash(&mut self, new_len: usize) {
        let old = std::mem::replace(&mut self.table, vec![EMPTY; new_len].into_boxed_slice());
        self.occupied_with_sentinels = 0;
        let mask = new_len - 1;
        for key in old.iter().copied().filter(|&k| !is_sentinel(k)) {
            let mut idx = spread(key) as usize & mask;
            while self.table[idx] != EMPTY {
                idx = (idx + 1) & mask;
            }
            self.table[idx] = key;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            from = old.len(),
            to = new_len,
            keys = self.occupied_with_data,
            "long hash set rehashed"
        );
    }

    // Report any shrinkage of the table to the tracker.
    fn settle(&mut self) {
        let size = Self::footprint(self.table.len());
        if size < self.reported {
            self.tracker.release_heap(self.reported - size);
            self.reported = size;
        }
    }
}

impl Drop for HeapTrackingLongHashSet<'_> {
    fn drop(&mut self) {
        if self.reported > 0 {
            self.tracker.release_heap(self.reported);
            self.reported = 0;
        }
    }
}

impl fmt::Debug for HeapTrackingLongHashSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
