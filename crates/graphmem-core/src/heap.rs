//! Closed-form heap size estimation.
//!
//! Self-accounting collections compute their footprint from these functions
//! rather than measuring themselves. The formulas must stay in lockstep with
//! the backing storage layout: a `Box<[T]>` or `Vec<T>` owns exactly
//! `len * size_of::<T>()` heap bytes, and the owning struct contributes its
//! shallow size.
//!
//! All arithmetic is widened to `u128` before multiplying, so no length/width
//! pair representable in `usize` can wrap. Results saturate into `u64`, which
//! is unreachable for any allocation the platform can actually make.

use std::mem::size_of;

/// Heap bytes of a contiguous array of `len` elements, each `width` bytes.
pub const fn array_heap_size(len: usize, width: usize) -> u64 {
    let bytes = len as u128 * width as u128;
    if bytes > u64::MAX as u128 {
        u64::MAX
    } else {
        bytes as u64
    }
}

/// Heap bytes of an `i64` array. Hash-table capacities are bounded by `u32`,
/// which keeps the result exact.
pub const fn long_array_heap_size(len: u32) -> u64 {
    array_heap_size(len as usize, size_of::<i64>())
}

/// Inline size of a value of type `T`, i.e. what the struct itself contributes
/// when it is counted as part of a collection's footprint.
pub const fn shallow_size_of<T>() -> u64 {
    size_of::<T>() as u64
}
