//! First-fit allocator for element ranges inside a growable array.
//!
//! Ranges are sized exactly to the request and never move once handed out.
//! Freed ranges are merged with their neighbours and reused by later
//! requests before the array's untouched tail.

use std::ops::Range;

/// Tracks free element ranges in `0..capacity`.
#[derive(Debug, Clone)]
pub struct RangeAllocator {
    capacity: u32,
    /// Sorted, non-overlapping, non-adjacent free ranges.
    free: Vec<Range<u32>>,
}

impl RangeAllocator {
    /// Create an allocator with everything in `0..capacity` free.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            free: if capacity > 0 { vec![0..capacity] } else { Vec::new() },
        }
    }

    /// Total number of elements managed.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of free elements.
    pub fn free_count(&self) -> u32 {
        self.free.iter().map(|r| r.end - r.start).sum()
    }

    /// Length of the largest free range.
    pub fn largest_free(&self) -> u32 {
        self.free.iter().map(|r| r.end - r.start).max().unwrap_or(0)
    }

    /// Allocate `count` contiguous elements from the lowest fitting range.
    ///
    /// A zero-length request always succeeds with an empty range at 0.
    /// Returns `None` if no free range is large enough; call
    /// [`grow`](Self::grow) and retry.
    pub fn allocate(&mut self, count: u32) -> Option<Range<u32>> {
        if count == 0 {
            return Some(0..0);
        }
        let index = self.free.iter().position(|r| r.end - r.start >= count)?;
        let range = &mut self.free[index];
        let start = range.start;
        range.start += count;
        if range.is_empty() {
            self.free.remove(index);
        }
        Some(start..start + count)
    }

    /// Return a range handed out by [`allocate`](Self::allocate).
    pub fn free(&mut self, range: Range<u32>) {
        if range.is_empty() {
            return;
        }
        debug_assert!(range.end <= self.capacity, "range {range:?} out of bounds");
        let index = self.free.partition_point(|r| r.start < range.start);
        debug_assert!(
            index == 0 || self.free[index - 1].end <= range.start,
            "range {range:?} freed twice"
        );

        let merges_prev = index > 0 && self.free[index - 1].end == range.start;
        let merges_next = index < self.free.len() && self.free[index].start == range.end;
        match (merges_prev, merges_next) {
            (true, true) => {
                self.free[index - 1].end = self.free[index].end;
                self.free.remove(index);
            }
            (true, false) => self.free[index - 1].end = range.end,
            (false, true) => self.free[index].start = range.start,
            (false, false) => self.free.insert(index, range),
        }
    }

    /// Extend the managed space to `new_capacity` elements.
    ///
    /// Existing allocations are untouched; the new tail becomes free.
    pub fn grow(&mut self, new_capacity: u32) {
        if new_capacity <= self.capacity {
            return;
        }
        let tail = self.capacity..new_capacity;
        self.capacity = new_capacity;
        self.free(tail);
    }
}
