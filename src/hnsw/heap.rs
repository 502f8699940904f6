//! Binary heaps over `(distance, id)` pairs and the per-thread scratch pool.
//!
//! Layer search needs two queue flavors: a min-heap of candidates still to
//! expand and a max-heap of the best results so far, capped at the beam
//! width. Both are short-lived per call, so they are pooled per thread and
//! reset on acquire instead of reallocated.

use ordered_float::OrderedFloat;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::hnsw::visited::VisitedSet;

/// Heap entry ordered by distance, then id. The id tiebreak gives the heaps a
/// total order so traversal is deterministic on equal distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    distance: OrderedFloat<f32>,
    id: u32,
}

/// Min-heap over `(distance, id)`: `pop` returns the smallest distance.
#[derive(Debug, Default)]
pub struct MinDistHeap {
    items: BinaryHeap<Reverse<Entry>>,
}

impl MinDistHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, distance: f32, id: u32) {
        self.items.push(Reverse(Entry {
            distance: OrderedFloat(distance),
            id,
        }));
    }

    pub fn pop(&mut self) -> Option<(f32, u32)> {
        self.items.pop().map(|Reverse(e)| (e.distance.0, e.id))
    }

    pub fn peek(&self) -> Option<(f32, u32)> {
        self.items.peek().map(|&Reverse(e)| (e.distance.0, e.id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clears the heap without releasing its capacity.
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

/// Max-heap over `(distance, id)`: `pop` returns the largest distance.
#[derive(Debug, Default)]
pub struct MaxDistHeap {
    items: BinaryHeap<Entry>,
}

impl MaxDistHeap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, distance: f32, id: u32) {
        self.items.push(Entry {
            distance: OrderedFloat(distance),
            id,
        });
    }

    pub fn pop(&mut self) -> Option<(f32, u32)> {
        self.items.pop().map(|e| (e.distance.0, e.id))
    }

    pub fn peek(&self) -> Option<(f32, u32)> {
        self.items.peek().map(|&e| (e.distance.0, e.id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clears the heap without releasing its capacity.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Empties the heap into a vector in ascending distance order.
    pub fn drain_ascending(&mut self) -> Vec<(f32, u32)> {
        let mut out = Vec::with_capacity(self.items.len());
        while let Some(e) = self.items.pop() {
            out.push((e.distance.0, e.id));
        }
        out.reverse();
        out
    }
}

/// Transient state for one layer search: visited set plus both heaps.
///
/// Obtained from a per-thread pool via [`with_scratch`]; the search routines
/// reset every member on entry, and the borrow guard returns the scratch on
/// every exit path.
#[derive(Debug, Default)]
pub struct SearchScratch {
    pub visited: VisitedSet,
    pub candidates: MinDistHeap,
    pub nearest: MaxDistHeap,
}

impl SearchScratch {
    /// Creates an empty scratch; capacity builds up with use.
    pub fn new() -> Self {
        Self::default()
    }
}

thread_local! {
    static SCRATCH: RefCell<SearchScratch> = RefCell::new(SearchScratch::new());
}

/// Runs `f` with the calling thread's scratch pool.
pub(crate) fn with_scratch<R>(f: impl FnOnce(&mut SearchScratch) -> R) -> R {
    SCRATCH.with(|cell| f(&mut cell.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_heap_pops_ascending() {
        let mut h = MinDistHeap::new();
        h.push(3.0, 3);
        h.push(1.0, 1);
        h.push(2.0, 2);
        assert_eq!(h.len(), 3);
        assert_eq!(h.peek(), Some((1.0, 1)));
        assert_eq!(h.pop(), Some((1.0, 1)));
        assert_eq!(h.pop(), Some((2.0, 2)));
        assert_eq!(h.pop(), Some((3.0, 3)));
        assert_eq!(h.pop(), None);
    }

    #[test]
    fn test_max_heap_pops_descending() {
        let mut h = MaxDistHeap::new();
        h.push(3.0, 3);
        h.push(1.0, 1);
        h.push(2.0, 2);
        assert_eq!(h.peek(), Some((3.0, 3)));
        assert_eq!(h.pop(), Some((3.0, 3)));
        assert_eq!(h.pop(), Some((2.0, 2)));
        assert_eq!(h.pop(), Some((1.0, 1)));
        assert!(h.is_empty());
    }

    #[test]
    fn test_equal_distances_break_ties_by_id() {
        let mut min = MinDistHeap::new();
        min.push(1.0, 9);
        min.push(1.0, 4);
        assert_eq!(min.pop(), Some((1.0, 4)));

        let mut max = MaxDistHeap::new();
        max.push(1.0, 4);
        max.push(1.0, 9);
        assert_eq!(max.pop(), Some((1.0, 9)));
    }

    #[test]
    fn test_reset_keeps_heap_usable() {
        let mut h = MaxDistHeap::new();
        h.push(5.0, 0);
        h.push(7.0, 1);
        h.reset();
        assert!(h.is_empty());
        h.push(1.0, 2);
        assert_eq!(h.pop(), Some((1.0, 2)));
    }

    #[test]
    fn test_drain_ascending() {
        let mut h = MaxDistHeap::new();
        for (d, id) in [(4.0, 0), (1.0, 1), (3.0, 2), (2.0, 3)] {
            h.push(d, id);
        }
        let drained = h.drain_ascending();
        assert_eq!(drained, vec![(1.0, 1), (2.0, 3), (3.0, 2), (4.0, 0)]);
        assert!(h.is_empty());
    }

    #[test]
    fn test_with_scratch_reuses_state() {
        with_scratch(|s| {
            s.candidates.push(1.0, 0);
        });
        // A later acquisition sees whatever the last caller left; search
        // routines reset on entry, which is the discipline under test here.
        with_scratch(|s| {
            assert_eq!(s.candidates.len(), 1);
            s.candidates.reset();
        });
    }
}
