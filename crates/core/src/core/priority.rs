//! Priority queue for BPE merge candidates.
//!
//! Training always merges the most frequent pair; among equally frequent
//! pairs the one that occurs first in corpus scan order wins. The queue is an
//! 8-ary max-heap with lazy invalidation: updating a pair pushes a fresh entry
//! and older entries for that pair are skipped when popped.

use crate::core::merges::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// Where a pair first occurs in corpus scan order.
///
/// `word` is the index of the (first-appearance ordered) word and `offset` the
/// byte offset of the pair's left token inside that word. Ordering by
/// `(word, offset)` is the same as ordering by the running position of a full
/// left-to-right scan over every sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirstSeen {
    pub word: u32,
    pub offset: u32,
}

impl FirstSeen {
    pub fn new(word: u32, offset: u32) -> Self {
        Self { word, offset }
    }
}

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of token IDs to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
    /// Tie-break key: first occurrence in scan order
    pub first_seen: FirstSeen,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64, first_seen: FirstSeen) -> Self {
        Self {
            pair,
            count,
            first_seen,
        }
    }

    /// True if `self` should be merged before `other`.
    #[inline]
    pub fn beats(&self, other: &MergeCandidate) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

// Higher count first; on equal counts the earlier first occurrence wins.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.first_seen.cmp(&self.first_seen))
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Live (count, first_seen) per pair, used to detect stale entries
    current: AHashMap<Pair, (u64, FirstSeen)>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Push a merge candidate, superseding any earlier entry for its pair.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.current
            .insert(candidate.pair, (candidate.count, candidate.first_seen));
        self.heap.push(candidate);
    }

    /// Pop the highest priority live candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if self.current.get(&candidate.pair) == Some(&(candidate.count, candidate.first_seen))
            {
                self.current.remove(&candidate.pair);
                return Some(candidate);
            }
        }
        None
    }

    /// Drop a pair; any of its entries still in the heap become stale.
    pub fn remove(&mut self, pair: Pair) {
        self.current.remove(&pair);
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}
