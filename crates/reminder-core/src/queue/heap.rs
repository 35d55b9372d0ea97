//! Time-ordered min-heap of scheduled entries.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;

use chrono::{DateTime, Utc};

use crate::domain::ScheduledEntry;

/// Heap slot.
///
/// `BinaryHeap` is a max-heap, so ordering is reversed to pop the earliest
/// `due_at` first. `seq` breaks ties in insertion order and keeps `Ord`
/// consistent with `Eq`.
#[derive(Debug)]
struct QueuedEntry {
    seq: u64,
    entry: ScheduledEntry,
}

impl QueuedEntry {
    fn key(&self) -> (DateTime<Utc>, u64) {
        (self.entry.due_at(), self.seq)
    }
}

impl PartialEq for QueuedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedEntry {}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering: earlier times have higher priority
        other.key().cmp(&self.key())
    }
}

/// Array-backed binary min-heap keyed by `due_at`.
///
/// Not synchronized; share it through [`ScheduleHandle`](super::ScheduleHandle).
#[derive(Debug, Default)]
pub struct TimeOrderedQueue {
    heap: BinaryHeap<QueuedEntry>,
    next_seq: u64,
}

impl TimeOrderedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty queue with room for `capacity` entries before the first reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// O(log n). Past due times are accepted and become due immediately.
    pub fn insert(&mut self, entry: ScheduledEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEntry { seq, entry });
    }

    pub fn peek_min(&self) -> Option<&ScheduledEntry> {
        self.heap.peek().map(|slot| &slot.entry)
    }

    /// `None` on an empty queue.
    pub fn extract_min(&mut self) -> Option<ScheduledEntry> {
        self.heap.pop().map(|slot| slot.entry)
    }

    /// Extract every entry with `due_at < as_of`, earliest first.
    ///
    /// Stops at the first root that is not due; the heap property guarantees
    /// nothing below it is due either.
    pub fn drain_due(&mut self, as_of: DateTime<Utc>) -> Vec<ScheduledEntry> {
        let mut due = Vec::new();
        while let Some(head) = self.heap.peek_mut() {
            if !head.entry.is_due(as_of) {
                break;
            }
            due.push(PeekMut::pop(head).entry);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Due times in the backing array's layout (node `i` has parent `(i - 1) / 2`).
    pub fn layout(&self) -> Vec<DateTime<Utc>> {
        self.heap.as_slice().iter().map(|slot| slot.entry.due_at()).collect()
    }

    /// Every non-root node is due no earlier than its parent.
    pub fn satisfies_heap_property(&self) -> bool {
        let layout = self.layout();
        (1..layout.len()).all(|i| layout[i] >= layout[(i - 1) / 2])
    }
}
