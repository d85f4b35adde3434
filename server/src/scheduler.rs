//! Deadline-ordered queue of pending respawns.
//!
//! Time is plain milliseconds since the authority started, supplied by the
//! caller. The transport loop feeds wall-clock time; tests feed whatever
//! virtual time they like.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    deadline: u64,
    seq: u64,
    item_id: u32,
}

#[derive(Debug, Default)]
pub struct RespawnScheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl RespawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, item_id: u32, deadline: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            deadline,
            seq,
            item_id,
        }));
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Removes and returns every item whose deadline is at or before `now`,
    /// earliest first. Equal deadlines come out in scheduling order.
    pub fn pop_due(&mut self, now: u64) -> Vec<u32> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.queue.peek() {
            if entry.deadline > now {
                break;
            }
            due.push(entry.item_id);
            self.queue.pop();
        }
        due
    }

    /// Earliest pending deadline for `item_id`, if any.
    pub fn deadline_for(&self, item_id: u32) -> Option<u64> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.item_id == item_id)
            .map(|Reverse(entry)| entry.deadline)
            .min()
    }

    pub fn is_pending(&self, item_id: u32) -> bool {
        self.deadline_for(item_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
