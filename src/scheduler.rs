use std::cmp::{Eq, Ordering, PartialEq};
use std::collections::BinaryHeap;

use crate::event::*;

// Departures sort ahead of arrivals at the same instant so a freed server is
// visible to an arrival that lands on the same tick.
fn kind_rank(kind: EventKind) -> u8 {
    match kind {
        EventKind::Departure => 0,
        EventKind::Arrival => 1,
    }
}

struct ScheduledEvent {
    event: Event,
    seq: u64,
}

impl ScheduledEvent {
    fn key(&self) -> (u64, u8, u64) {
        (self.event.time, kind_rank(self.event.kind), self.seq)
    }
}

// BinaryHeap is a max-heap, so the ordering is reversed to pop the earliest
// (time, kind, seq) first.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key()).reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScheduledEvent {}

/// Time-ordered queue of pending events.
///
/// Events pop by ascending `time`. At equal times departures come before
/// arrivals, and events of the same kind come out in the order they were
/// pushed. The sequence number stamped on push makes every entry distinct,
/// so the order is total and identical across repeated runs.
#[derive(Default)]
pub struct EventScheduler {
    heap: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
    departures: usize,
}

impl EventScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if event.kind == EventKind::Departure {
            self.departures += 1;
        }
        self.heap.push(ScheduledEvent { event, seq });
    }

    pub fn pop(&mut self) -> Option<Event> {
        let event = self.heap.pop()?.event;
        if event.kind == EventKind::Departure {
            self.departures -= 1;
        }
        Some(event)
    }

    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|scheduled| &scheduled.event)
    }

    /// Time of the head event, i.e. the next value of the simulation clock.
    pub fn next_time(&self) -> Option<u64> {
        self.peek().map(|event| event.time)
    }

    /// Number of departures still waiting to fire.
    pub fn pending_departures(&self) -> usize {
        self.departures
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Extend<Event> for EventScheduler {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}
