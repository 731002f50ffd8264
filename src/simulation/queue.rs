//! Pending packet queue.
//!
//! A `BinaryHeap` with reversed ordering acts as a min-heap keyed by
//! `(arrival_round, packet id)`. Packet ids grow in send order, so packets
//! due in the same round drain in the order they were sent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::{NodeId, Packet, Round};

#[derive(Debug, Clone)]
struct Queued(Packet);

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl Queued {
    fn key(&self) -> (Round, u64) {
        (self.0.arrival_round, self.0.id.raw())
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: smallest key on top
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PacketQueue {
    heap: BinaryHeap<Queued>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: Packet) {
        self.heap.push(Queued(packet));
    }

    /// Earliest packet without removing it.
    pub fn peek(&self) -> Option<&Packet> {
        self.heap.peek().map(|q| &q.0)
    }

    pub fn pop_next(&mut self) -> Option<Packet> {
        self.heap.pop().map(|q| q.0)
    }

    /// Remove every packet due at or before `round`, in delivery order.
    pub fn drain_due(&mut self, round: Round) -> Vec<Packet> {
        let mut due = Vec::new();
        while self.peek().is_some_and(|p| p.arrival_round <= round) {
            if let Some(packet) = self.pop_next() {
                due.push(packet);
            }
        }
        due
    }

    /// Discard every packet sent by or addressed to `node`. Returns how many
    /// were dropped.
    pub fn remove_involving(&mut self, node: NodeId) -> usize {
        let before = self.heap.len();
        self.heap.retain(|q| q.0.sender != node && q.0.receiver != node);
        before - self.heap.len()
    }

    /// In-flight packets in delivery order.
    pub fn in_flight(&self) -> Vec<&Packet> {
        let mut packets: Vec<&Queued> = self.heap.iter().collect();
        packets.sort_by(|a, b| b.cmp(a));
        packets.into_iter().map(|q| &q.0).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
