//! Core data types of the engine: identifiers, packets, inboxes, statistics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical clock unit. Owned and advanced only by the `Simulation`.
pub type Round = u64;

/// Stable node identity. Allocated by the simulation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Packet identity, strictly increasing in send order. Breaks ties between
/// packets that arrive in the same round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketId(u64);

impl PacketId {
    pub const fn new(raw: u64) -> Self {
        PacketId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PacketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PacketKind {
    Data,
    /// Engine-generated answer to a failed unicast.
    Nack { original: PacketId },
}

/// An addressed message in transit. Immutable once it enters the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    pub(crate) id: PacketId,
    pub(crate) sender: NodeId,
    pub(crate) receiver: NodeId,
    pub(crate) broadcast: bool,
    pub(crate) kind: PacketKind,
    pub(crate) payload: Value,
    pub(crate) origin_round: Round,
    pub(crate) arrival_round: Round,
    pub(crate) interference: f64,
}

impl Packet {
    pub fn id(&self) -> PacketId {
        self.id
    }

    pub fn sender(&self) -> NodeId {
        self.sender
    }

    pub fn receiver(&self) -> NodeId {
        self.receiver
    }

    /// Whether this copy came from a broadcast.
    pub fn is_broadcast(&self) -> bool {
        self.broadcast
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn is_nack(&self) -> bool {
        matches!(self.kind, PacketKind::Nack { .. })
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn origin_round(&self) -> Round {
        self.origin_round
    }

    pub fn arrival_round(&self) -> Round {
        self.arrival_round
    }

    /// Accumulated additive interference penalty (0 when none).
    pub fn interference(&self) -> f64 {
        self.interference
    }

    /// Rough payload size in bytes, as seen by size-aware models.
    pub fn payload_size(&self) -> usize {
        match &self.payload {
            Value::Null => 0,
            Value::String(s) => s.len(),
            other => other.to_string().len(),
        }
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_nack() { "nack" } else { "data" };
        write!(
            f,
            "{} {} {} → {} (sent {}, due {})",
            self.id, kind, self.sender, self.receiver, self.origin_round, self.arrival_round
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Node(NodeId),
    Broadcast,
}

/// A send request issued by a node hook, waiting for the end of the round.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub destination: Destination,
    pub payload: Value,
    /// Skip the edge check (still subject to interference and reliability).
    pub direct: bool,
}

/// Packets delivered to one node in the current round, in queue drain order.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    packets: Vec<Packet>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.packets.iter()
    }

    pub fn data(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(|p| !p.is_nack())
    }

    pub fn nacks(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(|p| p.is_nack())
    }

    pub(crate) fn clear(&mut self) {
        self.packets.clear();
    }

    pub(crate) fn push(&mut self, packet: Packet) {
        self.packets.push(packet);
    }
}

impl<'a> IntoIterator for &'a Inbox {
    type Item = &'a Packet;
    type IntoIter = std::slice::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.iter()
    }
}

/// Why a packet never reached the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotConnected,
    Interference,
    Unreliable,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::NotConnected => write!(f, "not connected"),
            DropReason::Interference => write!(f, "interference"),
            DropReason::Unreliable => write!(f, "unreliable link"),
        }
    }
}

/// Counters accumulated over the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub rounds: u64,
    pub events: u64,
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub dropped_not_connected: u64,
    pub dropped_interference: u64,
    pub dropped_unreliable: u64,
    pub discarded_on_removal: u64,
    pub nacks_sent: u64,
}

impl SimulationStats {
    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::NotConnected => self.dropped_not_connected += 1,
            DropReason::Interference => self.dropped_interference += 1,
            DropReason::Unreliable => self.dropped_unreliable += 1,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_not_connected + self.dropped_interference + self.dropped_unreliable
    }

    /// Fraction of sent data packets that were delivered.
    pub fn delivery_rate(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_delivered as f64 / self.packets_sent as f64
    }
}
