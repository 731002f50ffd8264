//! Trace export.
//!
//! A [`TraceSnapshot`] is a plain serializable picture of one round. For
//! consumers that want an object graph (nodes pointing at their in-flight
//! packets, packets pointing back at their endpoints) the snapshot is lowered
//! into a [`TraceArena`], where objects have identities and may be shared or
//! cyclic. [`remove_circular_references`] turns such a graph back into a JSON
//! tree: the first time an object is emitted it gets the next number `N`
//! (starting at 1), and every later occurrence of the same object is written
//! as the marker string `<%Ref *N>`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::common::geometry::Position;

use super::node::Lifecycle;
use super::types::{NodeId, Packet, PacketKind, Round, SimulationStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTrace {
    pub id: NodeId,
    pub kind: String,
    pub position: Position,
    pub lifecycle: Lifecycle,
    pub neighbors: Vec<NodeId>,
    /// Behavior-defined state.
    pub state: Value,
}

/// Positions, edges and in-flight packets at the start of `round`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSnapshot {
    pub round: Round,
    pub nodes: Vec<NodeTrace>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub packets: Vec<Packet>,
    pub stats: SimulationStats,
}

impl TraceSnapshot {
    /// Object-graph rendering: each node lists the packets it sends or
    /// awaits, and each packet references both endpoint nodes.
    pub fn to_json(&self) -> Value {
        let mut arena = TraceArena::new();

        let node_objects: BTreeMap<NodeId, ObjectId> = self
            .nodes
            .iter()
            .map(|node| (node.id, arena.alloc()))
            .collect();
        let packet_objects: Vec<ObjectId> = self.packets.iter().map(|_| arena.alloc()).collect();

        for node in &self.nodes {
            let obj = node_objects[&node.id];
            arena.set(obj, "id", TraceValue::from(node.id.raw()));
            arena.set(obj, "kind", TraceValue::String(node.kind.clone()));
            let position = arena.insert_json(&to_value(&node.position));
            arena.set(obj, "position", position);
            let lifecycle = arena.insert_json(&to_value(&node.lifecycle));
            arena.set(obj, "lifecycle", lifecycle);
            let neighbors = node.neighbors.iter().map(|n| TraceValue::from(n.raw())).collect();
            arena.set(obj, "neighbors", TraceValue::Array(neighbors));
            let state = arena.insert_json(&node.state);
            arena.set(obj, "state", state);

            let in_flight = self
                .packets
                .iter()
                .zip(&packet_objects)
                .filter(|(p, _)| p.sender == node.id || p.receiver == node.id)
                .map(|(_, obj)| TraceValue::Object(*obj))
                .collect();
            arena.set(obj, "in_flight", TraceValue::Array(in_flight));
        }

        for (packet, obj) in self.packets.iter().zip(&packet_objects) {
            let obj = *obj;
            arena.set(obj, "id", TraceValue::from(packet.id.raw()));
            let kind = match packet.kind {
                PacketKind::Data => "data",
                PacketKind::Nack { .. } => "nack",
            };
            arena.set(obj, "kind", TraceValue::String(kind.to_string()));
            arena.set(obj, "broadcast", TraceValue::Bool(packet.broadcast));
            let payload = arena.insert_json(&packet.payload);
            arena.set(obj, "payload", payload);
            arena.set(obj, "origin_round", TraceValue::from(packet.origin_round));
            arena.set(obj, "arrival_round", TraceValue::from(packet.arrival_round));
            for (field, id) in [("sender", packet.sender), ("receiver", packet.receiver)] {
                let endpoint = match node_objects.get(&id) {
                    Some(node) => TraceValue::Object(*node),
                    None => TraceValue::from(id.raw()),
                };
                arena.set(obj, field, endpoint);
            }
        }

        let root = arena.alloc();
        arena.set(root, "round", TraceValue::from(self.round));
        let nodes = self.nodes.iter().map(|n| TraceValue::Object(node_objects[&n.id])).collect();
        arena.set(root, "nodes", TraceValue::Array(nodes));
        let edges = arena.insert_json(&to_value(&self.edges));
        arena.set(root, "edges", edges);
        arena.set(
            root,
            "packets",
            TraceValue::Array(packet_objects.iter().map(|o| TraceValue::Object(*o)).collect()),
        );
        let stats = arena.insert_json(&to_value(&self.stats));
        arena.set(root, "stats", stats);

        remove_circular_references(&arena, &TraceValue::Object(root))
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Index of an object in its [`TraceArena`].
pub type ObjectId = usize;

/// A JSON-like value whose objects live in an arena and are referenced by id,
/// so the same object can appear several times (or inside itself).
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<TraceValue>),
    Object(ObjectId),
}

impl From<u64> for TraceValue {
    fn from(n: u64) -> Self {
        TraceValue::Number(n.into())
    }
}

impl From<u32> for TraceValue {
    fn from(n: u32) -> Self {
        TraceValue::Number(n.into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceArena {
    objects: Vec<Vec<(String, TraceValue)>>,
}

impl TraceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty object; fill it with [`TraceArena::set`].
    pub fn alloc(&mut self) -> ObjectId {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    /// Set `key` on `object`, replacing an existing entry in place. Unknown
    /// ids are ignored.
    pub fn set(&mut self, object: ObjectId, key: &str, value: TraceValue) {
        let Some(fields) = self.objects.get_mut(object) else {
            return;
        };
        match fields.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => fields.push((key.to_string(), value)),
        }
    }

    pub fn fields(&self, object: ObjectId) -> Option<&[(String, TraceValue)]> {
        self.objects.get(object).map(Vec::as_slice)
    }

    /// Copy a JSON tree into the arena; every JSON object becomes a fresh
    /// arena object.
    pub fn insert_json(&mut self, value: &Value) -> TraceValue {
        match value {
            Value::Null => TraceValue::Null,
            Value::Bool(b) => TraceValue::Bool(*b),
            Value::Number(n) => TraceValue::Number(n.clone()),
            Value::String(s) => TraceValue::String(s.clone()),
            Value::Array(items) => TraceValue::Array(items.iter().map(|v| self.insert_json(v)).collect()),
            Value::Object(map) => {
                let obj = self.alloc();
                for (key, v) in map {
                    let inner = self.insert_json(v);
                    self.set(obj, key, inner);
                }
                TraceValue::Object(obj)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Lower an arena value to a JSON tree, replacing every repeated object
/// identity with `<%Ref *N>`.
pub fn remove_circular_references(arena: &TraceArena, root: &TraceValue) -> Value {
    let mut emitted: HashMap<ObjectId, usize> = HashMap::new();
    lower(arena, root, &mut emitted)
}

fn lower(arena: &TraceArena, value: &TraceValue, emitted: &mut HashMap<ObjectId, usize>) -> Value {
    match value {
        TraceValue::Null => Value::Null,
        TraceValue::Bool(b) => Value::Bool(*b),
        TraceValue::Number(n) => Value::Number(n.clone()),
        TraceValue::String(s) => Value::String(s.clone()),
        TraceValue::Array(items) => Value::Array(items.iter().map(|v| lower(arena, v, emitted)).collect()),
        TraceValue::Object(id) => {
            if let Some(n) = emitted.get(id) {
                return Value::String(format!("<%Ref *{}>", n));
            }
            let n = emitted.len() + 1;
            emitted.insert(*id, n);
            let mut map = Map::new();
            for (key, v) in arena.fields(*id).unwrap_or_default() {
                map.insert(key.clone(), lower(arena, v, emitted));
            }
            Value::Object(map)
        }
    }
}
