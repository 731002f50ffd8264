//! Node actors: engine-side state, behavior hooks and the hook context.
//!
//! A node never touches another node. Everything it wants to say goes into
//! its outbox through [`NodeContext`] and is merged into the packet queue by
//! the simulation after the round.

use std::any::Any;
use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::common::geometry::Position;

use super::models::ModelKind;
use super::types::{Destination, Inbox, NodeId, Outgoing, Round};

/// `Created → Initialized → Active → Removed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Created,
    Initialized,
    Active,
    Removed,
}

/// What the engine and the models know about a node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeState {
    pub id: NodeId,
    pub kind: String,
    pub position: Position,
    /// Out-neighbors as of the last connectivity refresh.
    pub neighbors: BTreeSet<NodeId>,
    pub lifecycle: Lifecycle,
    pub added_round: Round,
}

impl NodeState {
    pub fn new(id: NodeId, kind: impl Into<String>, position: Position, added_round: Round) -> Self {
        NodeState {
            id,
            kind: kind.into(),
            position,
            neighbors: BTreeSet::new(),
            lifecycle: Lifecycle::Created,
            added_round,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Initialized | Lifecycle::Active)
    }
}

/// Handle passed to every hook. Gives read access to the node's view of the
/// world and collects outgoing messages.
pub struct NodeContext<'a> {
    pub(crate) id: NodeId,
    pub(crate) round: Round,
    pub(crate) position: Position,
    pub(crate) neighbors: &'a BTreeSet<NodeId>,
    pub(crate) outbox: &'a mut Vec<Outgoing>,
}

impl NodeContext<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn neighbors(&self) -> &BTreeSet<NodeId> {
        self.neighbors
    }

    pub fn is_neighbor(&self, other: NodeId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Unicast over an edge. Dropped as not connected if `to` is not an
    /// out-neighbor when the round's sends are merged.
    pub fn send(&mut self, to: NodeId, payload: impl Into<Value>) {
        self.push(Destination::Node(to), payload.into(), false);
    }

    /// Unicast that ignores the neighbor graph. Interference and
    /// reliability still apply.
    pub fn send_direct(&mut self, to: NodeId, payload: impl Into<Value>) {
        self.push(Destination::Node(to), payload.into(), true);
    }

    /// One copy per current out-neighbor.
    pub fn broadcast(&mut self, payload: impl Into<Value>) {
        self.push(Destination::Broadcast, payload.into(), false);
    }

    /// Sends queued so far in this round.
    pub fn pending_sends(&self) -> usize {
        self.outbox.len()
    }

    fn push(&mut self, destination: Destination, payload: Value, direct: bool) {
        self.outbox.push(Outgoing {
            destination,
            payload,
            direct,
        });
    }
}

/// Behavior of a simulated node. Every hook defaults to doing nothing.
///
/// Per round the engine calls `pre_step`, `handle_messages` and `post_step`
/// in that order. `init` runs exactly once, when the node is added.
pub trait NodeBehavior {
    /// Registry name of the behavior, e.g. `"flooding"`.
    fn kind(&self) -> &str;

    /// Validated before activation. An `Err` keeps the node out of the
    /// simulation and is reported as an activation failure.
    fn check_requirements(&self) -> Result<(), String> {
        Ok(())
    }

    fn init(&mut self, _ctx: &mut NodeContext) {}

    fn pre_step(&mut self, _ctx: &mut NodeContext) {}

    fn handle_messages(&mut self, _ctx: &mut NodeContext, _inbox: &Inbox) {}

    fn post_step(&mut self, _ctx: &mut NodeContext) {}

    /// The mobility model moved the node away from `previous`.
    fn on_reposition(&mut self, _ctx: &mut NodeContext, _previous: Position) {}

    /// The out-neighbor set changed since the previous refresh.
    fn on_neighborhood_change(&mut self, _ctx: &mut NodeContext, _added: &[NodeId], _removed: &[NodeId]) {}

    fn on_model_change(&mut self, _kind: ModelKind, _old: &str, _new: &str) {}

    /// Serializable view of the node's own state for trace export.
    fn trace_state(&self) -> Value {
        Value::Null
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Engine-owned record of one node: state, behavior, inbox and pending sends.
pub(crate) struct NodeSlot {
    pub(crate) state: NodeState,
    pub(crate) behavior: Box<dyn NodeBehavior>,
    pub(crate) inbox: Inbox,
    pub(crate) outbox: Vec<Outgoing>,
}

impl NodeSlot {
    pub(crate) fn new(state: NodeState, behavior: Box<dyn NodeBehavior>) -> Self {
        NodeSlot {
            state,
            behavior,
            inbox: Inbox::new(),
            outbox: Vec::new(),
        }
    }

    /// Run `hook` with a context borrowing this slot's state and outbox.
    pub(crate) fn with_context<R>(
        &mut self,
        round: Round,
        hook: impl FnOnce(&mut dyn NodeBehavior, &mut NodeContext, &Inbox) -> R,
    ) -> R {
        let NodeSlot {
            state,
            behavior,
            inbox,
            outbox,
        } = self;
        let mut ctx = NodeContext {
            id: state.id,
            round,
            position: state.position,
            neighbors: &state.neighbors,
            outbox,
        };
        hook(behavior.as_mut(), &mut ctx, inbox)
    }
}
