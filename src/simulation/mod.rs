//! Simulation core.
//!
//! This module provides the complete round-based engine for distributed
//! algorithms on spatially positioned nodes. It integrates:
//! - Node actors with lifecycle hooks and a per-round inbox
//! - A directed neighbor graph derived from the connectivity model
//! - The packet pipeline: edge check, interference, reliability, delay
//! - Synchronous (per round) and asynchronous (per event) execution
//! - Trace export with cycle-breaking serialization
//!
//! ## Module Organization
//!
//! - `types`: identifiers, packets, inboxes, statistics
//! - `config`: the immutable simulation configuration record
//! - `node`: node state, the `NodeBehavior` trait and its context
//! - `builtin_nodes`: behaviors shipped with the default project
//! - `models`: model traits and built-in implementations
//! - `signal_calculations`: path loss and airtime math behind the radio models
//! - `neighbor_graph`: directed edges and their per-refresh diff
//! - `queue`: the pending packet queue
//! - `engine`: the `Simulation` itself
//! - `trace`: snapshots and the object-identity arena

pub mod builtin_nodes;
pub mod config;
pub mod engine;
pub mod models;
pub mod neighbor_graph;
pub mod node;
pub mod queue;
pub mod signal_calculations;
pub mod trace;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{AddNodes, ModelSelection, ModelSelections, SimulationConfig, SimulationMode, Toggles};
pub use engine::{AddReport, RunOutcome, Simulation, StepOutcome, StopHandle};
pub use node::{Lifecycle, NodeBehavior, NodeContext, NodeState};
pub use types::{Inbox, NodeId, Packet, PacketId, PacketKind, Round, SimulationStats};
