//! Round-based simulator for distributed algorithms on spatially placed,
//! wirelessly connected nodes.
//!
//! A [`Simulation`] owns the nodes, the neighbor graph and the packet queue,
//! and runs every packet through the pluggable models of its
//! [`ModelSet`](simulation::models::ModelSet): connectivity, interference,
//! reliability and transmission delay. Node behaviors and models are looked
//! up by name in a [`Registry`] of projects, each entry with a parameter
//! schema. [`control::Pacer`] adds real-time pacing on top.

pub mod common;
pub mod control;
pub mod error;
pub mod registry;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use registry::{Project, Registry};
pub use simulation::{
    AddNodes, AddReport, ModelSelection, NodeBehavior, NodeContext, NodeId, RunOutcome, Simulation,
    SimulationConfig, SimulationMode, StepOutcome,
};
