//! Pluggable physical models.
//!
//! The engine depends only on the traits below, never on a concrete model.
//! Concrete implementations are produced by the registry from a project's
//! catalog and grouped into a [`ModelSet`].
//!
//! | Slot | Trait | Decides |
//! |---|---|---|
//! | connectivity | [`ConnectivityModel`] | which directed edges exist |
//! | mobility | [`MobilityModel`] | where a node moves each round |
//! | interference | [`InterferenceModel`] | whether a packet is disturbed |
//! | reliability | [`ReliabilityModel`] | whether a packet survives the link |
//! | transmission | [`TransmissionModel`] | how many rounds a packet travels |
//! | distribution | [`DistributionModel`] | where new nodes are placed |

pub mod connectivity;
pub mod distribution;
pub mod interference;
pub mod mobility;
pub mod reliability;
pub mod transmission;

use serde::Serialize;

use crate::common::geometry::{Bounds, Position};
use crate::common::random::SimRng;

use super::node::NodeState;
use super::types::{NodeId, Packet, Round};

pub use connectivity::{LineOfSight, QuasiUnitDiskGraph, UnitDiskGraph};
pub use distribution::{FixedPositions, GridDistribution, LineDistribution, RandomDistribution};
pub use interference::{NoInterference, RandomInterference, SinrInterference};
pub use mobility::{NoMobility, RandomWalk, RandomWaypoint};
pub use reliability::{LossyDelivery, PathLossReliability, ReliableDelivery};
pub use transmission::{AirtimeTransmission, ConstantTime, DistanceTime, RandomTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Connectivity,
    Mobility,
    Interference,
    Reliability,
    Transmission,
    Distribution,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Connectivity,
        ModelKind::Mobility,
        ModelKind::Interference,
        ModelKind::Reliability,
        ModelKind::Transmission,
        ModelKind::Distribution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Connectivity => "connectivity",
            ModelKind::Mobility => "mobility",
            ModelKind::Interference => "interference",
            ModelKind::Reliability => "reliability",
            ModelKind::Transmission => "transmission",
            ModelKind::Distribution => "distribution",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sender transmitting during the round being merged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transmission {
    pub sender: NodeId,
    pub position: Position,
}

/// Everything a packet-level model may look at besides the packet itself.
#[derive(Debug, Clone, Copy)]
pub struct Link<'a> {
    pub sender: &'a NodeState,
    pub receiver: &'a NodeState,
    pub round: Round,
    /// All transmitters of the round, the packet's own sender included.
    pub concurrent: &'a [Transmission],
}

impl Link<'_> {
    pub fn distance(&self) -> f64 {
        self.sender.position.distance(&self.receiver.position)
    }
}

/// Directed edge test. Must be a pure function of the two nodes.
pub trait ConnectivityModel {
    fn name(&self) -> &str;
    fn is_connected(&self, from: &NodeState, to: &NodeState) -> bool;
}

pub trait MobilityModel {
    fn name(&self) -> &str;

    /// New position of `node` for `round`. Results outside `bounds` are a
    /// fatal contract violation.
    fn next_position(&mut self, node: &NodeState, round: Round, bounds: &Bounds, rng: &mut SimRng) -> Position;

    /// Drop any per-node state kept for a removed node.
    fn forget(&mut self, _node: NodeId) {}
}

pub trait InterferenceModel {
    fn name(&self) -> &str;

    fn is_disturbed(&self, packet: &Packet, link: &Link, rng: &mut SimRng) -> bool;

    /// Penalty accumulated on the packet in additive mode.
    fn disturbance(&self, packet: &Packet, link: &Link, rng: &mut SimRng) -> f64 {
        if self.is_disturbed(packet, link, rng) { 1.0 } else { 0.0 }
    }
}

pub trait ReliabilityModel {
    fn name(&self) -> &str;
    fn reaches_destination(&self, packet: &Packet, link: &Link, rng: &mut SimRng) -> bool;
}

pub trait TransmissionModel {
    fn name(&self) -> &str;

    /// Rounds between send and delivery. Zero is a contract violation.
    fn time_to_reach(&self, packet: &Packet, link: &Link, rng: &mut SimRng) -> u64;
}

pub trait DistributionModel {
    fn name(&self) -> &str;

    /// One position per new node, all inside `bounds`.
    fn positions(&mut self, bounds: &Bounds, count: usize, rng: &mut SimRng) -> Vec<Position>;
}

/// The models a simulation runs with, one per slot.
pub struct ModelSet {
    pub connectivity: Box<dyn ConnectivityModel>,
    pub mobility: Box<dyn MobilityModel>,
    pub interference: Box<dyn InterferenceModel>,
    pub reliability: Box<dyn ReliabilityModel>,
    pub transmission: Box<dyn TransmissionModel>,
    pub distribution: Box<dyn DistributionModel>,
}

impl ModelSet {
    pub fn name_of(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Connectivity => self.connectivity.name(),
            ModelKind::Mobility => self.mobility.name(),
            ModelKind::Interference => self.interference.name(),
            ModelKind::Reliability => self.reliability.name(),
            ModelKind::Transmission => self.transmission.name(),
            ModelKind::Distribution => self.distribution.name(),
        }
    }

    pub fn with_connectivity(mut self, model: impl ConnectivityModel + 'static) -> Self {
        self.connectivity = Box::new(model);
        self
    }

    pub fn with_mobility(mut self, model: impl MobilityModel + 'static) -> Self {
        self.mobility = Box::new(model);
        self
    }

    pub fn with_interference(mut self, model: impl InterferenceModel + 'static) -> Self {
        self.interference = Box::new(model);
        self
    }

    pub fn with_reliability(mut self, model: impl ReliabilityModel + 'static) -> Self {
        self.reliability = Box::new(model);
        self
    }

    pub fn with_transmission(mut self, model: impl TransmissionModel + 'static) -> Self {
        self.transmission = Box::new(model);
        self
    }

    pub fn with_distribution(mut self, model: impl DistributionModel + 'static) -> Self {
        self.distribution = Box::new(model);
        self
    }
}

impl Default for ModelSet {
    /// UDG radius 10, static nodes, no interference, reliable links,
    /// one-round delay, uniform random placement.
    fn default() -> Self {
        ModelSet {
            connectivity: Box::new(UnitDiskGraph::new(10.0)),
            mobility: Box::new(NoMobility),
            interference: Box::new(NoInterference),
            reliability: Box::new(ReliableDelivery),
            transmission: Box::new(ConstantTime::new(1)),
            distribution: Box::new(RandomDistribution),
        }
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ModelSet");
        for kind in ModelKind::ALL {
            s.field(kind.as_str(), &self.name_of(kind));
        }
        s.finish()
    }
}
