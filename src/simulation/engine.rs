//! The simulation: owns nodes, models, the neighbor graph, the packet queue
//! and the round counter, and runs the round loop.
//!
//! ## Synchronous round
//!
//! 1. mobility (when enabled)
//! 2. connectivity refresh (when enabled)
//! 3. inboxes cleared, packets due this round delivered
//! 4. `pre_step`, `handle_messages`, `post_step` for every node in id order
//! 5. outboxes merged into the queue in (node id, send order)
//! 6. round counter advanced
//!
//! ## Asynchronous step
//!
//! The next packet is popped. If its arrival round is ahead of the clock the
//! clock jumps there and a single mobility + connectivity refresh runs. The
//! target node gets the packet alone in its inbox, runs `handle_messages` and
//! `post_step`, and its output is merged.
//!
//! ## Send pipeline
//!
//! Every send is resolved when outboxes are merged, so all transmitters of
//! the round are known: edge check (unicast only) → interference →
//! reliability → transmission delay. Failures are counted, and answered with
//! a NACK when enabled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::common::geometry::Position;
use crate::common::random::SimRng;
use crate::error::{SimError, SimResult};
use crate::registry::{Project, Registry};

use super::config::{AddNodes, ModelSelection, SimulationConfig, SimulationMode, Toggles};
use super::models::{DistributionModel, Link, ModelKind, ModelSet, Transmission};
use super::neighbor_graph::{NeighborGraph, NeighborhoodChange};
use super::node::{Lifecycle, NodeBehavior, NodeSlot, NodeState};
use super::queue::PacketQueue;
use super::trace::{NodeTrace, TraceSnapshot};
use super::types::{Destination, DropReason, NodeId, Outgoing, Packet, PacketId, PacketKind, Round, SimulationStats};

/// Cloneable flag to stop a running simulation between rounds.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of a single [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A synchronous round finished.
    Round(Round),
    /// An asynchronous delivery event was handled.
    Event { round: Round, node: NodeId, packet: PacketId },
    /// Asynchronous mode with nothing left to deliver.
    Idle,
    /// A stop was requested.
    Stopped,
}

/// Why [`Simulation::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Idle,
    Stopped,
}

/// Nodes activated by one add request, and the ones refused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddReport {
    pub added: Vec<NodeId>,
    pub failures: Vec<SimError>,
}

enum Verdict {
    Queue(u64),
    Drop(DropReason),
}

pub struct Simulation {
    config: SimulationConfig,
    project: Option<Project>,
    models: ModelSet,
    nodes: BTreeMap<NodeId, NodeSlot>,
    graph: NeighborGraph,
    queue: PacketQueue,
    round: Round,
    /// Last round whose world refresh ran in asynchronous mode.
    refreshed: Option<Round>,
    rng: SimRng,
    stats: SimulationStats,
    stop: StopHandle,
    next_node_id: u32,
    next_packet_id: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig, models: ModelSet) -> SimResult<Self> {
        config.validate()?;
        info!(
            "Simulation created: project '{}', {:?} mode, seed {}, models {:?}",
            config.project, config.mode, config.seed, models
        );
        Ok(Simulation {
            rng: SimRng::new(config.seed),
            config,
            project: None,
            models,
            nodes: BTreeMap::new(),
            graph: NeighborGraph::new(),
            queue: PacketQueue::new(),
            round: 0,
            refreshed: None,
            stats: SimulationStats::default(),
            stop: StopHandle::default(),
            next_node_id: 0,
            next_packet_id: 0,
        })
    }

    /// Resolve the configured project and its model selections, then build
    /// the simulation. Node batches can afterwards be added by kind name.
    pub fn from_registry(registry: &Registry, config: SimulationConfig) -> SimResult<Self> {
        let project = registry.project(&config.project)?;
        let models = project.build_models(&config.models, config.seed)?;
        let project = project.clone();
        let mut simulation = Simulation::new(config, models)?;
        simulation.project = Some(project);
        Ok(simulation)
    }

    // ---------- accessors ----------

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Clear a previous stop request.
    pub fn resume(&self) {
        self.stop.clear();
    }

    pub fn pending_packets(&self) -> usize {
        self.queue.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn node_state(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.get(&id).map(|slot| &slot.state)
    }

    /// Typed access to a node's behavior.
    pub fn node<T: NodeBehavior + 'static>(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(&id)?.behavior.as_any().downcast_ref::<T>()
    }

    pub fn node_mut<T: NodeBehavior + 'static>(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(&id)?.behavior.as_any_mut().downcast_mut::<T>()
    }

    // ---------- node management ----------

    /// Build `request.count` nodes of `request.kind` from the project and
    /// place them with the batch distribution (or the simulation's).
    pub fn add_nodes(&mut self, request: &AddNodes) -> SimResult<AddReport> {
        let project = self
            .project
            .as_ref()
            .ok_or_else(|| SimError::UnknownNodeKind(request.kind.clone()))?;
        let seed = self.config.seed;
        let behaviors = (0..request.count)
            .map(|_| project.build_node(&request.kind, &request.params, seed))
            .collect::<SimResult<Vec<_>>>()?;
        let mut placement = match &request.distribution {
            Some(selection) => Some(project.distribution.build(selection, seed)?),
            None => None,
        };
        self.insert_batch(behaviors, placement.as_mut())
    }

    /// Add ready-made behaviors, placed by the simulation's distribution model.
    pub fn add_behaviors(&mut self, behaviors: Vec<Box<dyn NodeBehavior>>) -> SimResult<AddReport> {
        self.insert_batch(behaviors, None)
    }

    /// Add one node at an explicit position. Refused activation is returned
    /// as the error.
    pub fn add_node_at(&mut self, behavior: Box<dyn NodeBehavior>, position: Position) -> SimResult<NodeId> {
        if !position.is_finite() || !self.config.bounds.contains(&position) {
            return Err(SimError::config("position", format!("{} is outside the simulation bounds", position)));
        }
        let id = self.activate(behavior, position)?;
        self.after_add()?;
        Ok(id)
    }

    fn insert_batch(
        &mut self,
        behaviors: Vec<Box<dyn NodeBehavior>>,
        placement: Option<&mut Box<dyn DistributionModel>>,
    ) -> SimResult<AddReport> {
        let count = behaviors.len();
        let bounds = self.config.bounds;
        let (model_name, positions) = match placement {
            Some(model) => (model.name().to_string(), model.positions(&bounds, count, &mut self.rng)),
            None => (
                self.models.distribution.name().to_string(),
                self.models.distribution.positions(&bounds, count, &mut self.rng),
            ),
        };

        if positions.len() != count {
            error!("Distribution model '{}' returned {} positions for {} nodes", model_name, positions.len(), count);
            return Err(SimError::violation(
                model_name,
                format!("returned {} positions for {} nodes", positions.len(), count),
            ));
        }
        if let Some(bad) = positions.iter().find(|p| !p.is_finite() || !bounds.contains(p)) {
            error!("Distribution model '{}' placed a node at {} outside bounds", model_name, bad);
            return Err(SimError::violation(model_name, format!("position {} is outside the simulation bounds", bad)));
        }

        let mut report = AddReport::default();
        for (behavior, position) in behaviors.into_iter().zip(positions) {
            match self.activate(behavior, position) {
                Ok(id) => report.added.push(id),
                Err(err) => report.failures.push(err),
            }
        }
        if !report.added.is_empty() {
            self.after_add()?;
        }
        info!(
            "Added {} node(s) at round {}, {} refused activation",
            report.added.len(),
            self.round,
            report.failures.len()
        );
        Ok(report)
    }

    fn activate(&mut self, behavior: Box<dyn NodeBehavior>, position: Position) -> SimResult<NodeId> {
        let kind = behavior.kind().to_string();
        if let Err(reason) = behavior.check_requirements() {
            warn!("Node of kind '{}' refused activation: {}", kind, reason);
            return Err(SimError::Activation { kind, reason });
        }

        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        let mut slot = NodeSlot::new(NodeState::new(id, kind, position, self.round), behavior);
        slot.with_context(self.round, |behavior, ctx, _| behavior.init(ctx));
        slot.state.lifecycle = Lifecycle::Initialized;
        self.graph.insert_isolated(id);
        self.nodes.insert(id, slot);
        debug!("Node {} ({}) initialized at {}", id, self.nodes[&id].state.kind, position);
        Ok(id)
    }

    fn after_add(&mut self) -> SimResult<()> {
        if self.config.toggles.connect_on_add {
            self.refresh_connectivity(self.round);
        }
        Ok(())
    }

    /// Remove a node. Its queued and buffered packets are discarded and the
    /// nodes that had it as a neighbor are notified.
    pub fn remove_node(&mut self, id: NodeId) -> SimResult<()> {
        let mut slot = self.nodes.remove(&id).ok_or(SimError::NodeNotFound(id))?;
        slot.state.lifecycle = Lifecycle::Removed;

        let discarded = self.queue.remove_involving(id) + slot.outbox.len();
        self.stats.discarded_on_removal += discarded as u64;
        self.models.mobility.forget(id);

        let changes = self.graph.remove_node(id);
        self.apply_neighborhood_changes(self.round, changes);
        info!("Node {} removed at round {}, {} packet(s) discarded", id, self.round, discarded);
        Ok(())
    }

    // ---------- model management ----------

    /// Replace the model of one slot with a fresh one from the project
    /// catalog. Every node is told about the swap.
    pub fn swap_model(&mut self, kind: ModelKind, selection: &ModelSelection) -> SimResult<()> {
        let project = self
            .project
            .as_ref()
            .ok_or_else(|| SimError::UnknownProject(self.config.project.clone()))?;
        let seed = self.config.seed;
        let old = self.models.name_of(kind).to_string();
        match kind {
            ModelKind::Connectivity => self.models.connectivity = project.connectivity.build(selection, seed)?,
            ModelKind::Mobility => self.models.mobility = project.mobility.build(selection, seed)?,
            ModelKind::Interference => self.models.interference = project.interference.build(selection, seed)?,
            ModelKind::Reliability => self.models.reliability = project.reliability.build(selection, seed)?,
            ModelKind::Transmission => self.models.transmission = project.transmission.build(selection, seed)?,
            ModelKind::Distribution => self.models.distribution = project.distribution.build(selection, seed)?,
        }
        self.notify_model_change(kind, &old);
        Ok(())
    }

    /// Edit the model set directly. Nodes are notified for every slot whose
    /// model name changed.
    pub fn replace_models(&mut self, update: impl FnOnce(&mut ModelSet)) {
        let before = ModelKind::ALL.map(|kind| self.models.name_of(kind).to_string());
        update(&mut self.models);
        for (kind, old) in ModelKind::ALL.into_iter().zip(before) {
            if self.models.name_of(kind) != old {
                self.notify_model_change(kind, &old);
            }
        }
    }

    fn notify_model_change(&mut self, kind: ModelKind, old: &str) {
        let new = self.models.name_of(kind).to_string();
        info!("{} model swapped: '{}' -> '{}'", kind, old, new);
        for slot in self.nodes.values_mut() {
            slot.behavior.on_model_change(kind, old, &new);
        }
    }

    // ---------- round loop ----------

    /// One synchronous round or one asynchronous event.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        if self.stop.is_stopped() {
            return Ok(StepOutcome::Stopped);
        }
        match self.config.mode {
            SimulationMode::Synchronous => self.step_round(),
            SimulationMode::Asynchronous => self.step_event(),
        }
    }

    /// Run for `rounds` rounds, or until stopped or (asynchronous) idle.
    pub fn run(&mut self, rounds: u64) -> SimResult<RunOutcome> {
        self.run_until(self.round.saturating_add(rounds))
    }

    /// Run until the round counter reaches `end`. In asynchronous mode every
    /// event due before `end` is handled and the counter stays at the last
    /// event's round.
    pub fn run_until(&mut self, end: Round) -> SimResult<RunOutcome> {
        loop {
            if self.stop.is_stopped() {
                info!("Simulation stopped at round {}", self.round);
                return Ok(RunOutcome::Stopped);
            }
            match self.config.mode {
                SimulationMode::Synchronous => {
                    if self.round >= end {
                        return Ok(RunOutcome::Completed);
                    }
                    self.step_round()?;
                }
                SimulationMode::Asynchronous => {
                    self.flush_outboxes()?;
                    match self.queue.peek() {
                        None => return Ok(RunOutcome::Idle),
                        Some(next) if next.arrival_round >= end => return Ok(RunOutcome::Completed),
                        Some(_) => {
                            self.step_event()?;
                        }
                    }
                }
            }
        }
    }

    fn step_round(&mut self) -> SimResult<StepOutcome> {
        let round = self.round;
        self.refresh_world(round)?;

        for slot in self.nodes.values_mut() {
            slot.inbox.clear();
        }
        for packet in self.queue.drain_due(round) {
            self.deliver(packet);
        }

        for slot in self.nodes.values_mut() {
            slot.state.lifecycle = Lifecycle::Active;
            slot.with_context(round, |behavior, ctx, _| behavior.pre_step(ctx));
        }
        for slot in self.nodes.values_mut() {
            slot.with_context(round, |behavior, ctx, inbox| behavior.handle_messages(ctx, inbox));
        }
        for slot in self.nodes.values_mut() {
            slot.with_context(round, |behavior, ctx, _| behavior.post_step(ctx));
        }

        self.merge_outboxes(round)?;
        self.round += 1;
        self.stats.rounds += 1;
        debug!("Round {} done, {} packet(s) in flight", round, self.queue.len());
        Ok(StepOutcome::Round(round))
    }

    fn step_event(&mut self) -> SimResult<StepOutcome> {
        self.flush_outboxes()?;
        let Some(packet) = self.queue.pop_next() else {
            return Ok(StepOutcome::Idle);
        };

        let target = packet.arrival_round.max(self.round);
        if target > self.round || self.refreshed.is_none() {
            self.stats.rounds += target - self.round;
            self.round = target;
            self.refresh_world(target)?;
            self.refreshed = Some(target);
        }
        let round = self.round;
        let (node, id) = (packet.receiver, packet.id);

        self.stats.events += 1;
        if let Some(slot) = self.nodes.get_mut(&node) {
            slot.inbox.clear();
        }
        self.deliver(packet);
        if let Some(slot) = self.nodes.get_mut(&node) {
            slot.state.lifecycle = Lifecycle::Active;
            slot.with_context(round, |behavior, ctx, inbox| {
                behavior.handle_messages(ctx, inbox);
                behavior.post_step(ctx);
            });
        }
        self.merge_outboxes(round)?;
        Ok(StepOutcome::Event { round, node, packet: id })
    }

    /// Sends issued outside a step (init, reposition, neighborhood change)
    /// are merged at the current round before the next event.
    fn flush_outboxes(&mut self) -> SimResult<()> {
        if self.nodes.values().any(|slot| !slot.outbox.is_empty()) {
            self.merge_outboxes(self.round)?;
        }
        Ok(())
    }

    fn deliver(&mut self, packet: Packet) {
        match self.nodes.get_mut(&packet.receiver) {
            Some(slot) if slot.state.is_alive() => {
                debug!("Delivered {}", packet);
                if !packet.is_nack() {
                    self.stats.packets_delivered += 1;
                }
                slot.inbox.push(packet);
            }
            _ => debug!("Discarded {}: receiver is gone", packet),
        }
    }

    // ---------- world refresh ----------

    fn refresh_world(&mut self, round: Round) -> SimResult<()> {
        if self.config.toggles.mobility {
            self.apply_mobility(round)?;
        }
        if self.config.toggles.connectivity {
            self.refresh_connectivity(round);
        }
        Ok(())
    }

    fn apply_mobility(&mut self, round: Round) -> SimResult<()> {
        let bounds = self.config.bounds;
        for slot in self.nodes.values_mut() {
            if !slot.state.is_alive() {
                continue;
            }
            let previous = slot.state.position;
            let next = self.models.mobility.next_position(&slot.state, round, &bounds, &mut self.rng);
            if !next.is_finite() || !bounds.contains(&next) {
                let model = self.models.mobility.name().to_string();
                error!("Mobility model '{}' moved {} to {} outside bounds", model, slot.state.id, next);
                return Err(SimError::violation(
                    model,
                    format!("moved {} to {} outside the simulation bounds", slot.state.id, next),
                ));
            }
            if next != previous {
                slot.state.position = next;
                slot.with_context(round, |behavior, ctx, _| behavior.on_reposition(ctx, previous));
            }
        }
        Ok(())
    }

    fn refresh_connectivity(&mut self, round: Round) {
        let states: Vec<&NodeState> = self
            .nodes
            .values()
            .filter(|slot| slot.state.is_alive())
            .map(|slot| &slot.state)
            .collect();
        let changes = self.graph.recompute(
            &states,
            self.models.connectivity.as_ref(),
            self.config.max_connection_radius,
        );
        debug!("Connectivity refreshed at round {}: {} edge(s)", round, self.graph.edge_count());
        self.apply_neighborhood_changes(round, changes);
    }

    fn apply_neighborhood_changes(&mut self, round: Round, changes: Vec<NeighborhoodChange>) {
        for change in changes {
            let Some(slot) = self.nodes.get_mut(&change.node) else {
                continue;
            };
            slot.state.neighbors = self.graph.out_neighbors(change.node).cloned().unwrap_or_default();
            slot.with_context(round, |behavior, ctx, _| {
                behavior.on_neighborhood_change(ctx, &change.added, &change.removed)
            });
        }
    }

    // ---------- send pipeline ----------

    fn merge_outboxes(&mut self, round: Round) -> SimResult<()> {
        let mut requests: Vec<(NodeId, Outgoing)> = Vec::new();
        let mut concurrent: Vec<Transmission> = Vec::new();
        for slot in self.nodes.values_mut() {
            if slot.outbox.is_empty() {
                continue;
            }
            let sender = slot.state.id;
            concurrent.push(Transmission {
                sender,
                position: slot.state.position,
            });
            requests.extend(slot.outbox.drain(..).map(|out| (sender, out)));
        }

        for (sender, outgoing) in requests {
            match outgoing.destination {
                Destination::Broadcast => {
                    let receivers: Vec<NodeId> = self
                        .graph
                        .out_neighbors(sender)
                        .map(|set| set.iter().copied().collect())
                        .unwrap_or_default();
                    for receiver in receivers {
                        self.transmit(round, sender, receiver, outgoing.payload.clone(), true, false, &concurrent)?;
                    }
                }
                Destination::Node(receiver) => {
                    self.transmit(round, sender, receiver, outgoing.payload, false, !outgoing.direct, &concurrent)?;
                }
            }
        }
        Ok(())
    }

    fn allocate_packet_id(&mut self) -> PacketId {
        let id = PacketId::new(self.next_packet_id);
        self.next_packet_id += 1;
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn transmit(
        &mut self,
        round: Round,
        sender: NodeId,
        receiver: NodeId,
        payload: Value,
        broadcast: bool,
        require_edge: bool,
        concurrent: &[Transmission],
    ) -> SimResult<()> {
        let mut packet = Packet {
            id: self.allocate_packet_id(),
            sender,
            receiver,
            broadcast,
            kind: PacketKind::Data,
            payload,
            origin_round: round,
            arrival_round: round,
            interference: 0.0,
        };
        self.stats.packets_sent += 1;

        let receiver_alive = self.nodes.get(&receiver).is_some_and(|slot| slot.state.is_alive());
        if !receiver_alive || (require_edge && !self.graph.is_connected(sender, receiver)) {
            return self.reject(packet, DropReason::NotConnected, concurrent);
        }

        let verdict = {
            let (Some(from), Some(to)) = (self.nodes.get(&sender), self.nodes.get(&receiver)) else {
                return self.reject(packet, DropReason::NotConnected, concurrent);
            };
            let link = Link {
                sender: &from.state,
                receiver: &to.state,
                round,
                concurrent,
            };
            judge(&self.models, &self.config.toggles, &mut self.rng, &mut packet, &link)
        };

        match verdict {
            Verdict::Queue(delay) => self.enqueue(packet, delay),
            Verdict::Drop(reason) => self.reject(packet, reason, concurrent),
        }
    }

    fn enqueue(&mut self, mut packet: Packet, delay: u64) -> SimResult<()> {
        if delay == 0 {
            let model = self.models.transmission.name().to_string();
            error!("Transmission model '{}' returned a zero delay for {}", model, packet);
            return Err(SimError::violation(model, format!("zero delay for {}", packet.id)));
        }
        packet.arrival_round = packet.origin_round.saturating_add(delay);
        debug!("Queued {}", packet);
        self.queue.push(packet);
        Ok(())
    }

    /// Count the drop and answer a failed data unicast with a NACK from the
    /// receiver back to the sender. NACKs skip interference and reliability.
    fn reject(&mut self, packet: Packet, reason: DropReason, concurrent: &[Transmission]) -> SimResult<()> {
        debug!("Dropped {}: {}", packet, reason);
        self.stats.record_drop(reason);
        if !self.config.toggles.nack_messages || packet.broadcast || packet.is_nack() {
            return Ok(());
        }

        let nack = Packet {
            id: self.allocate_packet_id(),
            sender: packet.receiver,
            receiver: packet.sender,
            broadcast: false,
            kind: PacketKind::Nack { original: packet.id },
            payload: serde_json::json!({ "original": packet.id.raw(), "reason": reason }),
            origin_round: packet.origin_round,
            arrival_round: packet.origin_round,
            interference: 0.0,
        };
        let delay = {
            let (Some(from), Some(to)) = (self.nodes.get(&nack.sender), self.nodes.get(&nack.receiver)) else {
                debug!("No NACK for {}: an endpoint is gone", packet.id);
                return Ok(());
            };
            let link = Link {
                sender: &from.state,
                receiver: &to.state,
                round: nack.origin_round,
                concurrent,
            };
            self.models.transmission.time_to_reach(&nack, &link, &mut self.rng)
        };
        self.stats.nacks_sent += 1;
        self.enqueue(nack, delay)
    }

    // ---------- trace ----------

    pub fn snapshot(&self) -> TraceSnapshot {
        TraceSnapshot {
            round: self.round,
            nodes: self
                .nodes
                .values()
                .map(|slot| NodeTrace {
                    id: slot.state.id,
                    kind: slot.state.kind.clone(),
                    position: slot.state.position,
                    lifecycle: slot.state.lifecycle,
                    neighbors: slot.state.neighbors.iter().copied().collect(),
                    state: slot.behavior.trace_state(),
                })
                .collect(),
            edges: self.graph.edges().collect(),
            packets: self.queue.in_flight().into_iter().cloned().collect(),
            stats: self.stats.clone(),
        }
    }
}

/// Interference then reliability then delay, for one packet on one link.
fn judge(models: &ModelSet, toggles: &Toggles, rng: &mut SimRng, packet: &mut Packet, link: &Link) -> Verdict {
    if toggles.interference {
        if toggles.interference_is_additive {
            packet.interference += models.interference.disturbance(packet, link, rng);
        } else if models.interference.is_disturbed(packet, link, rng) {
            return Verdict::Drop(DropReason::Interference);
        }
    }
    if !models.reliability.reaches_destination(packet, link, rng) {
        return Verdict::Drop(DropReason::Unreliable);
    }
    Verdict::Queue(models.transmission.time_to_reach(packet, link, rng))
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("round", &self.round)
            .field("mode", &self.config.mode)
            .field("nodes", &self.nodes.len())
            .field("in_flight", &self.queue.len())
            .field("models", &self.models)
            .finish()
    }
}
