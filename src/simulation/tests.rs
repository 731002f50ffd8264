//! End-to-end scenarios for the `Simulation` engine.

use std::any::Any;

use serde_json::{Value, json};

use crate::common::geometry::{Bounds, Position};
use crate::common::random::SimRng;
use crate::error::SimError;
use crate::registry::Registry;
use crate::simulation::builtin_nodes::{EchoNode, FloodingNode, InertNode, PingNode};
use crate::simulation::config::{AddNodes, ModelSelection, ModelSelections, SimulationConfig, SimulationMode};
use crate::simulation::engine::{RunOutcome, Simulation, StepOutcome};
use crate::simulation::models::{
    ConstantTime, DistanceTime, FixedPositions, LossyDelivery, MobilityModel, ModelKind, ModelSet,
    RandomInterference, RandomWalk, UnitDiskGraph,
};
use crate::simulation::node::{NodeBehavior, NodeContext, NodeState};
use crate::simulation::types::{Inbox, NodeId, Round};

// ── Test behavior ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Action {
    To(NodeId, Value),
    Direct(NodeId, Value),
    Broadcast(Value),
}

#[derive(Debug, Clone, PartialEq)]
struct Received {
    round: Round,
    from: NodeId,
    nack: bool,
    payload: Value,
    interference: f64,
}

/// Sends what it is told, when it is told, and records everything it sees.
#[derive(Debug, Default)]
struct Scripted {
    on_init: Vec<Action>,
    on_round: Vec<(Round, Action)>,
    received: Vec<Received>,
    neighborhood: Vec<(Vec<NodeId>, Vec<NodeId>)>,
    model_changes: Vec<(ModelKind, String, String)>,
    repositions: u64,
    inits: u64,
}

impl Scripted {
    fn quiet() -> Box<dyn NodeBehavior> {
        Box::new(Scripted::default())
    }

    fn at_round(round: Round, send: Action) -> Box<dyn NodeBehavior> {
        Box::new(Scripted {
            on_round: vec![(round, send)],
            ..Scripted::default()
        })
    }

    fn at_init(sends: Vec<Action>) -> Box<dyn NodeBehavior> {
        Box::new(Scripted {
            on_init: sends,
            ..Scripted::default()
        })
    }

    fn issue(ctx: &mut NodeContext, send: &Action) {
        match send.clone() {
            Action::To(to, payload) => ctx.send(to, payload),
            Action::Direct(to, payload) => ctx.send_direct(to, payload),
            Action::Broadcast(payload) => ctx.broadcast(payload),
        }
    }
}

impl NodeBehavior for Scripted {
    fn kind(&self) -> &str {
        "scripted"
    }

    fn init(&mut self, ctx: &mut NodeContext) {
        self.inits += 1;
        for send in &self.on_init {
            Self::issue(ctx, send);
        }
    }

    fn pre_step(&mut self, ctx: &mut NodeContext) {
        for (round, send) in &self.on_round {
            if *round == ctx.round() {
                Self::issue(ctx, send);
            }
        }
    }

    fn handle_messages(&mut self, ctx: &mut NodeContext, inbox: &Inbox) {
        for packet in inbox {
            self.received.push(Received {
                round: ctx.round(),
                from: packet.sender(),
                nack: packet.is_nack(),
                payload: packet.payload().clone(),
                interference: packet.interference(),
            });
        }
    }

    fn on_reposition(&mut self, _ctx: &mut NodeContext, _previous: Position) {
        self.repositions += 1;
    }

    fn on_neighborhood_change(&mut self, _ctx: &mut NodeContext, added: &[NodeId], removed: &[NodeId]) {
        self.neighborhood.push((added.to_vec(), removed.to_vec()));
    }

    fn on_model_change(&mut self, kind: ModelKind, old: &str, new: &str) {
        self.model_changes.push((kind, old.to_string(), new.to_string()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

const N0: NodeId = NodeId::new(0);
const N1: NodeId = NodeId::new(1);
const N2: NodeId = NodeId::new(2);

fn at(x: f64, y: f64) -> Position {
    Position::new(x, y, 0.0)
}

fn config(mode: SimulationMode) -> SimulationConfig {
    SimulationConfig {
        mode,
        seed: 42,
        ..SimulationConfig::default()
    }
}

/// UDG of `radius`, constant delay 1, nodes placed at `positions` in order.
fn models(radius: f64, positions: Vec<Position>) -> ModelSet {
    ModelSet::default()
        .with_connectivity(UnitDiskGraph::new(radius))
        .with_distribution(FixedPositions::new(positions))
}

fn scripted(sim: &Simulation, id: NodeId) -> &Scripted {
    sim.node::<Scripted>(id).expect("scripted node")
}

// ── Synchronous delivery ──────────────────────────────────────────────

#[test]
fn packet_sent_in_round_zero_arrives_in_round_one() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![Position::new(0.0, 0.0, 0.0), Position::new(3.0, 0.0, 0.0)]),
    )
    .unwrap();
    let report = sim
        .add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!("hello"))), Scripted::quiet()])
        .unwrap();
    assert_eq!(report.added, vec![N0, N1]);
    assert!(report.failures.is_empty());

    assert_eq!(sim.round(), 0);
    assert!(sim.graph().is_connected(N0, N1));
    assert!(sim.graph().is_connected(N1, N0));

    assert_eq!(sim.step().unwrap(), StepOutcome::Round(0));
    assert!(scripted(&sim, N1).received.is_empty());
    assert_eq!(sim.pending_packets(), 1);

    assert_eq!(sim.step().unwrap(), StepOutcome::Round(1));
    let received = &scripted(&sim, N1).received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].round, 1);
    assert_eq!(received[0].from, N0);
    assert_eq!(received[0].payload, json!("hello"));
    assert!(!received[0].nack);

    assert_eq!(sim.stats().packets_sent, 1);
    assert_eq!(sim.stats().packets_delivered, 1);
    assert_eq!(sim.stats().rounds, 2);
}

#[test]
fn frozen_connectivity_keeps_add_time_edges() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.connectivity = false;
    let mut sim = Simulation::new(
        cfg,
        models(5.0, vec![at(50.0, 50.0), at(53.0, 50.0)]).with_mobility(RandomWalk { step: 30.0 }),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!("hello"))), Scripted::quiet()])
        .unwrap();
    assert!(sim.graph().is_connected(N0, N1));
    assert!(sim.graph().is_connected(N1, N0));

    assert_eq!(sim.run(3).unwrap(), RunOutcome::Completed);
    assert_eq!(scripted(&sim, N0).repositions, 3);
    assert!(sim.graph().is_connected(N0, N1));
    assert_eq!(sim.graph().edge_count(), 2);
    let received = &scripted(&sim, N1).received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].round, 1);
    assert_eq!(sim.stats().dropped_not_connected, 0);
}

#[test]
fn without_connect_on_add_edges_wait_for_the_first_round() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.connect_on_add = false;
    let mut sim = Simulation::new(cfg, models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)])).unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!("hello"))), Scripted::quiet()])
        .unwrap();
    assert_eq!(sim.graph().edge_count(), 0);

    assert_eq!(sim.step().unwrap(), StepOutcome::Round(0));
    assert!(sim.graph().is_connected(N0, N1));
    assert_eq!(sim.step().unwrap(), StepOutcome::Round(1));
    assert_eq!(scripted(&sim, N1).received.len(), 1);
    assert_eq!(sim.stats().dropped_not_connected, 0);
}

#[test]
fn send_without_edge_is_dropped_but_direct_send_arrives() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(10.0, 0.0)]),
    )
    .unwrap();
    sim.add_behaviors(vec![
        Box::new(Scripted {
            on_round: vec![
                (0, Action::To(N1, json!("edge"))),
                (0, Action::Direct(N1, json!("direct"))),
            ],
            ..Scripted::default()
        }),
        Scripted::quiet(),
    ])
    .unwrap();
    assert!(!sim.graph().is_connected(N0, N1));
    assert_eq!(sim.graph().edge_count(), 0);

    assert_eq!(sim.run(3).unwrap(), RunOutcome::Completed);
    let payloads: Vec<&Value> = scripted(&sim, N1).received.iter().map(|r| &r.payload).collect();
    assert_eq!(payloads, vec![&json!("direct")]);
    assert_eq!(sim.stats().dropped_not_connected, 1);
    assert_eq!(sim.stats().packets_delivered, 1);
    // no NACKs unless enabled
    assert!(scripted(&sim, N0).received.is_empty());
}

#[test]
fn direct_send_still_faces_interference() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(10.0, 0.0)]).with_interference(RandomInterference { probability: 1.0 }),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::Direct(N1, json!(1))), Scripted::quiet()])
        .unwrap();
    sim.run(3).unwrap();
    assert!(scripted(&sim, N1).received.is_empty());
    assert_eq!(sim.stats().dropped_interference, 1);
}

#[test]
fn disturbed_packet_is_answered_with_nack() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.nack_messages = true;
    let mut sim = Simulation::new(
        cfg,
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)]).with_interference(RandomInterference { probability: 1.0 }),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!("lost"))), Scripted::quiet()])
        .unwrap();

    sim.run(3).unwrap();
    assert!(scripted(&sim, N1).received.is_empty());
    let back = &scripted(&sim, N0).received;
    assert_eq!(back.len(), 1);
    assert!(back[0].nack);
    assert_eq!(back[0].from, N1);
    // constant delay 1: the NACK is due one round after the send
    assert_eq!(back[0].round, 1);
    assert_eq!(sim.stats().dropped_interference, 1);
    assert_eq!(sim.stats().nacks_sent, 1);
    assert_eq!(sim.stats().packets_delivered, 0);
}

#[test]
fn not_connected_unicast_gets_nack_but_broadcast_never_does() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.nack_messages = true;
    let mut sim = Simulation::new(cfg, models(5.0, vec![at(0.0, 0.0), at(10.0, 0.0)])).unwrap();
    sim.add_behaviors(vec![
        Box::new(Scripted {
            on_round: vec![(0, Action::To(N1, json!(1))), (0, Action::Broadcast(json!(2)))],
            ..Scripted::default()
        }),
        Scripted::quiet(),
    ])
    .unwrap();
    sim.run(3).unwrap();
    let back = &scripted(&sim, N0).received;
    assert_eq!(back.len(), 1);
    assert!(back[0].nack);
    assert_eq!(back[0].payload["original"], json!(0));
    assert_eq!(back[0].payload["reason"], json!("not_connected"));
}

#[test]
fn additive_interference_feeds_reliability() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.interference_is_additive = true;
    let positions = vec![at(0.0, 0.0), at(3.0, 0.0)];

    let mut reliable = Simulation::new(
        cfg.clone(),
        models(5.0, positions.clone()).with_interference(RandomInterference { probability: 1.0 }),
    )
    .unwrap();
    reliable
        .add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!(1))), Scripted::quiet()])
        .unwrap();
    reliable.run(2).unwrap();
    let received = &scripted(&reliable, N1).received;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].interference, 1.0);

    let mut lossy = Simulation::new(
        cfg,
        models(5.0, positions)
            .with_interference(RandomInterference { probability: 1.0 })
            .with_reliability(LossyDelivery { drop_rate: 0.0 }),
    )
    .unwrap();
    lossy
        .add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!(1))), Scripted::quiet()])
        .unwrap();
    lossy.run(2).unwrap();
    assert!(scripted(&lossy, N1).received.is_empty());
    assert_eq!(lossy.stats().dropped_unreliable, 1);
    assert_eq!(lossy.stats().dropped_interference, 0);
}

#[test]
fn disabled_interference_is_identity() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.interference = false;
    let mut sim = Simulation::new(
        cfg,
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)]).with_interference(RandomInterference { probability: 1.0 }),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!(1))), Scripted::quiet()])
        .unwrap();
    sim.run(2).unwrap();
    assert_eq!(scripted(&sim, N1).received.len(), 1);
}

#[test]
fn same_round_sends_are_invisible_to_other_nodes() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)]),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!(0))), Scripted::quiet()])
        .unwrap();
    sim.step().unwrap();
    // node 1 ran its hooks in round 0 after node 0 sent, and saw nothing
    assert!(scripted(&sim, N1).received.is_empty());
}

#[test]
fn broadcast_expands_to_current_neighbors() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(5.0, 5.0), at(8.0, 5.0), at(5.0, 9.0), at(50.0, 50.0)]),
    )
    .unwrap();
    sim.add_behaviors(vec![
        Scripted::at_round(0, Action::Broadcast(json!("all"))),
        Scripted::quiet(),
        Scripted::quiet(),
        Scripted::quiet(),
    ])
    .unwrap();
    sim.run(2).unwrap();
    assert_eq!(scripted(&sim, N1).received.len(), 1);
    assert_eq!(scripted(&sim, N2).received.len(), 1);
    assert!(scripted(&sim, NodeId::new(3)).received.is_empty());
    assert_eq!(sim.stats().packets_sent, 2);
}

// ── Asynchronous mode ─────────────────────────────────────────────────

#[test]
fn async_delivers_in_arrival_order_then_idles() {
    let mut sim = Simulation::new(
        config(SimulationMode::Asynchronous),
        models(10.0, vec![at(0.0, 0.0), at(1.0, 0.0), at(4.0, 0.0)])
            .with_transmission(DistanceTime { base: 1, per_unit: 1.0 }),
    )
    .unwrap();
    sim.add_behaviors(vec![
        Scripted::at_init(vec![Action::To(N2, json!("far")), Action::To(N1, json!("near"))]),
        Scripted::quiet(),
        Scripted::quiet(),
    ])
    .unwrap();

    match sim.step().unwrap() {
        StepOutcome::Event { round, node, .. } => {
            assert_eq!(round, 2);
            assert_eq!(node, N1);
        }
        other => panic!("unexpected {:?}", other),
    }
    match sim.step().unwrap() {
        StepOutcome::Event { round, node, .. } => {
            assert_eq!(round, 5);
            assert_eq!(node, N2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(sim.step().unwrap(), StepOutcome::Idle);
    assert_eq!(sim.run(100).unwrap(), RunOutcome::Idle);
    assert_eq!(sim.stats().events, 2);
    assert_eq!(sim.round(), 5);
    assert_eq!(scripted(&sim, N2).received[0].round, 5);
}

#[test]
fn async_ties_break_by_send_order() {
    let mut sim = Simulation::new(
        config(SimulationMode::Asynchronous),
        models(10.0, vec![at(0.0, 0.0), at(1.0, 0.0), at(2.0, 0.0)]),
    )
    .unwrap();
    sim.add_behaviors(vec![
        Scripted::at_init(vec![Action::To(N2, json!(1)), Action::To(N1, json!(2))]),
        Scripted::quiet(),
        Scripted::quiet(),
    ])
    .unwrap();
    let first = sim.step().unwrap();
    let second = sim.step().unwrap();
    assert!(matches!(first, StepOutcome::Event { node, round: 1, .. } if node == N2));
    assert!(matches!(second, StepOutcome::Event { node, round: 1, .. } if node == N1));
}

#[test]
fn async_round_jump_refreshes_once() {
    let mut sim = Simulation::new(
        config(SimulationMode::Asynchronous),
        models(1000.0, vec![at(50.0, 50.0), at(60.0, 50.0)])
            .with_mobility(RandomWalk { step: 1.0 })
            .with_transmission(ConstantTime::new(5)),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_init(vec![Action::To(N1, json!(0))]), Scripted::quiet()])
        .unwrap();
    assert!(matches!(sim.step().unwrap(), StepOutcome::Event { round: 5, .. }));
    assert_eq!(scripted(&sim, N0).repositions, 1);
    assert_eq!(scripted(&sim, N1).repositions, 1);
    assert_eq!(sim.stats().rounds, 5);
}

#[test]
fn async_run_stops_before_end_round() {
    let mut sim = Simulation::new(
        config(SimulationMode::Asynchronous),
        models(10.0, vec![at(0.0, 0.0), at(1.0, 0.0)]).with_transmission(ConstantTime::new(5)),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_init(vec![Action::To(N1, json!(0))]), Scripted::quiet()])
        .unwrap();
    assert_eq!(sim.run(5).unwrap(), RunOutcome::Completed);
    assert!(scripted(&sim, N1).received.is_empty());
    assert_eq!(sim.round(), 0);
    assert_eq!(sim.run(10).unwrap(), RunOutcome::Idle);
    assert_eq!(scripted(&sim, N1).received.len(), 1);
}

// ── Lifecycle ─────────────────────────────────────────────────────────

#[test]
fn lifecycle_hooks_fire() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)]),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::quiet(), Scripted::quiet()]).unwrap();
    assert_eq!(scripted(&sim, N0).inits, 1);
    assert_eq!(scripted(&sim, N0).neighborhood, vec![(vec![N1], vec![])]);
    assert_eq!(sim.node_state(N0).map(|s| s.lifecycle), Some(crate::simulation::Lifecycle::Initialized));

    sim.step().unwrap();
    assert_eq!(scripted(&sim, N0).inits, 1);
    assert_eq!(sim.node_state(N0).map(|s| s.lifecycle), Some(crate::simulation::Lifecycle::Active));
}

#[test]
fn removal_discards_packets_and_notifies_neighbors() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0), at(6.0, 0.0)]).with_transmission(ConstantTime::new(3)),
    )
    .unwrap();
    sim.add_behaviors(vec![
        Scripted::at_round(0, Action::To(N1, json!("doomed"))),
        Scripted::quiet(),
        Scripted::quiet(),
    ])
    .unwrap();
    sim.step().unwrap();
    assert_eq!(sim.pending_packets(), 1);

    sim.remove_node(N1).unwrap();
    assert_eq!(sim.pending_packets(), 0);
    assert_eq!(sim.stats().discarded_on_removal, 1);
    assert_eq!(scripted(&sim, N0).neighborhood.last(), Some(&(vec![], vec![N1])));
    assert_eq!(scripted(&sim, N2).neighborhood.last(), Some(&(vec![], vec![N1])));
    assert!(!sim.graph().is_connected(N0, N1));
    assert_eq!(sim.node_count(), 2);

    assert_eq!(sim.remove_node(N1), Err(SimError::NodeNotFound(N1)));
    sim.run(5).unwrap();
    assert_eq!(sim.stats().packets_delivered, 0);
}

#[test]
fn node_ids_are_never_reused() {
    let mut sim = Simulation::new(config(SimulationMode::Synchronous), ModelSet::default()).unwrap();
    let a = sim.add_node_at(Box::new(InertNode), at(1.0, 1.0)).unwrap();
    sim.remove_node(a).unwrap();
    let b = sim.add_node_at(Box::new(InertNode), at(1.0, 1.0)).unwrap();
    assert_ne!(a, b);
    assert!(matches!(
        sim.add_node_at(Box::new(InertNode), at(-1.0, 1.0)),
        Err(SimError::InvalidConfig { .. })
    ));
}

#[test]
fn refused_activation_does_not_abort() {
    let registry = Registry::with_builtin();
    let mut sim = Simulation::from_registry(&registry, config(SimulationMode::Synchronous)).unwrap();
    let report = sim.add_nodes(&AddNodes::new("ping", 2)).unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|e| e.is_node_level()));
    assert!(matches!(&report.failures[0], SimError::Activation { kind, .. } if kind == "ping"));

    let report = sim.add_nodes(&AddNodes::new("inert", 3)).unwrap();
    assert_eq!(report.added.len(), 3);
    assert_eq!(sim.run(2).unwrap(), RunOutcome::Completed);

    let zero_interval = sim.add_behaviors(vec![Box::new(PingNode::new(Some(N0), 0))]).unwrap();
    assert_eq!(zero_interval.failures.len(), 1);
}

#[test]
fn unknown_kind_is_a_configuration_error() {
    let registry = Registry::with_builtin();
    let mut sim = Simulation::from_registry(&registry, config(SimulationMode::Synchronous)).unwrap();
    assert!(matches!(
        sim.add_nodes(&AddNodes::new("dragon", 1)),
        Err(SimError::UnknownNodeKind(_))
    ));
    let mut bare = Simulation::new(config(SimulationMode::Synchronous), ModelSet::default()).unwrap();
    assert!(bare.add_nodes(&AddNodes::new("inert", 1)).is_err());
}

// ── Model contract violations ─────────────────────────────────────────

struct Escape;

impl MobilityModel for Escape {
    fn name(&self) -> &str {
        "escape"
    }

    fn next_position(&mut self, node: &NodeState, _round: Round, _bounds: &Bounds, _rng: &mut SimRng) -> Position {
        Position::new(node.position.x + 1e9, node.position.y, 0.0)
    }
}

#[test]
fn mobility_out_of_bounds_is_fatal() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0)]).with_mobility(Escape),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::quiet()]).unwrap();
    match sim.step() {
        Err(SimError::ModelViolation { model, .. }) => assert_eq!(model, "escape"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn disabled_mobility_never_runs_the_model() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.toggles.mobility = false;
    let mut sim = Simulation::new(cfg, models(5.0, vec![at(0.0, 0.0)]).with_mobility(Escape)).unwrap();
    sim.add_behaviors(vec![Scripted::quiet()]).unwrap();
    assert_eq!(sim.run(3).unwrap(), RunOutcome::Completed);
}

#[test]
fn zero_delay_is_fatal() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(1.0, 0.0)]).with_transmission(ConstantTime::new(0)),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!(0))), Scripted::quiet()])
        .unwrap();
    assert!(matches!(sim.step(), Err(SimError::ModelViolation { .. })));
}

#[test]
fn short_distribution_is_fatal() {
    let mut sim = Simulation::new(config(SimulationMode::Synchronous), models(5.0, vec![at(0.0, 0.0)])).unwrap();
    let result = sim.add_behaviors(vec![Scripted::quiet(), Scripted::quiet()]);
    assert!(matches!(result, Err(SimError::ModelViolation { .. })));
    assert_eq!(sim.node_count(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let mut cfg = config(SimulationMode::Synchronous);
    cfg.max_connection_radius = Some(f64::NAN);
    assert!(matches!(
        Simulation::new(cfg, ModelSet::default()),
        Err(SimError::InvalidConfig { .. })
    ));
}

// ── Stop, swap, trace, determinism ────────────────────────────────────

#[test]
fn stop_is_honoured_between_rounds() {
    let mut sim = Simulation::new(config(SimulationMode::Synchronous), models(5.0, vec![at(0.0, 0.0)])).unwrap();
    sim.add_behaviors(vec![Scripted::quiet()]).unwrap();
    let handle = sim.stop_handle();
    sim.step().unwrap();
    handle.stop();
    assert_eq!(sim.step().unwrap(), StepOutcome::Stopped);
    assert_eq!(sim.run(10).unwrap(), RunOutcome::Stopped);
    assert_eq!(sim.round(), 1);
    sim.resume();
    assert_eq!(sim.step().unwrap(), StepOutcome::Round(1));
}

#[test]
fn model_swap_notifies_nodes() {
    let registry = Registry::with_builtin();
    let mut sim = Simulation::from_registry(&registry, config(SimulationMode::Synchronous)).unwrap();
    sim.add_behaviors(vec![Scripted::quiet()]).unwrap();

    sim.swap_model(ModelKind::Transmission, &ModelSelection::new("distance", json!({ "base": 2 })))
        .unwrap();
    assert_eq!(sim.models().name_of(ModelKind::Transmission), "distance");
    sim.replace_models(|set| set.reliability = Box::new(LossyDelivery { drop_rate: 0.5 }));
    // unchanged names do not notify
    sim.replace_models(|_| {});

    let changes = &scripted(&sim, N0).model_changes;
    assert_eq!(
        changes,
        &vec![
            (ModelKind::Transmission, "constant".to_string(), "distance".to_string()),
            (ModelKind::Reliability, "reliable".to_string(), "lossy".to_string()),
        ]
    );
    assert!(matches!(
        sim.swap_model(ModelKind::Mobility, &ModelSelection::named("teleport")),
        Err(SimError::UnknownModel { .. })
    ));
}

#[test]
fn snapshot_shows_in_flight_packets() {
    let mut sim = Simulation::new(
        config(SimulationMode::Synchronous),
        models(5.0, vec![at(0.0, 0.0), at(3.0, 0.0)]).with_transmission(ConstantTime::new(2)),
    )
    .unwrap();
    sim.add_behaviors(vec![Scripted::at_round(0, Action::To(N1, json!({ "k": 1 }))), Scripted::quiet()])
        .unwrap();
    sim.step().unwrap();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(snapshot.edges, vec![(N0, N1), (N1, N0)]);
    assert_eq!(snapshot.packets.len(), 1);
    assert_eq!(snapshot.packets[0].arrival_round(), 2);

    let json = snapshot.to_json();
    assert_eq!(json["nodes"][0]["in_flight"][0]["payload"], json!({ "k": 1 }));
    assert_eq!(json["nodes"][0]["in_flight"][0]["sender"], json!("<%Ref *2>"));
}

#[test]
fn same_seed_same_run() {
    let run = |seed: u64| {
        let registry = Registry::with_builtin();
        let cfg = SimulationConfig {
            seed,
            models: ModelSelections {
                mobility: Some(ModelSelection::new("random_walk", json!({ "step": 2.0 }))),
                interference: Some(ModelSelection::new("random", json!({ "probability": 0.3 }))),
                transmission: Some(ModelSelection::new("random", json!({ "min": 1, "max": 4 }))),
                connectivity: Some(ModelSelection::new("udg", json!({ "radius": 30.0 }))),
                ..ModelSelections::default()
            },
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::from_registry(&registry, cfg).unwrap();
        sim.add_nodes(&AddNodes::new("flooding", 1).with_params(json!({ "originator": true })))
            .unwrap();
        sim.add_nodes(&AddNodes::new("flooding", 15)).unwrap();
        sim.run(20).unwrap();
        (sim.stats().clone(), sim.snapshot().to_json())
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7).1, run(8).1);
}

// ── Built-in behaviors through the registry ───────────────────────────

#[test]
fn flooding_reaches_a_chain_hop_by_hop() {
    let registry = Registry::with_builtin();
    let cfg = SimulationConfig {
        models: ModelSelections {
            connectivity: Some(ModelSelection::new("udg", json!({ "radius": 5.0 }))),
            ..ModelSelections::default()
        },
        ..config(SimulationMode::Synchronous)
    };
    let mut sim = Simulation::from_registry(&registry, cfg).unwrap();
    sim.add_nodes(
        &AddNodes::new("flooding", 1)
            .with_params(json!({ "originator": true }))
            .placed_by(ModelSelection::new("fixed", json!({ "positions": [{ "x": 0.0, "y": 0.0 }] }))),
    )
    .unwrap();
    sim.add_nodes(&AddNodes::new("flooding", 4).placed_by(ModelSelection::new(
        "line",
        json!({ "from": { "x": 4.0, "y": 0.0 }, "to": { "x": 16.0, "y": 0.0 } }),
    )))
    .unwrap();

    sim.run(8).unwrap();
    for (hop, id) in sim.node_ids().into_iter().enumerate() {
        let node = sim.node::<FloodingNode>(id).unwrap();
        assert_eq!(node.reached_at, Some(hop as Round), "node {}", id);
    }
    // every node but the last hears its downstream neighbor forward once
    assert_eq!(sim.node::<FloodingNode>(N1).map(|n| n.duplicates), Some(1));
}

#[test]
fn ping_and_echo_round_trip() {
    let registry = Registry::with_builtin();
    let cfg = SimulationConfig {
        models: ModelSelections {
            distribution: Some(ModelSelection::new(
                "fixed",
                json!({ "positions": [{ "x": 0.0, "y": 0.0 }, { "x": 3.0, "y": 0.0 }] }),
            )),
            ..ModelSelections::default()
        },
        ..config(SimulationMode::Synchronous)
    };
    let mut sim = Simulation::from_registry(&registry, cfg).unwrap();
    sim.add_nodes(&AddNodes::new("ping", 1).with_params(json!({ "target": 1, "interval": 2 })))
        .unwrap();
    sim.add_nodes(&AddNodes::new("echo", 1)).unwrap();

    sim.run(5).unwrap();
    let ping = sim.node::<PingNode>(N0).unwrap();
    assert_eq!(ping.sent, 3);
    assert_eq!(ping.replies, vec![(2, N1), (4, N1)]);
    assert_eq!(sim.node::<EchoNode>(N1).map(|e| e.echo_count), Some(2));
}
