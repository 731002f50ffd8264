//! Mobility models. Built-ins keep nodes inside the bounds themselves; the
//! engine rejects any model that does not.

use std::collections::BTreeMap;

use crate::common::geometry::{Bounds, Position, degree_to_radian};
use crate::common::random::SimRng;
use crate::simulation::node::NodeState;
use crate::simulation::types::{NodeId, Round};

use super::MobilityModel;

#[derive(Debug, Clone, Default)]
pub struct NoMobility;

impl MobilityModel for NoMobility {
    fn name(&self) -> &str {
        "none"
    }

    fn next_position(&mut self, node: &NodeState, _round: Round, _bounds: &Bounds, _rng: &mut SimRng) -> Position {
        node.position
    }
}

/// Fixed-length step in a uniformly random planar direction, wrapping
/// around the bounds (torus).
#[derive(Debug, Clone)]
pub struct RandomWalk {
    pub step: f64,
}

impl MobilityModel for RandomWalk {
    fn name(&self) -> &str {
        "random_walk"
    }

    fn next_position(&mut self, node: &NodeState, _round: Round, bounds: &Bounds, rng: &mut SimRng) -> Position {
        let heading = degree_to_radian(rng.random_f64(0.0, 360.0));
        let moved = Position::new(
            node.position.x + self.step * heading.cos(),
            node.position.y + self.step * heading.sin(),
            node.position.z,
        );
        bounds.wrap(&moved)
    }
}

#[derive(Debug, Clone, Copy)]
struct Waypoint {
    target: Position,
    pause_left: u64,
}

/// Random waypoint: walk at `speed` towards a uniformly drawn target, wait
/// `pause_rounds` on arrival, draw the next target.
#[derive(Debug, Clone)]
pub struct RandomWaypoint {
    pub speed: f64,
    pub pause_rounds: u64,
    waypoints: BTreeMap<NodeId, Waypoint>,
}

impl RandomWaypoint {
    pub fn new(speed: f64, pause_rounds: u64) -> Self {
        RandomWaypoint {
            speed,
            pause_rounds,
            waypoints: BTreeMap::new(),
        }
    }

    fn draw_target(bounds: &Bounds, rng: &mut SimRng) -> Position {
        Position::new(
            rng.random_f64(bounds.x.min, bounds.x.max),
            rng.random_f64(bounds.y.min, bounds.y.max),
            rng.random_f64(bounds.z.min, bounds.z.max),
        )
    }
}

impl MobilityModel for RandomWaypoint {
    fn name(&self) -> &str {
        "random_waypoint"
    }

    fn next_position(&mut self, node: &NodeState, _round: Round, bounds: &Bounds, rng: &mut SimRng) -> Position {
        let waypoint = self.waypoints.entry(node.id).or_insert_with(|| Waypoint {
            target: Self::draw_target(bounds, rng),
            pause_left: 0,
        });

        if waypoint.pause_left > 0 {
            waypoint.pause_left -= 1;
            if waypoint.pause_left == 0 {
                waypoint.target = Self::draw_target(bounds, rng);
            }
            return node.position;
        }

        let next = node.position.step_towards(&waypoint.target, self.speed);
        if next == waypoint.target {
            if self.pause_rounds == 0 {
                waypoint.target = Self::draw_target(bounds, rng);
            } else {
                waypoint.pause_left = self.pause_rounds;
            }
        }
        bounds.clamp(&next)
    }

    fn forget(&mut self, node: NodeId) {
        self.waypoints.remove(&node);
    }
}
