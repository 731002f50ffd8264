//! Connectivity models: which directed edges exist between two nodes.

use crate::common::geometry::{Obstacle, is_blocked};
use crate::common::random::pair_unit_hash;
use crate::simulation::node::NodeState;

use super::ConnectivityModel;

/// Unit disk graph: connected iff `distance <= radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDiskGraph {
    pub radius: f64,
}

impl UnitDiskGraph {
    pub fn new(radius: f64) -> Self {
        UnitDiskGraph { radius }
    }
}

impl ConnectivityModel for UnitDiskGraph {
    fn name(&self) -> &str {
        "udg"
    }

    fn is_connected(&self, from: &NodeState, to: &NodeState) -> bool {
        // squared comparison; zero distance is connected for any radius >= 0
        self.radius >= 0.0 && from.position.distance2(&to.position) <= self.radius * self.radius
    }
}

/// Quasi unit disk graph.
///
/// Always connected within `inner`, never beyond `outer`. In between, a
/// directed pair is connected with `probability`, decided by a stable hash of
/// the pair so the edge does not flicker from round to round.
#[derive(Debug, Clone, PartialEq)]
pub struct QuasiUnitDiskGraph {
    pub inner: f64,
    pub outer: f64,
    pub probability: f64,
    pub salt: u64,
}

impl ConnectivityModel for QuasiUnitDiskGraph {
    fn name(&self) -> &str {
        "quasi_udg"
    }

    fn is_connected(&self, from: &NodeState, to: &NodeState) -> bool {
        let d2 = from.position.distance2(&to.position);
        if d2 <= self.inner * self.inner {
            return true;
        }
        if d2 > self.outer * self.outer {
            return false;
        }
        pair_unit_hash(self.salt, from.id.raw() as u64, to.id.raw() as u64) < self.probability
    }
}

/// Unit disk graph whose edges are cut by obstacles on the x/y plane.
#[derive(Debug, Clone, PartialEq)]
pub struct LineOfSight {
    pub radius: f64,
    pub obstacles: Vec<Obstacle>,
}

impl ConnectivityModel for LineOfSight {
    fn name(&self) -> &str {
        "line_of_sight"
    }

    fn is_connected(&self, from: &NodeState, to: &NodeState) -> bool {
        UnitDiskGraph::new(self.radius).is_connected(from, to)
            && !is_blocked(&from.position, &to.position, &self.obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::{Position, RectArea};
    use crate::common::random::SimRng;
    use crate::simulation::types::NodeId;

    fn node(id: u32, x: f64, y: f64, z: f64) -> NodeState {
        NodeState::new(NodeId::new(id), "inert", Position::new(x, y, z), 0)
    }

    #[test]
    fn udg_matches_distance_and_is_symmetric() {
        let mut rng = SimRng::new(11);
        for radius in [0.0, 1.0, 5.0, 37.5] {
            let udg = UnitDiskGraph::new(radius);
            for i in 0..200 {
                let a = node(0, rng.random_f64(-50.0, 50.0), rng.random_f64(-50.0, 50.0), rng.random_f64(0.0, 10.0));
                let b = node(1, rng.random_f64(-50.0, 50.0), rng.random_f64(-50.0, 50.0), rng.random_f64(0.0, 10.0));
                let expected = a.position.distance(&b.position) <= radius;
                assert_eq!(udg.is_connected(&a, &b), expected, "sample {} radius {}", i, radius);
                assert_eq!(udg.is_connected(&a, &b), udg.is_connected(&b, &a));
            }
        }
    }

    #[test]
    fn udg_boundary_and_zero_distance() {
        let udg = UnitDiskGraph::new(5.0);
        assert!(udg.is_connected(&node(0, 0.0, 0.0, 0.0), &node(1, 3.0, 4.0, 0.0)));
        assert!(!udg.is_connected(&node(0, 0.0, 0.0, 0.0), &node(1, 10.0, 0.0, 0.0)));
        assert!(UnitDiskGraph::new(0.0).is_connected(&node(0, 2.0, 2.0, 2.0), &node(1, 2.0, 2.0, 2.0)));
    }

    #[test]
    fn quasi_udg_zones() {
        let q = QuasiUnitDiskGraph {
            inner: 2.0,
            outer: 6.0,
            probability: 0.5,
            salt: 1,
        };
        let origin = node(0, 0.0, 0.0, 0.0);
        assert!(q.is_connected(&origin, &node(1, 1.0, 0.0, 0.0)));
        assert!(!q.is_connected(&origin, &node(1, 7.0, 0.0, 0.0)));
        let grey = node(1, 4.0, 0.0, 0.0);
        assert_eq!(q.is_connected(&origin, &grey), q.is_connected(&origin, &grey));

        let always = QuasiUnitDiskGraph { probability: 1.0, ..q.clone() };
        assert!(always.is_connected(&origin, &grey));
        let never = QuasiUnitDiskGraph { probability: 0.0, ..q };
        assert!(!never.is_connected(&origin, &grey));
    }

    #[test]
    fn line_of_sight_cut_by_wall() {
        let los = LineOfSight {
            radius: 20.0,
            obstacles: vec![Obstacle::Rectangle(RectArea {
                top_left: Position::new(4.0, -1.0, 0.0),
                bottom_right: Position::new(6.0, 1.0, 0.0),
            })],
        };
        assert!(!los.is_connected(&node(0, 0.0, 0.0, 0.0), &node(1, 10.0, 0.0, 0.0)));
        assert!(los.is_connected(&node(0, 0.0, 5.0, 0.0), &node(1, 10.0, 5.0, 0.0)));
    }
}
