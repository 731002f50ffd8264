//! Interference models, evaluated once per packet when the round's sends are
//! merged, with every concurrent transmitter of that round known.

use crate::common::random::SimRng;
use crate::simulation::signal_calculations::{PathLoss, dbm_to_mw, mw_to_dbm};
use crate::simulation::types::Packet;

use super::{InterferenceModel, Link};

#[derive(Debug, Clone, Default)]
pub struct NoInterference;

impl InterferenceModel for NoInterference {
    fn name(&self) -> &str {
        "none"
    }

    fn is_disturbed(&self, _packet: &Packet, _link: &Link, _rng: &mut SimRng) -> bool {
        false
    }

    fn disturbance(&self, _packet: &Packet, _link: &Link, _rng: &mut SimRng) -> f64 {
        0.0
    }
}

/// Each packet is disturbed independently with `probability`.
#[derive(Debug, Clone)]
pub struct RandomInterference {
    pub probability: f64,
}

impl InterferenceModel for RandomInterference {
    fn name(&self) -> &str {
        "random"
    }

    fn is_disturbed(&self, _packet: &Packet, _link: &Link, rng: &mut SimRng) -> bool {
        rng.chance(self.probability)
    }
}

/// Signal to interference plus noise ratio.
///
/// The wanted signal follows the path loss model (shadowing included); every
/// other transmitter of the round adds its mean received power to the noise
/// floor. The packet is disturbed when the SINR drops below `sinr_threshold`.
#[derive(Debug, Clone)]
pub struct SinrInterference {
    pub path_loss: PathLoss,
    /// Transmit power of every node, dBm.
    pub tx_power: f64,
    /// Minimum SINR in dB for a clean reception.
    pub sinr_threshold: f64,
}

struct Reception {
    signal_mw: f64,
    interference_mw: f64,
    noise_mw: f64,
}

impl Reception {
    fn sinr_db(&self) -> f64 {
        mw_to_dbm(self.signal_mw) - mw_to_dbm(self.interference_mw + self.noise_mw)
    }
}

impl SinrInterference {
    fn reception(&self, link: &Link, rng: &mut SimRng) -> Reception {
        let signal_mw = dbm_to_mw(self.path_loss.rssi(link.distance(), self.tx_power, rng));
        let receiver = &link.receiver.position;
        let interference_mw = link
            .concurrent
            .iter()
            .filter(|t| t.sender != link.sender.id && t.sender != link.receiver.id)
            .map(|t| dbm_to_mw(self.tx_power - self.path_loss.mean_loss(t.position.distance(receiver))))
            .sum();
        Reception {
            signal_mw,
            interference_mw,
            noise_mw: dbm_to_mw(self.path_loss.noise_floor),
        }
    }
}

impl InterferenceModel for SinrInterference {
    fn name(&self) -> &str {
        "sinr"
    }

    fn is_disturbed(&self, _packet: &Packet, link: &Link, rng: &mut SimRng) -> bool {
        self.reception(link, rng).sinr_db() < self.sinr_threshold
    }

    /// Share of the received power that belongs to other transmitters.
    fn disturbance(&self, _packet: &Packet, link: &Link, rng: &mut SimRng) -> f64 {
        let r = self.reception(link, rng);
        let total = r.signal_mw + r.interference_mw;
        if total <= 0.0 { 0.0 } else { r.interference_mw / total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::Position;
    use crate::simulation::models::Transmission;
    use crate::simulation::node::NodeState;
    use crate::simulation::types::{NodeId, PacketId, PacketKind};
    use serde_json::json;

    fn state(id: u32, x: f64) -> NodeState {
        NodeState::new(NodeId::new(id), "inert", Position::new(x, 0.0, 0.0), 0)
    }

    fn packet() -> Packet {
        Packet {
            id: PacketId::new(0),
            sender: NodeId::new(0),
            receiver: NodeId::new(1),
            broadcast: false,
            kind: PacketKind::Data,
            payload: json!(null),
            origin_round: 0,
            arrival_round: 0,
            interference: 0.0,
        }
    }

    fn sinr() -> SinrInterference {
        SinrInterference {
            path_loss: PathLoss::default(),
            tx_power: 14.0,
            sinr_threshold: 6.0,
        }
    }

    #[test]
    fn sinr_clean_when_alone() {
        let (a, b) = (state(0, 0.0), state(1, 10.0));
        let concurrent = [Transmission {
            sender: a.id,
            position: a.position,
        }];
        let link = Link {
            sender: &a,
            receiver: &b,
            round: 0,
            concurrent: &concurrent,
        };
        let mut rng = SimRng::new(1);
        assert!(!sinr().is_disturbed(&packet(), &link, &mut rng));
        assert_eq!(sinr().disturbance(&packet(), &link, &mut rng), 0.0);
    }

    #[test]
    fn sinr_disturbed_by_closer_transmitter() {
        let (a, b) = (state(0, 0.0), state(1, 50.0));
        let jammer = state(2, 51.0);
        let concurrent = [
            Transmission {
                sender: a.id,
                position: a.position,
            },
            Transmission {
                sender: jammer.id,
                position: jammer.position,
            },
        ];
        let link = Link {
            sender: &a,
            receiver: &b,
            round: 0,
            concurrent: &concurrent,
        };
        let mut rng = SimRng::new(1);
        assert!(sinr().is_disturbed(&packet(), &link, &mut rng));
        assert!(sinr().disturbance(&packet(), &link, &mut rng) > 0.9);
    }

    #[test]
    fn random_interference_extremes() {
        let (a, b) = (state(0, 0.0), state(1, 1.0));
        let link = Link {
            sender: &a,
            receiver: &b,
            round: 0,
            concurrent: &[],
        };
        let mut rng = SimRng::new(3);
        let always = RandomInterference { probability: 1.0 };
        let never = RandomInterference { probability: 0.0 };
        for _ in 0..50 {
            assert!(always.is_disturbed(&packet(), &link, &mut rng));
            assert!(!never.is_disturbed(&packet(), &link, &mut rng));
        }
        assert_eq!(always.disturbance(&packet(), &link, &mut rng), 1.0);
        assert!(!NoInterference.is_disturbed(&packet(), &link, &mut rng));
    }
}
