//! Reliability models: does a packet that survived interference make it
//! across the link?

use crate::common::random::SimRng;
use crate::simulation::signal_calculations::PathLoss;
use crate::simulation::types::Packet;

use super::{Link, ReliabilityModel};

#[derive(Debug, Clone, Default)]
pub struct ReliableDelivery;

impl ReliabilityModel for ReliableDelivery {
    fn name(&self) -> &str {
        "reliable"
    }

    fn reaches_destination(&self, _packet: &Packet, _link: &Link, _rng: &mut SimRng) -> bool {
        true
    }
}

/// Drops with `drop_rate`, raised by the packet's additive interference
/// penalty.
#[derive(Debug, Clone)]
pub struct LossyDelivery {
    pub drop_rate: f64,
}

impl ReliabilityModel for LossyDelivery {
    fn name(&self) -> &str {
        "lossy"
    }

    fn reaches_destination(&self, packet: &Packet, _link: &Link, rng: &mut SimRng) -> bool {
        let drop = (self.drop_rate + packet.interference()).clamp(0.0, 1.0);
        !rng.chance(drop)
    }
}

/// Delivered when the received power (shadowing included) reaches the
/// receiver sensitivity. An additive interference penalty counts as dB lost.
#[derive(Debug, Clone)]
pub struct PathLossReliability {
    pub path_loss: PathLoss,
    pub tx_power: f64,
    /// Weakest decodable signal, dBm.
    pub sensitivity: f64,
}

impl ReliabilityModel for PathLossReliability {
    fn name(&self) -> &str {
        "path_loss"
    }

    fn reaches_destination(&self, packet: &Packet, link: &Link, rng: &mut SimRng) -> bool {
        let rssi = self.path_loss.rssi(link.distance(), self.tx_power, rng) - packet.interference();
        rssi >= self.sensitivity
    }
}
