//! Transmission delay models. The arrival round is fixed at send time as
//! `origin + time_to_reach`, and `time_to_reach` is always at least 1.

use crate::common::random::SimRng;
use crate::simulation::signal_calculations::LoraTiming;
use crate::simulation::types::Packet;

use super::{Link, TransmissionModel};

#[derive(Debug, Clone)]
pub struct ConstantTime {
    pub delay: u64,
}

impl ConstantTime {
    pub fn new(delay: u64) -> Self {
        ConstantTime { delay }
    }
}

impl TransmissionModel for ConstantTime {
    fn name(&self) -> &str {
        "constant"
    }

    fn time_to_reach(&self, _packet: &Packet, _link: &Link, _rng: &mut SimRng) -> u64 {
        self.delay
    }
}

/// Uniform delay in `[min, max]` rounds.
#[derive(Debug, Clone)]
pub struct RandomTime {
    pub min: u64,
    pub max: u64,
}

impl TransmissionModel for RandomTime {
    fn name(&self) -> &str {
        "random"
    }

    fn time_to_reach(&self, _packet: &Packet, _link: &Link, rng: &mut SimRng) -> u64 {
        let lo = self.min.min(i64::MAX as u64) as i64;
        let hi = self.max.min(i64::MAX as u64) as i64;
        rng.random_int(lo, hi) as u64
    }
}

/// `base + ceil(distance × per_unit)` rounds.
#[derive(Debug, Clone)]
pub struct DistanceTime {
    pub base: u64,
    pub per_unit: f64,
}

impl TransmissionModel for DistanceTime {
    fn name(&self) -> &str {
        "distance"
    }

    fn time_to_reach(&self, _packet: &Packet, link: &Link, _rng: &mut SimRng) -> u64 {
        let extra = (link.distance() * self.per_unit).ceil();
        if extra.is_finite() && extra > 0.0 {
            self.base.saturating_add(extra as u64)
        } else {
            self.base
        }
    }
}

/// Payload-size aware delay: LoRa time on air converted to rounds of
/// `round_seconds`, never below one round.
#[derive(Debug, Clone)]
pub struct AirtimeTransmission {
    pub timing: LoraTiming,
    pub round_seconds: f64,
}

impl TransmissionModel for AirtimeTransmission {
    fn name(&self) -> &str {
        "airtime"
    }

    fn time_to_reach(&self, packet: &Packet, _link: &Link, _rng: &mut SimRng) -> u64 {
        let rounds = (self.timing.airtime(packet.payload_size()) / self.round_seconds).ceil();
        if rounds.is_finite() && rounds >= 1.0 { rounds as u64 } else { 1 }
    }
}
