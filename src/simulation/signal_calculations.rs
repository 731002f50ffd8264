//! Radio signal and timing calculations backing the physical models.
//!
//! Contains helpers for:
//! - Log-distance path loss with optional log-normal shadowing
//! - Received power and receiver sensitivity (noise floor + SNR limit)
//! - Power conversion between dBm and mW
//! - LoRa-style airtime estimates for payload-size aware delays
//!
//! Units: power in dBm / mW, distance in world units (treated as meters),
//! time in seconds.

use serde::{Deserialize, Serialize};

use crate::common::random::SimRng;

/// Log-distance path loss parameters.
///
/// ```text
/// PL(d) = PL(d₀) + 10 × n × log₁₀(d / d₀) + X_σ,   d₀ = 1 m
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathLoss {
    /// Path loss exponent (n). 2.0 free space, 2.7-3.5 urban.
    pub exponent: f64,
    /// Log-normal shadowing deviation (σ) in dB. 0 disables shadowing.
    pub shadowing_sigma: f64,
    /// Loss at the 1 m reference distance, in dB.
    pub reference_loss: f64,
    /// Receiver thermal noise floor in dBm.
    pub noise_floor: f64,
}

impl Default for PathLoss {
    fn default() -> Self {
        PathLoss {
            exponent: 2.7,
            shadowing_sigma: 0.0,
            reference_loss: 40.0,
            noise_floor: -120.0,
        }
    }
}

impl PathLoss {
    /// Path loss in dB. Distances under the 1 m reference return the
    /// reference loss. Shadowing draws one sample from `rng` per call.
    pub fn loss(&self, distance: f64, rng: &mut SimRng) -> f64 {
        if distance < 1.0 {
            return self.reference_loss;
        }
        self.mean_loss(distance) + rng.normal(0.0, self.shadowing_sigma)
    }

    /// Path loss without shadowing.
    pub fn mean_loss(&self, distance: f64) -> f64 {
        if distance < 1.0 {
            return self.reference_loss;
        }
        self.reference_loss + 10.0 * self.exponent * distance.log10()
    }

    /// Received power in dBm at `distance` for a `tx_power` dBm transmitter.
    pub fn rssi(&self, distance: f64, tx_power: f64, rng: &mut SimRng) -> f64 {
        tx_power - self.loss(distance, rng)
    }

    /// Distance at which the mean received power hits `sensitivity`.
    /// Shadowing is ignored so the estimate is stable across calls.
    pub fn effective_distance(&self, tx_power: f64, sensitivity: f64) -> f64 {
        let budget = tx_power - sensitivity - self.reference_loss;
        if budget <= 0.0 || self.exponent <= 0.0 {
            return 0.0;
        }
        10f64.powf(budget / (10.0 * self.exponent))
    }
}

pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

/// Inverse of [`dbm_to_mw`]; non-positive input yields `-inf`.
pub fn mw_to_dbm(mw: f64) -> f64 {
    if mw <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * mw.log10()
}

/// Demodulation floor per spreading factor, in dB.
pub fn snr_limit(spreading_factor: u8) -> f64 {
    match spreading_factor {
        5 => -2.5,
        6 => -5.0,
        7 => -7.5,
        8 => -10.0,
        9 => -12.5,
        10 => -15.0,
        11 => -17.5,
        _ => -20.0,
    }
}

/// LoRa modulation settings used for airtime estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraTiming {
    pub bandwidth: u32,
    pub spreading_factor: u8,
    /// 1..=4 for coding rates 4/5..4/8.
    pub coding_rate: u32,
    pub preamble_symbols: f64,
    pub crc_enabled: bool,
    pub low_data_rate_optimization: bool,
}

impl Default for LoraTiming {
    fn default() -> Self {
        LoraTiming {
            bandwidth: 125_000,
            spreading_factor: 7,
            coding_rate: 1,
            preamble_symbols: 8.0,
            crc_enabled: true,
            low_data_rate_optimization: false,
        }
    }
}

impl LoraTiming {
    pub fn symbol_time(&self) -> f64 {
        2f64.powi(self.spreading_factor as i32) / self.bandwidth as f64
    }

    /// Time on air in seconds for `payload_size` bytes, explicit header mode.
    ///
    /// ```text
    /// N_payload = 8 + max(ceil((8PL - 4SF + 28 + 16CRC) / (4(SF - 2DE))) × (CR + 4), 0)
    /// ```
    pub fn airtime(&self, payload_size: usize) -> f64 {
        let symbol_time = self.symbol_time();
        let preamble_time = (self.preamble_symbols + 4.25) * symbol_time;

        let sf = self.spreading_factor as f64;
        let crc = if self.crc_enabled { 1.0 } else { 0.0 };
        let de = if self.low_data_rate_optimization { 1.0 } else { 0.0 };
        let cr = self.coding_rate as f64;

        let numerator = 8.0 * payload_size as f64 - 4.0 * sf + 28.0 + 16.0 * crc;
        let base = (numerator / (4.0 * (sf - 2.0 * de))).ceil();
        let payload_symbols = 8.0 + (base * (cr + 4.0)).max(0.0);

        preamble_time + payload_symbols * symbol_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn airtime_grows_with_payload_and_spreading_factor() {
        let mut timing = LoraTiming::default();
        let small = timing.airtime(10);
        let big = timing.airtime(100);
        assert!(big > small);
        timing.spreading_factor = 9;
        assert!(timing.airtime(10) > small);
    }

    #[test]
    fn loss_without_shadowing_is_deterministic() {
        let pl = PathLoss {
            exponent: 2.0,
            ..PathLoss::default()
        };
        let mut rng = SimRng::new(1);
        assert_eq!(pl.loss(0.5, &mut rng), 40.0);
        assert!((pl.loss(10.0, &mut rng) - 60.0).abs() < 1e-9);
        assert!((pl.rssi(100.0, 14.0, &mut rng) - (14.0 - 80.0)).abs() < 1e-9);
    }

    #[test]
    fn effective_distance_monotonic_with_power() {
        let pl = PathLoss::default();
        let sens = pl.noise_floor + snr_limit(7);
        let low = pl.effective_distance(0.0, sens);
        let high = pl.effective_distance(20.0, sens);
        assert!(low < high);
        assert_eq!(pl.effective_distance(-200.0, sens), 0.0);
    }

    #[test]
    fn dbm_mw_round_trip() {
        for v in [-100.0, -50.0, 0.0, 10.0] {
            assert!((mw_to_dbm(dbm_to_mw(v)) - v).abs() < 1e-9);
        }
        assert_eq!(mw_to_dbm(0.0), f64::NEG_INFINITY);
    }
}
