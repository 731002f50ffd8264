//! Real-time pacing.
//!
//! The pacer drives a simulation one virtual round at a time, sleeping
//! between rounds to hold a target rate, and hands the simulation to a
//! refresh callback every `refresh_rate` rounds. The engine itself has no
//! notion of wall-clock time.

use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SimResult;
use crate::simulation::{RunOutcome, Simulation};

use super::config::RuntimeConfig;

/// Rounds later than this many budgets in a row trigger a warning.
const LATE_WARNING_STREAK: u64 = 10;

/// Summary of one pacing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaceReport {
    pub outcome: RunOutcome,
    /// Virtual rounds the pacer advanced through.
    pub rounds: u64,
    /// Asynchronous events handled during the run.
    pub events: u64,
    pub refreshes: u64,
    /// Rounds that overran their real-time budget.
    pub late_rounds: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pacer {
    rounds: u64,
    round_budget: Option<Duration>,
    refresh_rate: u64,
}

impl Pacer {
    pub fn new(config: &RuntimeConfig) -> Self {
        Pacer {
            rounds: config.rounds,
            round_budget: config
                .rounds_per_second
                .filter(|rate| rate.is_finite() && *rate > 0.0)
                .map(|rate| Duration::from_secs_f64(1.0 / rate)),
            refresh_rate: config.refresh_rate,
        }
    }

    pub fn round_budget(&self) -> Option<Duration> {
        self.round_budget
    }

    /// Drive `sim` for the configured number of rounds, stopping early when
    /// it is stopped or has nothing left to do.
    pub fn run<F>(&self, sim: &mut Simulation, mut on_refresh: F) -> SimResult<PaceReport>
    where
        F: FnMut(&Simulation),
    {
        let start = sim.round();
        let events_before = sim.stats().events;
        let mut report = PaceReport {
            outcome: RunOutcome::Completed,
            rounds: 0,
            events: 0,
            refreshes: 0,
            late_rounds: 0,
        };
        let mut late_streak = 0;
        info!("Pacing {} round(s) from round {}", self.rounds, start);

        for target in (start + 1)..=start.saturating_add(self.rounds) {
            let round_start = Instant::now();
            let outcome = sim.run_until(target)?;
            report.events = sim.stats().events - events_before;

            if outcome != RunOutcome::Completed {
                info!("Pacing ended at round {}: {:?}", sim.round(), outcome);
                report.outcome = outcome;
                return Ok(report);
            }
            report.rounds += 1;

            if self.refresh_rate > 0 && report.rounds % self.refresh_rate == 0 {
                on_refresh(sim);
                report.refreshes += 1;
            }

            if let Some(budget) = self.round_budget {
                let elapsed = round_start.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                    late_streak = 0;
                } else {
                    report.late_rounds += 1;
                    late_streak += 1;
                    debug!("Round {} overran its budget: {:?} > {:?}", target - 1, elapsed, budget);
                    if late_streak == LATE_WARNING_STREAK {
                        warn!("Simulation cannot keep up with the requested rate ({:?} per round)", budget);
                    }
                }
            }
        }

        info!("Pacing done: {} round(s), {} event(s)", report.rounds, report.events);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::Position;
    use crate::simulation::builtin_nodes::{EchoNode, InertNode, PingNode};
    use crate::simulation::models::ModelSet;
    use crate::simulation::{NodeId, SimulationConfig, SimulationMode};

    fn sim(mode: SimulationMode) -> Simulation {
        let config = SimulationConfig {
            mode,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, ModelSet::default()).unwrap();
        sim.add_node_at(Box::new(PingNode::new(Some(NodeId::new(1)), 3)), Position::new(1.0, 1.0, 0.0))
            .unwrap();
        sim.add_node_at(Box::new(EchoNode::default()), Position::new(2.0, 1.0, 0.0))
            .unwrap();
        sim
    }

    fn runtime(rounds: u64, refresh_rate: u64) -> RuntimeConfig {
        RuntimeConfig {
            rounds,
            refresh_rate,
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn runs_the_configured_rounds_and_refreshes() {
        let mut sim = sim(SimulationMode::Synchronous);
        let mut seen = Vec::new();
        let report = Pacer::new(&runtime(10, 4)).run(&mut sim, |s| seen.push(s.round())).unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.rounds, 10);
        assert_eq!(report.refreshes, 2);
        assert_eq!(seen, vec![4, 8]);
        assert_eq!(sim.round(), 10);
    }

    #[test]
    fn stops_when_asked() {
        let mut sim = sim(SimulationMode::Synchronous);
        let handle = sim.stop_handle();
        let report = Pacer::new(&runtime(10, 1))
            .run(&mut sim, |s| {
                if s.round() == 3 {
                    handle.stop();
                }
            })
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert_eq!(report.rounds, 3);
        assert_eq!(sim.round(), 3);
    }

    #[test]
    fn asynchronous_run_goes_idle() {
        let mut sim = Simulation::new(
            SimulationConfig {
                mode: SimulationMode::Asynchronous,
                ..SimulationConfig::default()
            },
            ModelSet::default(),
        )
        .unwrap();
        sim.add_node_at(Box::new(InertNode), Position::new(1.0, 1.0, 0.0)).unwrap();
        let report = Pacer::new(&runtime(50, 0)).run(&mut sim, |_| {}).unwrap();
        assert_eq!(report.outcome, RunOutcome::Idle);
        assert_eq!(report.rounds, 0);
        assert_eq!(report.events, 0);
    }

    #[test]
    fn rate_sets_a_round_budget() {
        let config = RuntimeConfig {
            rounds: 2,
            rounds_per_second: Some(8.0),
            ..RuntimeConfig::default()
        };
        let pacer = Pacer::new(&config);
        assert_eq!(pacer.round_budget(), Some(Duration::from_millis(125)));

        let mut sim = sim(SimulationMode::Synchronous);
        let started = Instant::now();
        let report = pacer.run(&mut sim, |_| {}).unwrap();
        assert_eq!(report.rounds, 2);
        assert!(started.elapsed() >= Duration::from_millis(240));
        assert!(Pacer::new(&RuntimeConfig::default()).round_budget().is_none());
    }
}
