//! Projects shipped with the crate.
//!
//! - `default`: unit disk graph, static nodes, no interference, reliable
//!   links, one-round delay, uniform placement.
//! - `lora`: same catalog, defaults switched to the radio models (SINR
//!   interference, path loss reliability, airtime delay).

use serde_json::Value;

use crate::common::geometry::{Obstacle, Position};
use crate::error::SimResult;
use crate::simulation::builtin_nodes::{EchoNode, FloodingNode, InertNode, PingNode};
use crate::simulation::models::{
    AirtimeTransmission, ConnectivityModel, ConstantTime, DistanceTime, DistributionModel, FixedPositions,
    GridDistribution, InterferenceModel, LineDistribution, LineOfSight, LossyDelivery, MobilityModel, NoInterference,
    NoMobility, PathLossReliability, QuasiUnitDiskGraph, RandomDistribution, RandomInterference, RandomTime,
    RandomWalk, RandomWaypoint, ReliabilityModel, ReliableDelivery, SinrInterference, TransmissionModel,
    UnitDiskGraph,
};
use crate::simulation::node::NodeBehavior;
use crate::simulation::signal_calculations::{LoraTiming, PathLoss};
use crate::simulation::types::NodeId;

use super::{ParamSchema, Params, Project};

pub fn default_project() -> Project {
    let mut project = Project::new("default");
    register_nodes(&mut project);
    register_models(&mut project);
    project
}

pub fn lora_project() -> Project {
    let mut project = Project::new("lora");
    register_nodes(&mut project);
    register_models(&mut project);
    // entries registered just above; set_default cannot fail here
    let _ = project.interference.set_default("sinr");
    let _ = project.reliability.set_default("path_loss");
    let _ = project.transmission.set_default("airtime");
    project
}

fn register_nodes(project: &mut Project) {
    project
        .nodes
        .register("inert", ParamSchema::new(), inert_node)
        .register("echo", ParamSchema::new(), echo_node)
        .register(
            "flooding",
            ParamSchema::new()
                .boolean("originator", Some(false))
                .describe("starts the flood in its first round"),
            flooding_node,
        )
        .register(
            "ping",
            ParamSchema::new()
                .json("target", Some(Value::Null))
                .describe("node id to ping")
                .int("interval", Some(1), Some(0), None)
                .boolean("direct", Some(false))
                .describe("ignore the neighbor graph"),
            ping_node,
        );
}

fn register_models(project: &mut Project) {
    project
        .connectivity
        .register("udg", ParamSchema::new().float("radius", Some(10.0), Some(0.0), None), udg)
        .register(
            "quasi_udg",
            ParamSchema::new()
                .float("inner", Some(5.0), Some(0.0), None)
                .float("outer", Some(10.0), Some(0.0), None)
                .float("probability", Some(0.5), Some(0.0), Some(1.0)),
            quasi_udg,
        )
        .register(
            "line_of_sight",
            ParamSchema::new()
                .float("radius", Some(10.0), Some(0.0), None)
                .json("obstacles", Some(Value::Array(Vec::new()))),
            line_of_sight,
        );

    project
        .mobility
        .register("none", ParamSchema::new(), no_mobility)
        .register(
            "random_walk",
            ParamSchema::new().float("step", Some(1.0), Some(0.0), None),
            random_walk,
        )
        .register(
            "random_waypoint",
            ParamSchema::new()
                .float("speed", Some(1.0), Some(0.0), None)
                .int("pause_rounds", Some(0), Some(0), None),
            random_waypoint,
        );

    project
        .interference
        .register("none", ParamSchema::new(), no_interference)
        .register(
            "random",
            ParamSchema::new().float("probability", Some(0.1), Some(0.0), Some(1.0)),
            random_interference,
        )
        .register(
            "sinr",
            path_loss_schema()
                .float("tx_power", Some(14.0), None, None)
                .float("sinr_threshold", Some(6.0), None, None),
            sinr_interference,
        );

    project
        .reliability
        .register("reliable", ParamSchema::new(), reliable)
        .register(
            "lossy",
            ParamSchema::new().float("drop_rate", Some(0.1), Some(0.0), Some(1.0)),
            lossy,
        )
        .register(
            "path_loss",
            path_loss_schema()
                .float("tx_power", Some(14.0), None, None)
                .float("sensitivity", Some(-120.0), None, None),
            path_loss_reliability,
        );

    project
        .transmission
        .register(
            "constant",
            ParamSchema::new().int("delay", Some(1), Some(1), None),
            constant_time,
        )
        .register(
            "random",
            ParamSchema::new()
                .int("min", Some(1), Some(1), None)
                .int("max", Some(3), Some(1), None),
            random_time,
        )
        .register(
            "distance",
            ParamSchema::new()
                .int("base", Some(1), Some(1), None)
                .float("per_unit", Some(0.1), Some(0.0), None),
            distance_time,
        )
        .register(
            "airtime",
            ParamSchema::new()
                .int("bandwidth", Some(125_000), Some(1), None)
                .int("spreading_factor", Some(7), Some(5), Some(12))
                .int("coding_rate", Some(1), Some(1), Some(4))
                .float("preamble_symbols", Some(8.0), Some(0.0), None)
                .boolean("crc_enabled", Some(true))
                .boolean("low_data_rate_optimization", Some(false))
                .float("round_seconds", Some(0.1), Some(1e-6), None)
                .describe("wall time covered by one round"),
            airtime,
        );

    project
        .distribution
        .register("random", ParamSchema::new(), random_distribution)
        .register("grid", ParamSchema::new(), grid_distribution)
        .register(
            "line",
            ParamSchema::new()
                .json("from", Some(serde_json::json!({ "x": 0.0, "y": 0.0 })))
                .json("to", Some(serde_json::json!({ "x": 100.0, "y": 0.0 }))),
            line_distribution,
        )
        .register(
            "fixed",
            ParamSchema::new().json("positions", None).describe("list of {x, y, z}"),
            fixed_positions,
        );
}

fn path_loss_schema() -> ParamSchema {
    let defaults = PathLoss::default();
    ParamSchema::new()
        .float("exponent", Some(defaults.exponent), Some(0.0), None)
        .float("shadowing_sigma", Some(defaults.shadowing_sigma), Some(0.0), None)
        .float("reference_loss", Some(defaults.reference_loss), None, None)
        .float("noise_floor", Some(defaults.noise_floor), None, None)
}

fn path_loss(params: &Params) -> SimResult<PathLoss> {
    Ok(PathLoss {
        exponent: params.f64("exponent")?,
        shadowing_sigma: params.f64("shadowing_sigma")?,
        reference_loss: params.f64("reference_loss")?,
        noise_floor: params.f64("noise_floor")?,
    })
}

// ---------- node factories ----------

fn inert_node(_: &Params) -> SimResult<Box<dyn NodeBehavior>> {
    Ok(Box::new(InertNode))
}

fn echo_node(_: &Params) -> SimResult<Box<dyn NodeBehavior>> {
    Ok(Box::new(EchoNode::default()))
}

fn flooding_node(params: &Params) -> SimResult<Box<dyn NodeBehavior>> {
    Ok(Box::new(FloodingNode::new(params.bool("originator")?)))
}

fn ping_node(params: &Params) -> SimResult<Box<dyn NodeBehavior>> {
    let target: Option<u32> = params.decode("target")?;
    let mut node = PingNode::new(target.map(NodeId::new), params.u64("interval")?);
    node.direct = params.bool("direct")?;
    Ok(Box::new(node))
}

// ---------- model factories ----------

fn udg(params: &Params) -> SimResult<Box<dyn ConnectivityModel>> {
    Ok(Box::new(UnitDiskGraph::new(params.f64("radius")?)))
}

fn quasi_udg(params: &Params) -> SimResult<Box<dyn ConnectivityModel>> {
    let (inner, outer) = (params.f64("inner")?, params.f64("outer")?);
    if inner > outer {
        return Err(params.reject("outer", format!("{} is below inner radius {}", outer, inner)));
    }
    Ok(Box::new(QuasiUnitDiskGraph {
        inner,
        outer,
        probability: params.f64("probability")?,
        salt: params.seed(),
    }))
}

fn line_of_sight(params: &Params) -> SimResult<Box<dyn ConnectivityModel>> {
    let obstacles: Vec<Obstacle> = params.decode("obstacles")?;
    Ok(Box::new(LineOfSight {
        radius: params.f64("radius")?,
        obstacles,
    }))
}

fn no_mobility(_: &Params) -> SimResult<Box<dyn MobilityModel>> {
    Ok(Box::new(NoMobility))
}

fn random_walk(params: &Params) -> SimResult<Box<dyn MobilityModel>> {
    Ok(Box::new(RandomWalk {
        step: params.f64("step")?,
    }))
}

fn random_waypoint(params: &Params) -> SimResult<Box<dyn MobilityModel>> {
    Ok(Box::new(RandomWaypoint::new(params.f64("speed")?, params.u64("pause_rounds")?)))
}

fn no_interference(_: &Params) -> SimResult<Box<dyn InterferenceModel>> {
    Ok(Box::new(NoInterference))
}

fn random_interference(params: &Params) -> SimResult<Box<dyn InterferenceModel>> {
    Ok(Box::new(RandomInterference {
        probability: params.f64("probability")?,
    }))
}

fn sinr_interference(params: &Params) -> SimResult<Box<dyn InterferenceModel>> {
    Ok(Box::new(SinrInterference {
        path_loss: path_loss(params)?,
        tx_power: params.f64("tx_power")?,
        sinr_threshold: params.f64("sinr_threshold")?,
    }))
}

fn reliable(_: &Params) -> SimResult<Box<dyn ReliabilityModel>> {
    Ok(Box::new(ReliableDelivery))
}

fn lossy(params: &Params) -> SimResult<Box<dyn ReliabilityModel>> {
    Ok(Box::new(LossyDelivery {
        drop_rate: params.f64("drop_rate")?,
    }))
}

fn path_loss_reliability(params: &Params) -> SimResult<Box<dyn ReliabilityModel>> {
    Ok(Box::new(PathLossReliability {
        path_loss: path_loss(params)?,
        tx_power: params.f64("tx_power")?,
        sensitivity: params.f64("sensitivity")?,
    }))
}

fn constant_time(params: &Params) -> SimResult<Box<dyn TransmissionModel>> {
    Ok(Box::new(ConstantTime::new(params.u64("delay")?)))
}

fn random_time(params: &Params) -> SimResult<Box<dyn TransmissionModel>> {
    let (min, max) = (params.u64("min")?, params.u64("max")?);
    if min > max {
        return Err(params.reject("max", format!("{} is below min {}", max, min)));
    }
    Ok(Box::new(RandomTime { min, max }))
}

fn distance_time(params: &Params) -> SimResult<Box<dyn TransmissionModel>> {
    Ok(Box::new(DistanceTime {
        base: params.u64("base")?,
        per_unit: params.f64("per_unit")?,
    }))
}

fn airtime(params: &Params) -> SimResult<Box<dyn TransmissionModel>> {
    let timing = LoraTiming {
        bandwidth: params.u64("bandwidth")? as u32,
        spreading_factor: params.u64("spreading_factor")? as u8,
        coding_rate: params.u64("coding_rate")? as u32,
        preamble_symbols: params.f64("preamble_symbols")?,
        crc_enabled: params.bool("crc_enabled")?,
        low_data_rate_optimization: params.bool("low_data_rate_optimization")?,
    };
    Ok(Box::new(AirtimeTransmission {
        timing,
        round_seconds: params.f64("round_seconds")?,
    }))
}

fn random_distribution(_: &Params) -> SimResult<Box<dyn DistributionModel>> {
    Ok(Box::new(RandomDistribution))
}

fn grid_distribution(_: &Params) -> SimResult<Box<dyn DistributionModel>> {
    Ok(Box::new(GridDistribution))
}

fn line_distribution(params: &Params) -> SimResult<Box<dyn DistributionModel>> {
    Ok(Box::new(LineDistribution {
        from: params.decode::<Position>("from")?,
        to: params.decode::<Position>("to")?,
    }))
}

fn fixed_positions(params: &Params) -> SimResult<Box<dyn DistributionModel>> {
    Ok(Box::new(FixedPositions::new(params.decode("positions")?)))
}
