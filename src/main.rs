use adhoc_simulator::common::scene::load_scene;
use adhoc_simulator::control::{Pacer, RuntimeConfig};
use adhoc_simulator::{Registry, Simulation};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use env_logger::Builder;
use log::{LevelFilter, info, warn};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: adhoc-simulator <scene.json> [runtime.toml]";

fn init_logging(verbose: bool) {
    let crate_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("adhoc_simulator"), crate_level)
        .init();
}

/// The explicit runtime file, else `runtime.toml` next to the scene, else defaults.
fn load_runtime(scene_path: &str, explicit: Option<PathBuf>) -> Result<RuntimeConfig> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let beside = RuntimeConfig::config_path_from_scene(scene_path);
            if !beside.exists() {
                return Ok(RuntimeConfig::default());
            }
            beside
        }
    };
    RuntimeConfig::load(&path).with_context(|| format!("Failed to load runtime config {}", path.display()))
}

fn write_trace(sim: &Simulation, scene_name: Option<&str>, path: &Path) -> Result<()> {
    let export = json!({
        "exported_at": Utc::now().to_rfc3339(),
        "scene": scene_name,
        "trace": sim.snapshot().to_json(),
    });
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(&export).context("Failed to serialize trace")?;
    fs::write(path, text).with_context(|| format!("Failed to write trace to {}", path.display()))?;
    info!("Trace written to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(scene_path) = args.next() else {
        bail!(USAGE);
    };
    let runtime_path = args.next().map(PathBuf::from);

    let scene = load_scene(&scene_path).with_context(|| format!("Failed to load scene {}", scene_path))?;
    init_logging(scene.config.verbose);
    let runtime = load_runtime(&scene_path, runtime_path)?;
    info!(
        "Loaded scene '{}' ({} node(s), project '{}', {:?} mode)",
        scene.name.as_deref().unwrap_or(&scene_path),
        scene.total_nodes(),
        scene.config.project,
        scene.config.mode
    );

    let registry = Registry::with_builtin();
    let mut sim =
        Simulation::from_registry(&registry, scene.config.clone()).context("Failed to build the simulation")?;
    for batch in &scene.nodes {
        let report = sim
            .add_nodes(batch)
            .with_context(|| format!("Failed to add {} node(s) of kind '{}'", batch.count, batch.kind))?;
        for failure in &report.failures {
            warn!("{}", failure);
        }
    }

    let pacer = Pacer::new(&runtime);
    let report = pacer
        .run(&mut sim, |sim| {
            let stats = sim.stats();
            info!(
                "Round {}: {} sent, {} delivered, {} dropped, {} in flight",
                sim.round(),
                stats.packets_sent,
                stats.packets_delivered,
                stats.dropped(),
                sim.pending_packets()
            );
        })
        .context("Simulation failed")?;

    let stats = sim.stats();
    info!(
        "Finished after {} round(s) ({:?}): {} sent, {} delivered ({:.1}%), {} NACK(s), {} late round(s)",
        report.rounds,
        report.outcome,
        stats.packets_sent,
        stats.packets_delivered,
        stats.delivery_rate() * 100.0,
        stats.nacks_sent,
        report.late_rounds
    );

    if let Some(path) = &runtime.trace_path {
        write_trace(&sim, scene.name.as_deref(), path)?;
    }
    Ok(())
}
