//! `qureed` binary: load a scheme, run it and report photon statistics.
//!
//! # Usage
//!
//! ```bash
//! qureed --scheme board.json --sim-type des --duration 1e-6 --trigger src
//! qureed --scheme board.json --sim-type dataflow --cutoff 4
//! ```

use clap::Parser;
use log::{error, info};
use qureed::prelude::*;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "qureed", version, about = "Photonic experiment simulator", long_about = None)]
struct Args {
    /// Scheme JSON file describing devices and connections
    #[arg(short, long, value_name = "FILE")]
    scheme: PathBuf,

    /// Execution mode (des, dataflow); overrides the scheme settings
    #[arg(long, value_name = "MODE")]
    sim_type: Option<ExecutionMode>,

    /// Simulated seconds covered by a DES run
    #[arg(long)]
    duration: Option<f64>,

    /// Fock-space truncation per mode
    #[arg(long)]
    cutoff: Option<usize>,

    /// Names of devices whose trigger port is driven by the simulation
    #[arg(long = "trigger", value_name = "NAME")]
    triggers: Vec<String>,

    /// Log filter (e.g. info, debug, qureed::fock=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> SimulationResult<()> {
    info!("Loading scheme from {}", args.scheme.display());
    let scheme = Scheme::from_json(&std::fs::read_to_string(&args.scheme)?)?;

    let mut settings = scheme.settings.clone().unwrap_or_default();
    if let Some(execution) = args.sim_type {
        settings.execution = execution;
    }
    if let Some(duration) = args.duration {
        settings.duration = duration;
    }
    if let Some(cutoff) = args.cutoff {
        settings.cutoff = cutoff;
    }

    let mut sim = Simulation::new(settings);
    sim.load_scheme(&scheme, &Registry::with_defaults())?;

    let triggered = args
        .triggers
        .iter()
        .map(|name| {
            sim.find_device(name)
                .ok_or_else(|| SimulationError::UnknownDevice(name.clone()))
        })
        .collect::<SimulationResult<Vec<_>>>()?;
    sim.register_triggers(&triggered)?;

    println!("{}", sim.list_devices());
    if !triggered.is_empty() {
        println!("{}", sim.list_triggered_devices());
    }

    let Some(state) = sim.run_configured()? else {
        println!("Simulation finished without a Fock state");
        return Ok(());
    };

    println!("Mode statistics (cutoff {}):", state.cutoff_dim());
    for (mode, index) in sim.mode_manager().modes() {
        println!("  mode {:>3}  {}  <n> = {:.6}", index, mode, state.mean_photon(index)?);
    }

    for info in sim.devices() {
        let Some(detector) = sim.device_as::<IdealDetector>(info.uuid) else {
            continue;
        };
        let means = detector
            .mean_photons(&state, sim.mode_manager())
            .map_err(|source| device_error(detector, source))?;
        let clicks = detector
            .click_probabilities(&state, sim.mode_manager())
            .map_err(|source| device_error(detector, source))?;
        println!("Detector {}:", detector.display_name());
        for ((detection, mean), click) in detector.detections().iter().zip(means).zip(clicks) {
            println!(
                "  [{}] mode {}  <n> = {:.6}  P(click) = {:.6}",
                detection.time, detection.mode, mean, click
            );
        }
    }
    Ok(())
}

fn device_error(detector: &IdealDetector, source: DeviceError) -> SimulationError {
    SimulationError::Device {
        device: detector.display_name(),
        type_name: detector.type_name(),
        source,
    }
}
