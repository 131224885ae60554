//! QuReed - photonic experiment simulation
//!
//! Devices such as sources, beam splitters, fibers and detectors are wired
//! together through typed signals and driven either by a discrete-event
//! scheduler or by a threaded dataflow evaluation. Quantum operations are
//! queued on a shared experiment and evaluated in a truncated Fock basis.
//!
//! # Crates
//!
//! - [`types`]: settings, signal kinds and the persisted scheme format
//! - [`fock`]: density-matrix numerics
//! - [`kernel`]: signals, ports, devices and the simulation kernel
//!
//! # Example
//!
//! ```rust,ignore
//! use qureed::prelude::*;
//!
//! let mut sim = Simulation::new(SimulationSettings::default().with_cutoff(4));
//! let source = sim.add_device(IdealNPhotonSource::new(Some("src"), None))?;
//! let detector = sim.add_device(IdealDetector::new(Some("det"), None))?;
//! sim.connect(SignalKind::Quantum, (source, "output"), (detector, "input"))?;
//! sim.register_triggers(&[source])?;
//!
//! let state = sim.run_des(1e-6)?.expect("fock run");
//! println!("<n> = {}", state.mean_photon(0)?);
//! ```

pub use qureed_core as kernel;
pub use qureed_fock as fock;
pub use qureed_types as types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use qureed_core::devices::*;
    pub use qureed_core::{
        Backend, Device, DeviceError, DeviceId, Registry, SignalRef, SimTime, Simulation,
        SimulationError, SimulationResult,
    };
    pub use qureed_fock::{FockState, Gate};
    pub use qureed_types::{ExecutionMode, Scheme, SignalKind, SimulationSettings, SimulationType};
}
