//! Simulation kernel for QuReed photonic experiments.
//!
//! Devices exchange typed [`signal::Signal`]s over [`port::Ports`]. A
//! [`simulation::Simulation`] owns the devices and drives them either as a
//! threaded dataflow evaluation or as a discrete-event simulation. Physical
//! operations are queued on the shared [`experiment::Experiment`] through a
//! pluggable [`backend::Backend`] and executed by the Fock engine once the
//! run completes.

pub mod activation;
pub mod backend;
pub mod context;
pub mod device;
pub mod devices;
pub mod error;
pub mod experiment;
pub mod mode_manager;
pub mod port;
pub mod registry;
pub mod signal;
pub mod simulation;
pub mod utils;

pub use activation::{ActivationPipeline, Coordinator, Stage};
pub use backend::{Backend, FockBackendFirst};
pub use context::{DeviceContext, EventArg, EventContext};
pub use device::{
    Capabilities, DataflowDevice, Device, DeviceId, DeviceInformation, Emission, EventDevice,
};
pub use error::*;
pub use experiment::Experiment;
pub use mode_manager::{ModeId, ModeManager};
pub use port::{Port, Ports};
pub use registry::Registry;
pub use signal::{PortRef, QuantumContent, Signal, SignalMap, SignalRef, SignalValue};
pub use simulation::{EventQueue, Simulation, SimulationEvent};
pub use utils::SimTime;
