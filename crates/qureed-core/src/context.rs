//! Context objects handed to devices.
//!
//! [`DeviceContext`] replaces process-wide singletons: it carries the settings
//! and shared handles to the mode manager, experiment, backend and coordinator
//! of one simulation. [`EventContext`] wraps it for a single event dispatch.

use qureed_types::{SimulationSettings, SimulationType};
use std::sync::Arc;

use crate::activation::Coordinator;
use crate::backend::{Backend, FockBackendFirst};
use crate::error::{DeviceError, DeviceResult};
use crate::experiment::Experiment;
use crate::mode_manager::{ModeId, ModeManager};
use crate::signal::SignalMap;
use crate::utils::SimTime;

/// Extra arguments attached to an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Scheduled from a device's bootstrap times
    Bootstrap,
    /// Self wake-up requested through [`EventContext::schedule_self`]
    Wake,
    /// Free-form marker
    Tag(String),
}

/// Shared state of one simulation
#[derive(Clone)]
pub struct DeviceContext {
    pub settings: SimulationSettings,
    pub mode_manager: Arc<ModeManager>,
    pub experiment: Arc<Experiment>,
    pub backend: Arc<dyn Backend>,
    pub coordinator: Option<Arc<dyn Coordinator>>,
}

impl DeviceContext {
    pub fn new(settings: SimulationSettings) -> Self {
        let experiment = Arc::new(Experiment::new(0, settings.cutoff));
        let backend: Arc<dyn Backend> = Arc::new(FockBackendFirst::new(experiment.clone()));
        Self {
            settings,
            mode_manager: Arc::new(ModeManager::new()),
            experiment,
            backend,
            coordinator: None,
        }
    }

    pub fn is_fock(&self) -> bool {
        self.settings.simulation_type == SimulationType::Fock
    }

    /// Tensor index of a mode
    pub fn mode_index(&self, mode: ModeId) -> DeviceResult<usize> {
        Ok(self.mode_manager.get_mode_index(mode)?)
    }

    /// Allocate a mode and return it with its tensor index
    pub fn new_mode(&self) -> (ModeId, usize) {
        self.mode_manager.create_indexed_mode()
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("settings", &self.settings)
            .field("modes", &self.mode_manager.len())
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Per-dispatch view given to [`crate::device::EventDevice::des`]
pub struct EventContext<'a> {
    shared: &'a DeviceContext,
    args: &'a [EventArg],
    wakeups: Vec<(SimTime, EventArg)>,
}

impl<'a> EventContext<'a> {
    pub fn new(shared: &'a DeviceContext, args: &'a [EventArg]) -> Self {
        Self {
            shared,
            args,
            wakeups: Vec::new(),
        }
    }

    pub fn shared(&self) -> &DeviceContext {
        self.shared
    }

    pub fn args(&self) -> &[EventArg] {
        self.args
    }

    /// True if this event is a self wake-up
    pub fn is_wake(&self) -> bool {
        self.args.contains(&EventArg::Wake)
    }

    pub fn is_bootstrap(&self) -> bool {
        self.args.contains(&EventArg::Bootstrap)
    }

    /// Ask to be called again at `time` with no signals
    pub fn schedule_self(&mut self, time: SimTime) {
        self.wakeups.push((time, EventArg::Wake));
    }

    pub(crate) fn into_wakeups(self) -> Vec<(SimTime, EventArg)> {
        self.wakeups
    }
}

/// Read a quantum input from a signal map
pub(crate) fn quantum_mode(signals: &SignalMap, label: &str) -> DeviceResult<Option<ModeId>> {
    match signals.get(label) {
        None => Ok(None),
        Some(signal) => Ok(Some(signal.as_quantum().map_err(DeviceError::from)?.mode)),
    }
}
