//! Simulation context.
//!
//! A [`Simulation`] owns its devices and the shared [`DeviceContext`]
//! (settings, mode manager, experiment, backend). It wires devices together
//! and drives them either through the discrete-event loop (`run_des`) or a
//! single threaded-dataflow pass (`run`).

mod dataflow;
mod des;
mod event;
mod loader;

pub use event::{EventQueue, SimulationEvent};

use log::{debug, info};
use qureed_fock::FockState;
use qureed_types::{ExecutionMode, SignalKind, SimulationSettings, SimulationType};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use crate::activation::{ActivationPipeline, Coordinator};
use crate::backend::Backend;
use crate::context::{DeviceContext, EventArg};
use crate::device::{Capabilities, Device, DeviceId, DeviceInformation};
use crate::error::{SimulationError, SimulationResult};
use crate::experiment::Experiment;
use crate::mode_manager::ModeManager;
use crate::signal::{Signal, SignalMap, SignalRef};
use crate::utils::constants::TRIGGER_PORT;
use crate::utils::SimTime;

struct DeviceSlot {
    device: Box<dyn Device>,
    capabilities: Capabilities,
    /// Bootstrap wake-ups already queued
    bootstrapped: bool,
    /// Signal latched `true` at the start of a run
    trigger: Option<SignalRef>,
}

impl DeviceSlot {
    fn information(&self) -> DeviceInformation {
        DeviceInformation {
            uuid: self.device.id(),
            name: self.device.name().map(str::to_string),
            device_type: self.device.type_name(),
            capabilities: self.capabilities,
            new_modes: self.device.new_modes(),
        }
    }
}

/// One line of the device listing
#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    device_type: &'static str,
    #[tabled(rename = "UUID")]
    uuid: String,
}

pub struct Simulation {
    context: DeviceContext,
    devices: Vec<DeviceSlot>,
    queue: EventQueue,
    pipeline: ActivationPipeline,
    current_time: SimTime,
    end_time: SimTime,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}

impl Simulation {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            context: DeviceContext::new(settings),
            devices: Vec::new(),
            queue: EventQueue::new(),
            pipeline: ActivationPipeline::default(),
            current_time: SimTime::ZERO,
            end_time: SimTime::ZERO,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.context.settings
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn mode_manager(&self) -> &Arc<ModeManager> {
        &self.context.mode_manager
    }

    pub fn experiment(&self) -> &Arc<Experiment> {
        &self.context.experiment
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.context.backend
    }

    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        info!(target: "qureed::simulation", "using backend {}", backend.name());
        self.context.backend = backend;
    }

    pub fn set_simulation_type(&mut self, simulation_type: SimulationType) {
        self.context.settings.simulation_type = simulation_type;
    }

    pub fn set_execution(&mut self, execution: ExecutionMode) {
        self.context.settings.execution = execution;
    }

    /// Set the Fock cutoff used by every subsequent gate
    pub fn set_dimensions(&mut self, cutoff: usize) {
        self.context.settings.cutoff = cutoff;
        self.context.backend.set_dimensions(cutoff);
    }

    pub fn set_coordinator(&mut self, coordinator: Arc<dyn Coordinator>) {
        self.context.coordinator = Some(coordinator);
    }

    pub fn set_pipeline(&mut self, pipeline: ActivationPipeline) {
        self.pipeline = pipeline;
    }

    /// Register a device. Its activation protocols are inspected once here.
    pub fn register_device(&mut self, mut device: Box<dyn Device>) -> SimulationResult<DeviceId> {
        let capabilities = Capabilities {
            dataflow: device.as_dataflow().is_some(),
            event: device.as_event().is_some(),
        };
        if !capabilities.dataflow && !capabilities.event {
            return Err(SimulationError::MissingCapability(device.type_name()));
        }
        let id = device.id();
        if self.slot_index(id).is_some() {
            return Err(SimulationError::DuplicateDevice(id));
        }
        debug!(
            target: "qureed::simulation",
            "registered {} ({}) as {}",
            device.display_name(),
            device.type_name(),
            id
        );
        self.devices.push(DeviceSlot {
            device,
            capabilities,
            bootstrapped: false,
            trigger: None,
        });
        Ok(id)
    }

    pub fn add_device<D: Device>(&mut self, device: D) -> SimulationResult<DeviceId> {
        self.register_device(Box::new(device))
    }

    /// Unregister a device and unbind all of its ports
    pub fn remove_device(&mut self, id: DeviceId) -> SimulationResult<Box<dyn Device>> {
        self.take_device(id)
            .ok_or_else(|| SimulationError::UnknownDevice(id.to_string()))
    }

    fn take_device(&mut self, id: DeviceId) -> Option<Box<dyn Device>> {
        let index = self.slot_index(id)?;
        let mut slot = self.devices.remove(index);
        slot.device.ports_mut().disconnect_all();
        Some(slot.device)
    }

    fn slot_index(&self, id: DeviceId) -> Option<usize> {
        self.devices.iter().position(|slot| slot.device.id() == id)
    }

    fn slot_mut(&mut self, id: DeviceId) -> SimulationResult<&mut DeviceSlot> {
        self.devices
            .iter_mut()
            .find(|slot| slot.device.id() == id)
            .ok_or_else(|| SimulationError::UnknownDevice(id.to_string()))
    }

    pub fn device(&self, id: DeviceId) -> Option<&dyn Device> {
        self.slot_index(id).map(|i| self.devices[i].device.as_ref())
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn Device> {
        match self.slot_index(id) {
            Some(i) => Some(self.devices[i].device.as_mut()),
            None => None,
        }
    }

    /// Typed access to a registered device
    pub fn device_as<T: Device>(&self, id: DeviceId) -> Option<&T> {
        self.device(id)?.as_any().downcast_ref::<T>()
    }

    pub fn device_as_mut<T: Device>(&mut self, id: DeviceId) -> Option<&mut T> {
        self.device_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// First device with the given name
    pub fn find_device(&self, name: &str) -> Option<DeviceId> {
        self.devices
            .iter()
            .find(|slot| slot.device.name() == Some(name))
            .map(|slot| slot.device.id())
    }

    pub fn devices(&self) -> Vec<DeviceInformation> {
        self.devices.iter().map(DeviceSlot::information).collect()
    }

    /// Wire `from.1` on device `from.0` to `to.1` on device `to.0` with a new
    /// signal of `kind`. Nothing stays bound if either side rejects it.
    pub fn connect(
        &mut self,
        kind: SignalKind,
        from: (DeviceId, &str),
        to: (DeviceId, &str),
    ) -> SimulationResult<SignalRef> {
        for id in [from.0, to.0] {
            if self.slot_index(id).is_none() {
                return Err(SimulationError::UnknownDevice(id.to_string()));
            }
        }

        let signal = Signal::new(kind);
        self.slot_mut(from.0)?
            .device
            .register_signal(&signal, from.1, false)?;
        if let Err(err) = self.slot_mut(to.0)?.device.register_signal(&signal, to.1, false) {
            self.slot_mut(from.0)?.device.ports_mut().disconnect(from.1);
            return Err(err.into());
        }
        debug!(
            target: "qureed::simulation",
            "connected {}:{} -> {}:{} with a {} signal",
            from.0,
            from.1,
            to.0,
            to.1,
            kind
        );
        Ok(signal)
    }

    /// Bind a fresh Bool signal to the trigger port of each device. The
    /// signal is latched `true` when a run starts.
    pub fn register_triggers(&mut self, devices: &[DeviceId]) -> SimulationResult<()> {
        for &id in devices {
            let slot = self.slot_mut(id)?;
            if slot.trigger.is_some() {
                continue;
            }
            let signal = Signal::new(SignalKind::Bool);
            slot.device.register_signal(&signal, TRIGGER_PORT, false)?;
            slot.trigger = Some(signal);
        }
        Ok(())
    }

    /// Queue an event for `device`. Returns `true` if it merged into an
    /// event already pending for the same device and time.
    pub fn schedule_event(
        &mut self,
        time: SimTime,
        device: DeviceId,
        signals: SignalMap,
        args: Vec<EventArg>,
    ) -> SimulationResult<bool> {
        let slot = self.slot_mut(device)?;
        if !slot.capabilities.event {
            return Err(SimulationError::MissingHandler(device));
        }
        Ok(self
            .queue
            .schedule(SimulationEvent::new(time, device, signals, args)))
    }

    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    pub fn end_time(&self) -> SimTime {
        self.end_time
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Mode budget: modes each registered device adds
    pub fn mode_budget(&self) -> usize {
        self.devices.iter().map(|slot| slot.device.new_modes()).sum()
    }

    /// State from the last execution
    pub fn state(&self) -> Option<FockState> {
        self.context.backend.state()
    }

    /// Run with the configured execution mode and duration
    pub fn run_configured(&mut self) -> SimulationResult<Option<FockState>> {
        match self.context.settings.execution {
            ExecutionMode::Des => {
                let duration = self.context.settings.duration;
                self.run_des(duration)
            }
            ExecutionMode::Dataflow => self.run(),
        }
    }

    /// Drop every device, event, mode and queued operation
    pub fn clear_all(&mut self) {
        for slot in &mut self.devices {
            slot.device.ports_mut().disconnect_all();
        }
        self.devices.clear();
        self.queue.clear();
        self.context.mode_manager.clear_modes();
        self.context.experiment.reset();
        self.current_time = SimTime::ZERO;
        self.end_time = SimTime::ZERO;
    }

    fn configure_backend(&self) {
        let modes = self.mode_budget().max(self.context.mode_manager.len());
        let backend = &self.context.backend;
        backend.set_dimensions(self.context.settings.cutoff);
        backend.set_number_of_modes(modes);
        backend.initialize();
        info!(
            target: "qureed::simulation",
            "mode budget {} at cutoff {}",
            modes,
            self.context.settings.cutoff
        );
    }

    /// Execute the queued experiment after a run of a Fock simulation
    fn finish_run(&self) -> SimulationResult<Option<FockState>> {
        if !self.context.is_fock() {
            return Ok(None);
        }
        self.context
            .backend
            .ensure_modes(self.context.mode_manager.len());
        Ok(Some(self.context.backend.execute()?))
    }

    pub fn list_devices(&self) -> String {
        render_table("DEVICES", self.devices())
    }

    pub fn list_triggered_devices(&self) -> String {
        let rows: Vec<DeviceInformation> = self
            .devices
            .iter()
            .filter(|slot| slot.trigger.is_some())
            .map(DeviceSlot::information)
            .collect();
        render_table("TRIGGERED DEVICES", rows)
    }
}

impl From<DeviceInformation> for DeviceRow {
    fn from(info: DeviceInformation) -> Self {
        Self {
            name: info.name.unwrap_or_else(|| "None".to_string()),
            device_type: info.device_type,
            uuid: info.uuid.to_string(),
        }
    }
}

fn render_table(title: &str, rows: Vec<DeviceInformation>) -> String {
    let table = Table::new(rows.into_iter().map(DeviceRow::from))
        .with(Style::rounded())
        .to_string();
    format!("{}\n{}", title, table)
}
