//! Discrete-event loop

use log::{debug, info, warn};
use qureed_fock::FockState;
use qureed_types::SignalKind;

use super::{Simulation, SimulationEvent};
use crate::context::{EventArg, EventContext};
use crate::device::DeviceId;
use crate::error::{SimulationError, SimulationResult, WiringError};
use crate::signal::{PortRef, Signal, SignalMap, SignalValue};
use crate::utils::constants::TRIGGER_PORT;
use crate::utils::SimTime;

/// A delivery resolved from one emission
struct Delivery {
    time: SimTime,
    target: PortRef,
    signals: SignalMap,
}

impl Simulation {
    /// Advance the event loop by `duration` seconds.
    ///
    /// Events later than the new horizon stay queued for the next call. For
    /// Fock simulations the queued experiment is executed afterwards and its
    /// state returned.
    pub fn run_des(&mut self, duration: f64) -> SimulationResult<Option<FockState>> {
        info!(target: "qureed::simulation", "Starting Simulation");
        self.configure_backend();
        self.bootstrap()?;
        self.end_time = self.end_time + duration;

        while let Some(next) = self.queue.peek_time() {
            if next > self.end_time {
                debug!(
                    target: "qureed::simulation",
                    "{} events left beyond the horizon {}",
                    self.queue.len(),
                    self.end_time
                );
                break;
            }
            let Some(event) = self.queue.pop() else {
                break;
            };
            self.current_time = event.time;
            self.dispatch(event)?;
        }

        self.finish_run()
    }

    /// Queue bootstrap wake-ups and trigger events of newly added devices
    fn bootstrap(&mut self) -> SimulationResult<()> {
        let mut events = Vec::new();
        for slot in self.devices.iter_mut().filter(|slot| !slot.bootstrapped) {
            slot.bootstrapped = true;
            let id = slot.device.id();
            if let Some(handler) = slot.device.as_event() {
                for time in handler.bootstrap() {
                    events.push(SimulationEvent::new(
                        time,
                        id,
                        SignalMap::new(),
                        vec![EventArg::Bootstrap],
                    ));
                }
            }
            if let Some(trigger) = &slot.trigger {
                if !trigger.is_computed() {
                    trigger.set_bool(true)?;
                    trigger.set_computed();
                }
                if slot.capabilities.event {
                    let mut signals = SignalMap::new();
                    signals.insert(TRIGGER_PORT.to_string(), trigger.clone());
                    events.push(SimulationEvent::new(SimTime::ZERO, id, signals, Vec::new()));
                }
            }
        }
        for event in events {
            self.queue.schedule(event);
        }
        Ok(())
    }

    fn dispatch(&mut self, event: SimulationEvent) -> SimulationResult<()> {
        let index = self
            .slot_index(event.device)
            .ok_or_else(|| SimulationError::UnknownDevice(event.device.to_string()))?;
        let slot = &mut self.devices[index];
        let device = slot.device.as_mut();
        let id = device.id();
        let type_name = device.type_name();
        let name = device.display_name();

        info!(
            target: "qureed::simulation",
            "[{}] Processing Event for *{}* of type {}",
            event.time,
            name,
            type_name
        );

        let handler = device
            .as_event()
            .ok_or(SimulationError::MissingHandler(id))?;

        if let Some(coordinator) = &self.context.coordinator {
            coordinator.start_processing(id);
        }
        let mut ctx = EventContext::new(&self.context, &event.args);
        let outcome = handler.des(event.time, &event.signals, &mut ctx);
        let wakeups = ctx.into_wakeups();
        if let Some(coordinator) = &self.context.coordinator {
            coordinator.processing_finished(id);
        }

        let emissions = outcome.map_err(|source| SimulationError::Device {
            device: name.clone(),
            type_name,
            source,
        })?;

        // resolve every emission against the wire bound to its output port
        let mut deliveries = Vec::new();
        for emission in emissions.unwrap_or_default() {
            let port = device
                .ports()
                .get(&emission.port)
                .ok_or_else(|| WiringError::NoPort {
                    device: id.to_string(),
                    label: emission.port.clone(),
                })?;
            let Some(wire) = port.signal() else {
                debug!(
                    target: "qureed::devices",
                    "*{}* output '{}' is not connected, dropping it",
                    name,
                    emission.port
                );
                continue;
            };
            let origin = PortRef::new(id, &emission.port);
            for target in wire.ports().into_iter().filter(|p| *p != origin) {
                let mut signals = SignalMap::new();
                signals.insert(target.label.clone(), emission.signal.clone());
                deliveries.push(Delivery {
                    time: emission.time,
                    target,
                    signals,
                });
            }
        }

        for (time, arg) in wakeups {
            self.queue
                .schedule(SimulationEvent::new(time, id, SignalMap::new(), vec![arg]));
        }

        for delivery in deliveries {
            if delivery.time < self.current_time {
                warn!(
                    target: "qureed::simulation",
                    "*{}* scheduled an event in the past ({} < {})",
                    name,
                    delivery.time,
                    self.current_time
                );
            }
            let target_name = self
                .device(delivery.target.device)
                .map(|d| d.display_name())
                .unwrap_or_else(|| delivery.target.device.to_string());
            info!(
                target: "qureed::simulation",
                "<{}> *{}* is scheduling new event for *{}*",
                delivery.time,
                name,
                target_name
            );
            self.schedule_event(
                delivery.time,
                delivery.target.device,
                delivery.signals,
                Vec::new(),
            )?;
        }
        Ok(())
    }

    /// Deliver a latched `true` on the trigger port of `device` at `time`
    pub fn trigger_at(&mut self, time: SimTime, device: DeviceId) -> SimulationResult<bool> {
        let signal = Signal::computed(SignalKind::Bool, SignalValue::Bool(true))?;
        let mut signals = SignalMap::new();
        signals.insert(TRIGGER_PORT.to_string(), signal);
        self.schedule_event(time, device, signals, Vec::new())
    }
}
