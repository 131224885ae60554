//! Threaded dataflow run

use log::{error, info};
use qureed_fock::FockState;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use super::Simulation;
use crate::activation::abandon_outputs;
use crate::error::{DeviceError, SimulationError, SimulationResult};

/// Outcome of one device task
struct TaskOutcome {
    name: String,
    type_name: &'static str,
    result: Result<Result<(), DeviceError>, ()>,
}

impl Simulation {
    /// Evaluate the circuit once, one thread per dataflow-capable device.
    ///
    /// Devices synchronise through signal latches only. A failing device
    /// abandons its outputs so dependants stop waiting; the first failure is
    /// returned after every task has joined.
    pub fn run(&mut self) -> SimulationResult<Option<FockState>> {
        info!(target: "qureed::simulation", "Starting dataflow run");
        self.configure_backend();

        for slot in &self.devices {
            if let Some(trigger) = &slot.trigger {
                if !trigger.is_computed() {
                    trigger.set_bool(true)?;
                    trigger.set_computed();
                }
            }
        }

        let context = &self.context;
        let pipeline = &self.pipeline;
        let outcomes: Vec<TaskOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .devices
                .iter_mut()
                .filter(|slot| slot.capabilities.dataflow)
                .map(|slot| {
                    let name = slot.device.display_name();
                    let type_name = slot.device.type_name();
                    let handle = scope.spawn(move || {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            pipeline.run(slot.device.as_mut(), context)
                        }));
                        if !matches!(outcome, Ok(Ok(()))) {
                            abandon_outputs(slot.device.as_ref());
                        }
                        outcome.map_err(|_| ())
                    });
                    (name, type_name, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, type_name, handle)| TaskOutcome {
                    name,
                    type_name,
                    result: handle.join().unwrap_or(Err(())),
                })
                .collect()
        });

        let mut first_error = None;
        for outcome in outcomes {
            let err = match outcome.result {
                Ok(Ok(())) => continue,
                Ok(Err(source)) => SimulationError::Device {
                    device: outcome.name,
                    type_name: outcome.type_name,
                    source,
                },
                Err(()) => SimulationError::TaskPanicked(outcome.name),
            };
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                error!(target: "qureed::simulation", "{}", err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        self.finish_run()
    }
}
