//! Dataflow activation pipeline.
//!
//! A dataflow activation is an explicit sequence of stages rather than a
//! stack of wrappers. The standard pipeline waits for inputs, notifies the
//! coordinator, logs, computes, verifies outputs and notifies again.

use log::info;

use crate::context::DeviceContext;
use crate::device::{Device, DeviceId};
use crate::error::{DeviceError, DeviceResult};

/// Observer notified around every device activation (e.g. a progress view)
pub trait Coordinator: Send + Sync {
    fn start_processing(&self, device: DeviceId);
    fn processing_finished(&self, device: DeviceId);
}

/// One step of a dataflow activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Block on every bound input latch
    WaitInputs,
    /// `Coordinator::start_processing`
    NotifyStart,
    /// Log the activation on the device target
    LogAction,
    /// `DataflowDevice::compute_outputs`
    Compute,
    /// Fail if a bound output was left unlatched
    EnsureOutputs,
    /// `Coordinator::processing_finished`
    NotifyFinish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPipeline {
    stages: Vec<Stage>,
}

impl Default for ActivationPipeline {
    fn default() -> Self {
        Self::new(vec![
            Stage::WaitInputs,
            Stage::NotifyStart,
            Stage::LogAction,
            Stage::Compute,
            Stage::EnsureOutputs,
            Stage::NotifyFinish,
        ])
    }
}

impl ActivationPipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order, stopping at the first failure
    pub fn run(&self, device: &mut dyn Device, ctx: &DeviceContext) -> DeviceResult<()> {
        for stage in &self.stages {
            match stage {
                Stage::WaitInputs => wait_inputs(device, ctx)?,
                Stage::NotifyStart => {
                    if let Some(coordinator) = &ctx.coordinator {
                        coordinator.start_processing(device.id());
                    }
                }
                Stage::LogAction => {
                    info!(
                        target: "qureed::devices",
                        "*{}* ({}) is computing",
                        device.display_name(),
                        device.type_name()
                    );
                }
                Stage::Compute => {
                    if let Some(dataflow) = device.as_dataflow() {
                        dataflow.compute_outputs(ctx)?;
                    }
                }
                Stage::EnsureOutputs => ensure_outputs(device)?,
                Stage::NotifyFinish => {
                    if let Some(coordinator) = &ctx.coordinator {
                        coordinator.processing_finished(device.id());
                    }
                }
            }
        }
        Ok(())
    }
}

fn wait_inputs(device: &dyn Device, ctx: &DeviceContext) -> DeviceResult<()> {
    let timeout = ctx.settings.signal_timeout();
    for port in device.ports().inputs() {
        if let Some(signal) = port.signal() {
            signal.wait_till_compute(timeout)?;
        }
    }
    Ok(())
}

fn ensure_outputs(device: &dyn Device) -> DeviceResult<()> {
    for port in device.ports().outputs() {
        if let Some(signal) = port.signal() {
            if !signal.is_computed() {
                return Err(DeviceError::OutputNotComputed(port.label().to_string()));
            }
        }
    }
    Ok(())
}

/// Release consumers of a failed device
pub fn abandon_outputs(device: &dyn Device) {
    for port in device.ports().outputs() {
        if let Some(signal) = port.signal() {
            signal.abandon();
        }
    }
}
