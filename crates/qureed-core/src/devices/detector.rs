//! Ideal photon detector

use log::info;
use ndarray::IxDyn;
use qureed_fock::FockState;
use qureed_types::{PortSpec, SignalKind};

use super::classical_signal;
use crate::context::{quantum_mode, DeviceContext, EventContext};
use crate::device::{DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::DeviceResult;
use crate::mode_manager::{ModeId, ModeManager};
use crate::port::Ports;
use crate::signal::{SignalMap, SignalValue};
use crate::utils::SimTime;

/// One quantum signal registered by a detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub time: SimTime,
    pub mode: ModeId,
}

/// Records which modes reach it and when. Photon statistics are read from
/// the final state once the experiment has executed; the `output` port
/// carries the running detection count.
#[derive(Debug)]
pub struct IdealDetector {
    name: Option<String>,
    ports: Ports,
    detections: Vec<Detection>,
}

impl IdealDetector {
    pub const PORTS: [PortSpec; 2] = [
        PortSpec::input("input", SignalKind::Quantum),
        PortSpec::output("output", SignalKind::Int),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            detections: Vec::new(),
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn clear(&mut self) {
        self.detections.clear();
    }

    /// Mean photon number of every detected mode, in detection order
    pub fn mean_photons(&self, state: &FockState, modes: &ModeManager) -> DeviceResult<Vec<f64>> {
        self.detections
            .iter()
            .map(|d| -> DeviceResult<f64> { Ok(state.mean_photon(modes.get_mode_index(d.mode)?)?) })
            .collect()
    }

    /// Probability of at least one photon in every detected mode
    pub fn click_probabilities(
        &self,
        state: &FockState,
        modes: &ModeManager,
    ) -> DeviceResult<Vec<f64>> {
        self.detections
            .iter()
            .map(|d| -> DeviceResult<f64> {
                let index = modes.get_mode_index(d.mode)?;
                let reduced = state.reduced_dm(&[index])?;
                Ok(1.0 - reduced[IxDyn(&[0, 0])].re)
            })
            .collect()
    }

    fn record(&mut self, time: SimTime, mode: ModeId) {
        info!(
            target: "qureed::devices",
            "[{}] *{}* detected mode {}",
            time,
            self.display_name(),
            mode
        );
        self.detections.push(Detection { time, mode });
    }
}

impl Device for IdealDetector {
    crate::device_common!("IdealDetector"; dataflow, event);
}

impl DataflowDevice for IdealDetector {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        if let Some(signal) = self.ports.signal("input") {
            let mode = signal.as_quantum()?.mode;
            ctx.mode_index(mode)?;
            self.record(SimTime::ZERO, mode);
        }
        if let Some(output) = self.ports.signal("output") {
            output.set_int(self.detections.len() as i64)?;
            output.set_computed();
        }
        Ok(())
    }
}

impl EventDevice for IdealDetector {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        let Some(mode) = quantum_mode(signals, "input")? else {
            return Ok(None);
        };
        ctx.shared().mode_index(mode)?;
        self.record(time, mode);
        let count = classical_signal(
            SignalKind::Int,
            SignalValue::Int(self.detections.len() as i64),
        )?;
        Ok(Some(vec![Emission::new("output", count, time)]))
    }
}
