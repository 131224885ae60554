//! Ideal phase shifter

use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{input_mode_or_vacuum, latched_float, quantum_signal, set_quantum_output};
use crate::context::{DeviceContext, EventContext};
use crate::device::{value_as_f64, DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::DeviceResult;
use crate::port::Ports;
use crate::signal::SignalMap;
use crate::utils::SimTime;

/// Applies `exp(i theta n)` to the mode passing through
#[derive(Debug)]
pub struct IdealPhaseShifter {
    name: Option<String>,
    ports: Ports,
    theta: f64,
}

impl IdealPhaseShifter {
    pub const PORTS: [PortSpec; 3] = [
        PortSpec::input("theta", SignalKind::Float),
        PortSpec::input("input", SignalKind::Quantum),
        PortSpec::output("output", SignalKind::Quantum),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            theta: 0.0,
        }
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta;
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    fn shift(&self, ctx: &DeviceContext, index: usize) -> DeviceResult<()> {
        if ctx.is_fock() {
            let gate = ctx.backend.phase_shift(self.theta)?;
            ctx.backend.apply_operator(gate, &[index])?;
        }
        Ok(())
    }
}

impl Device for IdealPhaseShifter {
    crate::device_common!("IdealPhaseShifter"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(theta) = value_as_f64(values, "theta")? {
            self.theta = theta;
        }
        Ok(())
    }
}

impl DataflowDevice for IdealPhaseShifter {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        if let Some(theta) = latched_float(&self.ports, "theta")? {
            self.theta = theta;
        }
        let (mode, index) = input_mode_or_vacuum(ctx, &self.ports, "input")?;
        self.shift(ctx, index)?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for IdealPhaseShifter {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("theta") {
            self.theta = signal.as_float()?;
        }
        let Some(signal) = signals.get("input") else {
            return Ok(None);
        };
        let mode = signal.as_quantum()?.mode;
        self.shift(ctx.shared(), ctx.shared().mode_index(mode)?)?;
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, time)?, time)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Signal, SignalValue};
    use qureed_types::SimulationSettings;

    #[test]
    fn test_theta_from_latched_port() {
        let ctx = DeviceContext::new(SimulationSettings::default().with_cutoff(3));
        let mut ps = IdealPhaseShifter::new(Some("ps"), None);
        let theta = Signal::computed(SignalKind::Float, SignalValue::Float(0.3)).unwrap();
        ps.register_signal(&theta, "theta", false).unwrap();
        ps.compute_outputs(&ctx).unwrap();
        assert_eq!(ps.theta(), 0.3);
        assert_eq!(ctx.experiment.pending(), (0, 1, 0));
    }

    #[test]
    fn test_event_without_input_only_updates_theta() {
        let ctx = DeviceContext::new(SimulationSettings::default());
        let mut ps = IdealPhaseShifter::new(None, None);
        let mut signals = SignalMap::new();
        signals.insert(
            "theta".to_string(),
            Signal::computed(SignalKind::Float, SignalValue::Float(1.0)).unwrap(),
        );
        let mut ectx = EventContext::new(&ctx, &[]);
        assert!(ps.des(SimTime::ZERO, &signals, &mut ectx).unwrap().is_none());
        assert_eq!(ps.theta(), 1.0);
    }
}
