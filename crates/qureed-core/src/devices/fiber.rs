//! Optical fibers
//!
//! Fibers delay the light passing through them by `length / (c / n)`, where
//! `n` is the refractive index from the simulation settings. The lossy fiber
//! additionally applies a pure-loss channel.

use log::debug;
use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{input_mode_or_vacuum, latched_float, quantum_signal, set_quantum_output};
use crate::context::{DeviceContext, EventContext};
use crate::device::{value_as_f64, DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::{DeviceError, DeviceResult};
use crate::port::Ports;
use crate::signal::SignalMap;
use crate::utils::constants::SPEED_OF_LIGHT;
use crate::utils::SimTime;

const FIBER_PORTS: [PortSpec; 3] = [
    PortSpec::input("length", SignalKind::Float),
    PortSpec::input("input", SignalKind::Quantum),
    PortSpec::output("output", SignalKind::Quantum),
];

/// Propagation delay in seconds of `length` meters of fiber
pub fn propagation_delay(length: f64, refractive_index: f64) -> f64 {
    length / (SPEED_OF_LIGHT / refractive_index)
}

/// Transmissivity of `length` meters at `attenuation` dB/km
pub fn transmissivity(length: f64, attenuation: f64) -> f64 {
    10f64.powf(-attenuation * length / 1000.0 / 10.0)
}

fn check_length(length: f64) -> DeviceResult<f64> {
    if length.is_finite() && length >= 0.0 {
        Ok(length)
    } else {
        Err(DeviceError::InvalidValue {
            key: "length".to_string(),
            reason: format!("{} is not a valid fiber length", length),
        })
    }
}

/// Lossless fiber, delay only
#[derive(Debug)]
pub struct IdealFiber {
    name: Option<String>,
    ports: Ports,
    length: f64,
}

impl IdealFiber {
    pub const PORTS: [PortSpec; 3] = FIBER_PORTS;

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            length: 0.0,
        }
    }

    /// Length in meters
    pub fn set_length(&mut self, length: f64) -> DeviceResult<()> {
        self.length = check_length(length)?;
        Ok(())
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

impl Device for IdealFiber {
    crate::device_common!("IdealFiber"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(length) = value_as_f64(values, "length")? {
            self.set_length(length)?;
        }
        Ok(())
    }
}

impl DataflowDevice for IdealFiber {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        if let Some(length) = latched_float(&self.ports, "length")? {
            self.set_length(length)?;
        }
        let (mode, _) = input_mode_or_vacuum(ctx, &self.ports, "input")?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for IdealFiber {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("length") {
            self.set_length(signal.as_float()?)?;
        }
        let Some(signal) = signals.get("input") else {
            return Ok(None);
        };
        let mode = signal.as_quantum()?.mode;
        let delay = propagation_delay(self.length, ctx.shared().settings.fiber_refractive_index);
        let out = time + delay;
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, out)?, out)]))
    }
}

/// Fiber with attenuation.
///
/// # Parameters
///
/// - `length`: meters (default: 0.0)
/// - `attenuation`: dB/km (default: 0.2)
///
/// Transmissivity is `10^(-attenuation * length / 10000)`.
#[derive(Debug)]
pub struct LossyFiber {
    name: Option<String>,
    ports: Ports,
    length: f64,
    attenuation: f64,
}

impl LossyFiber {
    pub const PORTS: [PortSpec; 3] = FIBER_PORTS;

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            length: 0.0,
            attenuation: 0.2,
        }
    }

    pub fn set_length(&mut self, length: f64) -> DeviceResult<()> {
        self.length = check_length(length)?;
        Ok(())
    }

    pub fn set_attenuation(&mut self, attenuation: f64) -> DeviceResult<()> {
        if !(attenuation.is_finite() && attenuation >= 0.0) {
            return Err(DeviceError::InvalidValue {
                key: "attenuation".to_string(),
                reason: format!("{} dB/km is not a valid attenuation", attenuation),
            });
        }
        self.attenuation = attenuation;
        Ok(())
    }

    pub fn transmissivity(&self) -> f64 {
        transmissivity(self.length, self.attenuation)
    }

    fn attenuate(&self, ctx: &DeviceContext, index: usize) -> DeviceResult<()> {
        let t = self.transmissivity();
        debug!(
            target: "qureed::devices",
            "*{}* transmissivity {:.4} on mode {}",
            self.display_name(),
            t,
            index
        );
        if ctx.is_fock() {
            let kraus = ctx.backend.loss(t)?;
            ctx.backend.apply_channel(kraus, &[index])?;
        }
        Ok(())
    }
}

impl Device for LossyFiber {
    crate::device_common!("LossyFiber"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(length) = value_as_f64(values, "length")? {
            self.set_length(length)?;
        }
        if let Some(attenuation) = value_as_f64(values, "attenuation")? {
            self.set_attenuation(attenuation)?;
        }
        Ok(())
    }
}

impl DataflowDevice for LossyFiber {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        if let Some(length) = latched_float(&self.ports, "length")? {
            self.set_length(length)?;
        }
        let (mode, index) = input_mode_or_vacuum(ctx, &self.ports, "input")?;
        self.attenuate(ctx, index)?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for LossyFiber {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("length") {
            self.set_length(signal.as_float()?)?;
        }
        let Some(signal) = signals.get("input") else {
            return Ok(None);
        };
        let mode = signal.as_quantum()?.mode;
        let shared = ctx.shared();
        self.attenuate(shared, shared.mode_index(mode)?)?;
        let out = time + propagation_delay(self.length, shared.settings.fiber_refractive_index);
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, out)?, out)]))
    }
}
