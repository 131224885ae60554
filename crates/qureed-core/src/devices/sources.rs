//! Light sources

use log::{debug, info};
use num_complex::Complex64;
use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{latched_int, photon_count, quantum_signal, set_quantum_output};
use crate::context::{DeviceContext, EventContext};
use crate::device::{value_as_count, value_as_f64, DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::DeviceResult;
use crate::mode_manager::ModeId;
use crate::port::Ports;
use crate::signal::{Signal, SignalMap};
use crate::utils::SimTime;

/// True if the event carries a `true` trigger
fn triggered(signals: &SignalMap) -> DeviceResult<bool> {
    match signals.get("trigger") {
        Some(signal) => Ok(signal.as_bool()?),
        None => Ok(false),
    }
}

/// Ideal number-state source
///
/// Every trigger allocates a new mode and prepares `|n>` in it.
///
/// # Parameters
///
/// - `photon_num`: photons per pulse (default: 1). Read, in order, from the
///   last value received on the `photon_num` port or set with
///   [`IdealNPhotonSource::set_photon_num`], then from a latched signal bound
///   to that port.
///
/// # Example
///
/// ```ignore
/// let mut source = IdealNPhotonSource::new(Some("source"), None);
/// source.set_photon_num(2)?;
/// ```
#[derive(Debug)]
pub struct IdealNPhotonSource {
    name: Option<String>,
    ports: Ports,
    photon_num: Option<usize>,
}

impl IdealNPhotonSource {
    pub const PORTS: [PortSpec; 3] = [
        PortSpec::input("trigger", SignalKind::Bool),
        PortSpec::input("photon_num", SignalKind::Int),
        PortSpec::output("output", SignalKind::Quantum),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            photon_num: None,
        }
    }

    /// Fix the photon number by binding a latched Int signal to `photon_num`
    pub fn set_photon_num(&mut self, photon_num: usize) -> DeviceResult<()> {
        let signal = Signal::new(SignalKind::Int);
        signal.set_int(photon_num as i64)?;
        signal.set_computed();
        self.ports.register_signal(&signal, "photon_num", true)?;
        self.photon_num = Some(photon_num);
        Ok(())
    }

    pub fn photon_num(&self) -> DeviceResult<usize> {
        if let Some(n) = self.photon_num {
            return Ok(n);
        }
        match latched_int(&self.ports, "photon_num")? {
            Some(n) => photon_count("photon_num", n),
            None => Ok(1),
        }
    }

    fn prepare(&self, ctx: &DeviceContext) -> DeviceResult<ModeId> {
        let n = self.photon_num()?;
        let (mode, index) = ctx.new_mode();
        if ctx.is_fock() {
            ctx.backend.initialize_number_state(n, index)?;
        }
        info!(
            target: "qureed::devices",
            "*{}* prepared |{}> in mode {}",
            self.display_name(),
            n,
            index
        );
        Ok(mode)
    }
}

impl Device for IdealNPhotonSource {
    crate::device_common!("IdealNPhotonSource"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(n) = value_as_count(values, "photon_num")? {
            self.photon_num = Some(n);
        }
        Ok(())
    }
}

impl DataflowDevice for IdealNPhotonSource {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        let mode = self.prepare(ctx)?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for IdealNPhotonSource {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("photon_num") {
            self.photon_num = Some(photon_count("photon_num", signal.as_int()?)?);
        }
        if !triggered(signals)? {
            return Ok(None);
        }
        let mode = self.prepare(ctx.shared())?;
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, time)?, time)]))
    }
}

/// Ideal coherent-state source: displaces a fresh vacuum mode by `alpha`
#[derive(Debug)]
pub struct IdealCoherentSource {
    name: Option<String>,
    ports: Ports,
    alpha: Complex64,
}

impl IdealCoherentSource {
    pub const PORTS: [PortSpec; 3] = [
        PortSpec::input("trigger", SignalKind::Bool),
        PortSpec::input("alpha", SignalKind::Complex),
        PortSpec::output("output", SignalKind::Quantum),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            alpha: Complex64::new(1.0, 0.0),
        }
    }

    pub fn set_alpha(&mut self, alpha: Complex64) {
        self.alpha = alpha;
    }

    pub fn alpha(&self) -> Complex64 {
        self.alpha
    }

    fn prepare(&mut self, ctx: &DeviceContext) -> DeviceResult<ModeId> {
        if let Some(signal) = self.ports.signal("alpha") {
            if signal.is_computed() {
                self.alpha = signal.as_complex()?;
            }
        }
        let (mode, index) = ctx.new_mode();
        if ctx.is_fock() {
            let gate = ctx.backend.displace(self.alpha)?;
            ctx.backend.apply_operator(gate, &[index])?;
        }
        debug!(
            target: "qureed::devices",
            "*{}* displaced mode {} by {}",
            self.display_name(),
            index,
            self.alpha
        );
        Ok(mode)
    }
}

impl Device for IdealCoherentSource {
    crate::device_common!("IdealCoherentSource"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        let re = value_as_f64(values, "alpha_re")?;
        let im = value_as_f64(values, "alpha_im")?;
        if re.is_some() || im.is_some() {
            self.alpha = Complex64::new(re.unwrap_or(0.0), im.unwrap_or(0.0));
        }
        Ok(())
    }
}

impl DataflowDevice for IdealCoherentSource {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        let mode = self.prepare(ctx)?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for IdealCoherentSource {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("alpha") {
            self.alpha = signal.as_complex()?;
        }
        if !triggered(signals)? {
            return Ok(None);
        }
        let mode = self.prepare(ctx.shared())?;
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, time)?, time)]))
    }
}

/// Ideal squeezed-vacuum source, `S(z)` on a fresh mode with
/// `z = r e^{i theta}`
#[derive(Debug)]
pub struct IdealSqueezedSource {
    name: Option<String>,
    ports: Ports,
    squeezing: Complex64,
}

impl IdealSqueezedSource {
    pub const PORTS: [PortSpec; 2] = [
        PortSpec::input("trigger", SignalKind::Bool),
        PortSpec::output("output", SignalKind::Quantum),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            squeezing: Complex64::new(0.5, 0.0),
        }
    }

    pub fn set_squeezing(&mut self, r: f64, theta: f64) {
        self.squeezing = Complex64::from_polar(r, theta);
    }

    fn prepare(&self, ctx: &DeviceContext) -> DeviceResult<ModeId> {
        let (mode, index) = ctx.new_mode();
        if ctx.is_fock() {
            let gate = ctx.backend.squeeze(self.squeezing)?;
            ctx.backend.apply_operator(gate, &[index])?;
        }
        Ok(mode)
    }
}

impl Device for IdealSqueezedSource {
    crate::device_common!("IdealSqueezedSource"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        let r = value_as_f64(values, "r")?;
        let theta = value_as_f64(values, "theta")?;
        if r.is_some() || theta.is_some() {
            self.set_squeezing(
                r.unwrap_or(self.squeezing.norm()),
                theta.unwrap_or(self.squeezing.arg()),
            );
        }
        Ok(())
    }
}

impl DataflowDevice for IdealSqueezedSource {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        let mode = self.prepare(ctx)?;
        set_quantum_output(&self.ports, "output", mode)
    }
}

impl EventDevice for IdealSqueezedSource {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if !triggered(signals)? {
            return Ok(None);
        }
        let mode = self.prepare(ctx.shared())?;
        Ok(Some(vec![Emission::new("output", quantum_signal(mode, time)?, time)]))
    }
}
