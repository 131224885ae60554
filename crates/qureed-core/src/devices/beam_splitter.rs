//! Ideal beam splitter

use log::{debug, info};
use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{input_mode_or_vacuum, quantum_signal, set_quantum_output};
use crate::context::{DeviceContext, EventContext};
use crate::device::{value_as_f64, DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::DeviceResult;
use crate::mode_manager::ModeId;
use crate::port::Ports;
use crate::signal::SignalMap;
use crate::utils::constants::{BALANCED_THETA, BEAM_SPLITTER_PROCESSING_TIME};
use crate::utils::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    A,
    B,
}

#[derive(Debug, Clone, Copy)]
struct Arrival {
    input: Input,
    mode: ModeId,
    time: SimTime,
}

/// Lossless two-mode beam splitter.
///
/// Inputs `A` and `B`, outputs `C` (carries the mode that entered on `A`) and
/// `D` (the mode that entered on `B`). An unconnected input contributes a
/// fresh vacuum mode.
///
/// In an event-driven run arrivals are collected for
/// [`BEAM_SPLITTER_PROCESSING_TIME`] after the latest one, then interfered in
/// pairs (`A` with `B` in arrival order). An arrival without a partner is
/// mixed with vacuum.
#[derive(Debug)]
pub struct IdealBeamSplitter {
    name: Option<String>,
    ports: Ports,
    theta: f64,
    phi: f64,
    pending: Vec<Arrival>,
    wake_at: Option<SimTime>,
}

impl IdealBeamSplitter {
    pub const PORTS: [PortSpec; 4] = [
        PortSpec::input("A", SignalKind::Quantum),
        PortSpec::input("B", SignalKind::Quantum),
        PortSpec::output("C", SignalKind::Quantum),
        PortSpec::output("D", SignalKind::Quantum),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            theta: BALANCED_THETA,
            phi: 0.0,
            pending: Vec::new(),
            wake_at: None,
        }
    }

    /// Mixing angle; transmissivity is `cos^2(theta)`
    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta;
    }

    pub fn set_phi(&mut self, phi: f64) {
        self.phi = phi;
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    fn interfere(&self, ctx: &DeviceContext, a: usize, b: usize) -> DeviceResult<()> {
        if ctx.is_fock() {
            let gate = ctx.backend.beam_splitter(self.theta, self.phi)?;
            ctx.backend.apply_operator(gate, &[a, b])?;
        }
        info!(
            target: "qureed::devices",
            "*{}* mixing modes {} and {}",
            self.display_name(),
            a,
            b
        );
        Ok(())
    }

    /// Interfere everything collected so far
    fn process_pending(&mut self, now: SimTime, ctx: &DeviceContext) -> DeviceResult<Vec<Emission>> {
        let arrivals = std::mem::take(&mut self.pending);
        let mut on_a = arrivals.iter().filter(|p| p.input == Input::A);
        let mut on_b = arrivals.iter().filter(|p| p.input == Input::B);
        let mut emissions = Vec::new();

        loop {
            let (a, b) = match (on_a.next(), on_b.next()) {
                (None, None) => break,
                (Some(a), Some(b)) => (*a, *b),
                (Some(a), None) => (*a, self.vacuum_partner(ctx, Input::B, a.time)),
                (None, Some(b)) => (self.vacuum_partner(ctx, Input::A, b.time), *b),
            };
            let index_a = ctx.mode_index(a.mode)?;
            let index_b = ctx.mode_index(b.mode)?;
            self.interfere(ctx, index_a, index_b)?;

            let t_c = (a.time + BEAM_SPLITTER_PROCESSING_TIME).max(now);
            let t_d = (b.time + BEAM_SPLITTER_PROCESSING_TIME).max(now);
            emissions.push(Emission::new("C", quantum_signal(a.mode, t_c)?, t_c));
            emissions.push(Emission::new("D", quantum_signal(b.mode, t_d)?, t_d));
        }
        Ok(emissions)
    }

    fn vacuum_partner(&self, ctx: &DeviceContext, input: Input, time: SimTime) -> Arrival {
        let (mode, index) = ctx.new_mode();
        debug!(
            target: "qureed::devices",
            "*{}* pairing a lone photon with vacuum mode {}",
            self.display_name(),
            index
        );
        Arrival { input, mode, time }
    }
}

impl Device for IdealBeamSplitter {
    crate::device_common!("IdealBeamSplitter"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(theta) = value_as_f64(values, "theta")? {
            self.theta = theta;
        }
        if let Some(phi) = value_as_f64(values, "phi")? {
            self.phi = phi;
        }
        Ok(())
    }
}

impl DataflowDevice for IdealBeamSplitter {
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()> {
        let (mode_a, index_a) = input_mode_or_vacuum(ctx, &self.ports, "A")?;
        let (mode_b, index_b) = input_mode_or_vacuum(ctx, &self.ports, "B")?;
        self.interfere(ctx, index_a, index_b)?;
        set_quantum_output(&self.ports, "C", mode_a)?;
        set_quantum_output(&self.ports, "D", mode_b)
    }
}

impl EventDevice for IdealBeamSplitter {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        let mut arrived = false;
        for (label, input) in [("A", Input::A), ("B", Input::B)] {
            if let Some(signal) = signals.get(label) {
                let mode = signal.as_quantum()?.mode;
                self.pending.push(Arrival { input, mode, time });
                arrived = true;
            }
        }

        if arrived {
            let wake = time + BEAM_SPLITTER_PROCESSING_TIME;
            if self.wake_at.map_or(true, |at| wake > at) {
                self.wake_at = Some(wake);
                ctx.schedule_self(wake);
            }
            return Ok(None);
        }

        // a superseded wake-up finds a later one pending
        if !ctx.is_wake() || self.wake_at != Some(time) {
            return Ok(None);
        }
        self.wake_at = None;
        let emissions = self.process_pending(time, ctx.shared())?;
        Ok(Some(emissions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EventArg;
    use crate::devices::quantum_signal;
    use approx::assert_relative_eq;
    use qureed_types::SimulationSettings;

    fn photon_on(ctx: &DeviceContext, label: &str, time: SimTime) -> SignalMap {
        let (mode, index) = ctx.new_mode();
        ctx.backend.initialize_number_state(1, index).unwrap();
        let mut signals = SignalMap::new();
        signals.insert(label.to_string(), quantum_signal(mode, time).unwrap());
        signals
    }

    #[test]
    fn test_dataflow_fills_unbound_inputs_with_vacuum() {
        let ctx = DeviceContext::new(SimulationSettings::default().with_cutoff(3));
        let mut bs = IdealBeamSplitter::new(None, None);
        assert_eq!(bs.new_modes(), 2);
        bs.compute_outputs(&ctx).unwrap();
        assert_eq!(ctx.mode_manager.len(), 2);
        assert_eq!(ctx.experiment.pending(), (0, 1, 0));
    }

    #[test]
    fn test_coincident_photons_wait_for_one_wake_up() {
        let ctx = DeviceContext::new(SimulationSettings::default().with_cutoff(3));
        let mut bs = IdealBeamSplitter::new(None, None);
        let t = SimTime::new(1e-6);

        let mut signals = photon_on(&ctx, "A", t);
        signals.extend(photon_on(&ctx, "B", t));
        let mut ectx = EventContext::new(&ctx, &[]);
        assert!(bs.des(t, &signals, &mut ectx).unwrap().is_none());
        let wakeups = ectx.into_wakeups();
        assert_eq!(wakeups.len(), 1);
        let wake = wakeups[0].0;

        let args = [EventArg::Wake];
        let mut ectx = EventContext::new(&ctx, &args);
        let out = bs.des(wake, &SignalMap::new(), &mut ectx).unwrap().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].port, "C");
        assert_eq!(out[1].port, "D");
        assert_eq!(out[0].time, wake);

        // Hong-Ou-Mandel: the photons leave together
        ctx.backend.set_number_of_modes(ctx.mode_manager.len());
        let state = ctx.backend.execute().unwrap();
        assert_relative_eq!(state.fock_prob(&[1, 1]).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(state.fock_prob(&[2, 0]).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lone_photon_mixes_with_vacuum() {
        let ctx = DeviceContext::new(SimulationSettings::default().with_cutoff(3));
        let mut bs = IdealBeamSplitter::new(None, None);
        let t = SimTime::ZERO;
        let signals = photon_on(&ctx, "B", t);
        let mut ectx = EventContext::new(&ctx, &[]);
        bs.des(t, &signals, &mut ectx).unwrap();
        let wake = ectx.into_wakeups()[0].0;

        let args = [EventArg::Wake];
        let mut ectx = EventContext::new(&ctx, &args);
        let out = bs.des(wake, &SignalMap::new(), &mut ectx).unwrap().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(ctx.mode_manager.len(), 2);

        ctx.backend.set_number_of_modes(2);
        let state = ctx.backend.execute().unwrap();
        assert_relative_eq!(state.mean_photon(0).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(state.mean_photon(1).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_stale_wake_up_is_ignored() {
        let ctx = DeviceContext::new(SimulationSettings::default().with_cutoff(2));
        let mut bs = IdealBeamSplitter::new(None, None);
        let args = [EventArg::Wake];
        let mut ectx = EventContext::new(&ctx, &args);
        assert!(bs.des(SimTime::new(1.0), &SignalMap::new(), &mut ectx).unwrap().is_none());
    }
}
