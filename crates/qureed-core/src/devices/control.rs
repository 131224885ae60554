//! Trigger devices

use log::debug;
use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{classical_signal, latched_float};
use crate::context::{DeviceContext, EventContext};
use crate::device::{value_as_f64, DataflowDevice, Device, DeviceId, Emission, EventDevice};
use crate::error::{DeviceError, DeviceResult};
use crate::port::Ports;
use crate::signal::{SignalMap, SignalRef, SignalValue};
use crate::utils::SimTime;

fn true_signal() -> DeviceResult<SignalRef> {
    classical_signal(SignalKind::Bool, SignalValue::Bool(true))
}

fn set_trigger_output(ports: &Ports) -> DeviceResult<()> {
    if let Some(signal) = ports.signal("trigger") {
        signal.set_bool(true)?;
        signal.set_computed();
    }
    Ok(())
}

/// Fires once at `time` (default: 0)
#[derive(Debug)]
pub struct SimpleTrigger {
    name: Option<String>,
    ports: Ports,
    time: f64,
}

impl SimpleTrigger {
    pub const PORTS: [PortSpec; 1] = [PortSpec::output("trigger", SignalKind::Bool)];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            time: 0.0,
        }
    }

    /// Must be set before the first run
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }
}

impl Device for SimpleTrigger {
    crate::device_common!("SimpleTrigger"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(time) = value_as_f64(values, "time")? {
            self.time = time;
        }
        Ok(())
    }
}

impl DataflowDevice for SimpleTrigger {
    fn compute_outputs(&mut self, _ctx: &DeviceContext) -> DeviceResult<()> {
        set_trigger_output(&self.ports)
    }
}

impl EventDevice for SimpleTrigger {
    fn des(
        &mut self,
        time: SimTime,
        _signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if !ctx.is_bootstrap() {
            return Ok(None);
        }
        Ok(Some(vec![Emission::new("trigger", true_signal()?, time)]))
    }

    fn bootstrap(&self) -> Vec<SimTime> {
        vec![SimTime::new(self.time)]
    }
}

/// Periodic trigger.
///
/// Ticks at `time`, `time + 1/f`, `time + 2/f`, ... The frequency comes from
/// [`ClockTrigger::set_frequency`], the scheme values or the `frequency`
/// port. A tick that finds no frequency waits for one and resumes one period
/// after it arrives.
#[derive(Debug)]
pub struct ClockTrigger {
    name: Option<String>,
    ports: Ports,
    frequency: Option<f64>,
    time: f64,
    waiting: bool,
}

impl ClockTrigger {
    pub const PORTS: [PortSpec; 2] = [
        PortSpec::input("frequency", SignalKind::Float),
        PortSpec::output("trigger", SignalKind::Bool),
    ];

    pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
        Self {
            name: name.map(str::to_string),
            ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
            frequency: None,
            time: 0.0,
            waiting: false,
        }
    }

    /// Frequency in Hz
    pub fn set_frequency(&mut self, frequency: f64) -> DeviceResult<()> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(DeviceError::InvalidValue {
                key: "frequency".to_string(),
                reason: format!("{} Hz is not a positive frequency", frequency),
            });
        }
        self.frequency = Some(frequency);
        Ok(())
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }
}

impl Device for ClockTrigger {
    crate::device_common!("ClockTrigger"; dataflow, event);

    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        if let Some(frequency) = value_as_f64(values, "frequency")? {
            self.set_frequency(frequency)?;
        }
        if let Some(time) = value_as_f64(values, "time")? {
            self.time = time;
        }
        Ok(())
    }
}

impl DataflowDevice for ClockTrigger {
    fn compute_outputs(&mut self, _ctx: &DeviceContext) -> DeviceResult<()> {
        if let Some(frequency) = latched_float(&self.ports, "frequency")? {
            self.set_frequency(frequency)?;
        }
        set_trigger_output(&self.ports)
    }
}

impl EventDevice for ClockTrigger {
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>> {
        if let Some(signal) = signals.get("frequency") {
            self.set_frequency(signal.as_float()?)?;
            if self.waiting {
                self.waiting = false;
                if let Some(f) = self.frequency {
                    ctx.schedule_self(time + 1.0 / f);
                }
            }
        }

        if !(ctx.is_wake() || ctx.is_bootstrap()) {
            return Ok(None);
        }
        let Some(f) = self.frequency else {
            debug!(
                target: "qureed::devices",
                "*{}* has no frequency yet, waiting",
                self.display_name()
            );
            self.waiting = true;
            return Ok(None);
        };
        ctx.schedule_self(time + 1.0 / f);
        Ok(Some(vec![Emission::new("trigger", true_signal()?, time)]))
    }

    fn bootstrap(&self) -> Vec<SimTime> {
        vec![SimTime::new(self.time)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EventArg;
    use qureed_types::SimulationSettings;

    #[test]
    fn test_clock_ticks_and_reschedules() {
        let ctx = DeviceContext::new(SimulationSettings::default());
        let mut clock = ClockTrigger::new(None, None);
        clock.set_frequency(1e6).unwrap();
        assert_eq!(clock.bootstrap(), vec![SimTime::ZERO]);

        let args = [EventArg::Bootstrap];
        let mut ectx = EventContext::new(&ctx, &args);
        let out = clock.des(SimTime::ZERO, &SignalMap::new(), &mut ectx).unwrap().unwrap();
        assert!(out[0].signal.as_bool().unwrap());
        let wakeups = ectx.into_wakeups();
        assert_eq!(wakeups, vec![(SimTime::new(1e-6), EventArg::Wake)]);
    }

    #[test]
    fn test_clock_waits_for_frequency() {
        let ctx = DeviceContext::new(SimulationSettings::default());
        let mut clock = ClockTrigger::new(None, None);

        let args = [EventArg::Bootstrap];
        let mut ectx = EventContext::new(&ctx, &args);
        assert!(clock.des(SimTime::ZERO, &SignalMap::new(), &mut ectx).unwrap().is_none());
        assert!(ectx.into_wakeups().is_empty());

        let mut signals = SignalMap::new();
        signals.insert(
            "frequency".to_string(),
            classical_signal(SignalKind::Float, SignalValue::Float(2.0)).unwrap(),
        );
        let mut ectx = EventContext::new(&ctx, &[]);
        assert!(clock.des(SimTime::new(1.0), &signals, &mut ectx).unwrap().is_none());
        assert_eq!(ectx.into_wakeups(), vec![(SimTime::new(1.5), EventArg::Wake)]);
    }

    #[test]
    fn test_invalid_frequency() {
        let mut clock = ClockTrigger::new(None, None);
        assert!(clock.set_frequency(0.0).is_err());
        assert!(clock.set_frequency(f64::NAN).is_err());
        assert_eq!(clock.frequency(), None);
    }

    #[test]
    fn test_simple_trigger_fires_only_on_bootstrap() {
        let ctx = DeviceContext::new(SimulationSettings::default());
        let mut trigger = SimpleTrigger::new(None, None);
        trigger.set_time(1e-3);
        assert_eq!(trigger.bootstrap(), vec![SimTime::new(1e-3)]);

        let mut ectx = EventContext::new(&ctx, &[]);
        assert!(trigger.des(SimTime::ZERO, &SignalMap::new(), &mut ectx).unwrap().is_none());
        let args = [EventArg::Bootstrap];
        let mut ectx = EventContext::new(&ctx, &args);
        let out = trigger.des(SimTime::new(1e-3), &SignalMap::new(), &mut ectx).unwrap().unwrap();
        assert_eq!(out[0].port, "trigger");
    }
}
