//! Constant parameter sources.
//!
//! Variables push their value once. In event-driven runs they fire at
//! [`VARIABLE_EMIT_TIME`] so downstream parameters are in place before any
//! trigger at t = 0.

use qureed_types::{PortSpec, SignalKind};
use serde_json::Value;
use std::collections::BTreeMap;

use super::classical_signal;
use crate::context::{DeviceContext, EventContext};
use crate::device::{
    value_as_f64, value_as_int, DataflowDevice, Device, DeviceId, Emission, EventDevice,
};
use crate::error::{DeviceError, DeviceResult};
use crate::port::Ports;
use crate::signal::{SignalMap, SignalValue};
use crate::utils::constants::VARIABLE_EMIT_TIME;
use crate::utils::SimTime;

fn unset(port: &str) -> DeviceError {
    DeviceError::InvalidValue {
        key: "value".to_string(),
        reason: format!("no value set for output '{}'", port),
    }
}

macro_rules! variable_device {
    (
        $(#[$meta:meta])*
        $name:ident, $type_name:literal, $port:literal, $kind:expr, $value_ty:ty,
        $read:path, $wrap:path
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            name: Option<String>,
            ports: Ports,
            value: Option<$value_ty>,
        }

        impl $name {
            pub const PORTS: [PortSpec; 1] = [PortSpec::output($port, $kind)];

            pub fn new(name: Option<&str>, uid: Option<DeviceId>) -> Self {
                Self {
                    name: name.map(str::to_string),
                    ports: Ports::new(uid.unwrap_or_default(), &Self::PORTS),
                    value: None,
                }
            }

            pub fn set_value(&mut self, value: $value_ty) {
                self.value = Some(value);
            }

            pub fn value(&self) -> Option<$value_ty> {
                self.value
            }

            fn signal_value(&self) -> DeviceResult<SignalValue> {
                self.value.map($wrap).ok_or_else(|| unset($port))
            }
        }

        impl Device for $name {
            crate::device_common!($type_name; dataflow, event);

            fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
                if let Some(value) = $read(values, "value")? {
                    self.value = Some(value);
                }
                Ok(())
            }
        }

        impl DataflowDevice for $name {
            fn compute_outputs(&mut self, _ctx: &DeviceContext) -> DeviceResult<()> {
                if let Some(signal) = self.ports.signal($port) {
                    signal.set(self.signal_value()?)?;
                    signal.set_computed();
                }
                Ok(())
            }
        }

        impl EventDevice for $name {
            fn des(
                &mut self,
                time: SimTime,
                _signals: &SignalMap,
                ctx: &mut EventContext<'_>,
            ) -> DeviceResult<Option<Vec<Emission>>> {
                if !ctx.is_bootstrap() {
                    return Ok(None);
                }
                let signal = classical_signal($kind, self.signal_value()?)?;
                Ok(Some(vec![Emission::new($port, signal, time)]))
            }

            fn bootstrap(&self) -> Vec<SimTime> {
                vec![SimTime::new(VARIABLE_EMIT_TIME)]
            }
        }
    };
}

variable_device!(
    /// Integer constant on the `int` port
    IntVariable, "IntVariable", "int", SignalKind::Int, i64,
    value_as_int, SignalValue::Int
);

variable_device!(
    /// Float constant on the `float` port
    FloatVariable, "FloatVariable", "float", SignalKind::Float, f64,
    value_as_f64, SignalValue::Float
);

variable_device!(
    /// Time constant in seconds on the `time` port
    TimeVariable, "TimeVariable", "time", SignalKind::Time, f64,
    value_as_f64, SignalValue::Time
);
