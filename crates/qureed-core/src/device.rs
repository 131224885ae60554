//! Device protocol.
//!
//! Every device exposes a fixed port schema and one or both activation
//! protocols:
//!
//! - [`DataflowDevice::compute_outputs`] runs once per dataflow run, after all
//!   bound inputs are computed.
//! - [`EventDevice::des`] runs for every discrete event addressed to the
//!   device and returns the outputs to deliver downstream.
//!
//! The protocols are reached through `as_dataflow` / `as_event`; the simulation
//! inspects them at registration and rejects a device offering neither.

use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::context::{DeviceContext, EventContext};
use crate::error::{DeviceError, DeviceResult, WiringError};
use crate::port::Ports;
use crate::signal::{SignalMap, SignalRef};
use crate::utils::SimTime;

/// Globally unique device identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn new() -> Self {
        DeviceId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        DeviceId(uuid)
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(DeviceId)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Activation protocols a device implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub dataflow: bool,
    pub event: bool,
}

/// Registration record for a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInformation {
    pub uuid: DeviceId,
    pub name: Option<String>,
    pub device_type: &'static str,
    pub capabilities: Capabilities,
    /// Modes the device adds to the mode budget
    pub new_modes: usize,
}

/// One output produced by an event handler
#[derive(Debug, Clone)]
pub struct Emission {
    /// Output port label on the emitting device
    pub port: String,
    pub signal: SignalRef,
    /// Absolute delivery time
    pub time: SimTime,
}

impl Emission {
    pub fn new(port: &str, signal: SignalRef, time: SimTime) -> Self {
        Self {
            port: port.to_string(),
            signal,
            time,
        }
    }
}

pub trait Device: Send + Any {
    fn id(&self) -> DeviceId;

    fn name(&self) -> Option<&str>;

    /// Short type name, also the registry key
    fn type_name(&self) -> &'static str;

    fn ports(&self) -> &Ports;

    fn ports_mut(&mut self) -> &mut Ports;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn as_dataflow(&mut self) -> Option<&mut dyn DataflowDevice> {
        None
    }

    fn as_event(&mut self) -> Option<&mut dyn EventDevice> {
        None
    }

    /// Apply persisted parameters (the `values` block of a scheme entry)
    fn set_values(&mut self, values: &BTreeMap<String, Value>) -> DeviceResult<()> {
        let _ = values;
        Ok(())
    }

    fn register_signal(
        &mut self,
        signal: &SignalRef,
        port_label: &str,
        override_existing: bool,
    ) -> Result<(), WiringError> {
        self.ports_mut()
            .register_signal(signal, port_label, override_existing)
    }

    fn new_modes(&self) -> usize {
        self.ports().new_modes()
    }

    /// Name if set, otherwise the type name
    fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| self.type_name().to_string())
    }
}

/// Instantaneous dataflow evaluation
pub trait DataflowDevice {
    /// Compute and latch every bound output. Inputs are already computed.
    fn compute_outputs(&mut self, ctx: &DeviceContext) -> DeviceResult<()>;
}

/// Discrete-event evaluation
pub trait EventDevice {
    /// Handle one event. `signals` maps receiving port labels to delivered
    /// signals; it is empty for self wake-ups and bootstrap events.
    fn des(
        &mut self,
        time: SimTime,
        signals: &SignalMap,
        ctx: &mut EventContext<'_>,
    ) -> DeviceResult<Option<Vec<Emission>>>;

    /// Times at which the device wants to be woken before any input arrives
    fn bootstrap(&self) -> Vec<SimTime> {
        Vec::new()
    }
}

/// Read a numeric parameter from a scheme `values` block
pub fn value_as_f64(values: &BTreeMap<String, Value>, key: &str) -> DeviceResult<Option<f64>> {
    match values.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Some(0.0)),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| DeviceError::InvalidValue {
            key: key.to_string(),
            reason: format!("'{}' is not a number", s),
        }),
        Some(other) => Err(DeviceError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a number, got {}", other),
        }),
    }
}

/// Read a signed integer parameter from a scheme `values` block
pub fn value_as_int(values: &BTreeMap<String, Value>, key: &str) -> DeviceResult<Option<i64>> {
    match value_as_f64(values, key)? {
        None => Ok(None),
        Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
        Some(v) => Err(DeviceError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} is not an integer", v),
        }),
    }
}

/// Read a non-negative integer parameter from a scheme `values` block
pub fn value_as_count(values: &BTreeMap<String, Value>, key: &str) -> DeviceResult<Option<usize>> {
    match value_as_f64(values, key)? {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as usize)),
        Some(v) => Err(DeviceError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} is not a non-negative integer", v),
        }),
    }
}

/// Implements the identity, port and downcast plumbing of [`Device`] for a
/// struct with `name: Option<String>` and `ports: Ports` fields, plus the
/// listed protocol accessors (`dataflow`, `event`).
#[macro_export]
macro_rules! device_common {
    ($type_name:literal $(; $($protocol:ident),+)?) => {
        fn id(&self) -> $crate::device::DeviceId {
            self.ports.owner()
        }

        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        fn type_name(&self) -> &'static str {
            $type_name
        }

        fn ports(&self) -> &$crate::port::Ports {
            &self.ports
        }

        fn ports_mut(&mut self) -> &mut $crate::port::Ports {
            &mut self.ports
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        $($($crate::device_common!(@$protocol);)+)?
    };
    (@dataflow) => {
        fn as_dataflow(&mut self) -> Option<&mut dyn $crate::device::DataflowDevice> {
            Some(self)
        }
    };
    (@event) => {
        fn as_event(&mut self) -> Option<&mut dyn $crate::device::EventDevice> {
            Some(self)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parsing() {
        let mut values = BTreeMap::new();
        values.insert("a".to_string(), Value::from(2));
        values.insert("b".to_string(), Value::from("1.5"));
        values.insert("c".to_string(), Value::from(""));
        values.insert("d".to_string(), Value::from(true));
        values.insert("e".to_string(), Value::from(-1));

        assert_eq!(value_as_f64(&values, "a").unwrap(), Some(2.0));
        assert_eq!(value_as_f64(&values, "b").unwrap(), Some(1.5));
        assert_eq!(value_as_f64(&values, "c").unwrap(), Some(0.0));
        assert_eq!(value_as_f64(&values, "missing").unwrap(), None);
        assert!(value_as_f64(&values, "d").is_err());
        assert_eq!(value_as_count(&values, "a").unwrap(), Some(2));
        assert!(value_as_count(&values, "e").is_err());
        assert!(value_as_count(&values, "b").is_err());
    }

    #[test]
    fn test_device_id_parse() {
        let id = DeviceId::new();
        assert_eq!(DeviceId::parse(&id.to_string()), Some(id));
        assert_eq!(DeviceId::parse("not-a-uuid"), None);
    }
}
