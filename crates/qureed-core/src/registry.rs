//! Device and signal registry used to load schemes.
//!
//! Schemes name device classes and signal classes by path, either short
//! (`IdealBeamSplitter`) or dotted (`quasi.devices.beam_splitters.ideal_beam_splitter.IdealBeamSplitter`).
//! Lookups try the full string first and then its last path segment.

use qureed_types::SignalKind;
use std::collections::HashMap;

use crate::device::{Device, DeviceId};
use crate::devices;
use crate::error::{SimulationError, SimulationResult};

/// Builds a device from its optional name and id
pub type DeviceFactory = fn(Option<&str>, DeviceId) -> Box<dyn Device>;

#[derive(Clone, Default)]
pub struct Registry {
    devices: HashMap<String, DeviceFactory>,
    signals: HashMap<String, SignalKind>,
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

macro_rules! register_devices {
    ($registry:expr, $($ty:ident),+ $(,)?) => {
        $(
            $registry.register_device(stringify!($ty), |name, id| {
                Box::new(devices::$ty::new(name, Some(id)))
            });
        )+
    };
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("devices", &self.device_types())
            .field("signals", &self.signals)
            .finish()
    }
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in catalog and signal classes
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_devices!(
            registry,
            IdealNPhotonSource,
            IdealCoherentSource,
            IdealSqueezedSource,
            IdealBeamSplitter,
            IdealPhaseShifter,
            IdealFiber,
            LossyFiber,
            IdealDetector,
            SimpleTrigger,
            ClockTrigger,
            IntVariable,
            FloatVariable,
            TimeVariable,
        );

        for (name, kind) in [
            ("GenericSignal", SignalKind::Generic),
            ("GenericBoolSignal", SignalKind::Bool),
            ("GenericIntSignal", SignalKind::Int),
            ("GenericFloatSignal", SignalKind::Float),
            ("GenericComplexSignal", SignalKind::Complex),
            ("GenericTimeSignal", SignalKind::Time),
            ("GenericQuantumSignal", SignalKind::Quantum),
            ("FockSignal", SignalKind::Fock),
        ] {
            registry.register_signal(name, kind);
        }
        for kind in SignalKind::ALL {
            registry.register_signal(kind.as_str(), kind);
        }
        registry
    }

    pub fn register_device(&mut self, path: &str, factory: DeviceFactory) {
        self.devices.insert(path.to_string(), factory);
    }

    pub fn register_signal(&mut self, path: &str, kind: SignalKind) {
        self.signals.insert(path.to_string(), kind);
    }

    /// Instantiate the device class registered under `path`
    pub fn create(
        &self,
        path: &str,
        name: Option<&str>,
        id: DeviceId,
    ) -> SimulationResult<Box<dyn Device>> {
        let factory = self
            .devices
            .get(path)
            .or_else(|| self.devices.get(last_segment(path)))
            .ok_or_else(|| SimulationError::UnknownDeviceType(path.to_string()))?;
        Ok(factory(name, id))
    }

    pub fn signal_kind(&self, path: &str) -> SimulationResult<SignalKind> {
        self.signals
            .get(path)
            .or_else(|| self.signals.get(last_segment(path)))
            .copied()
            .ok_or_else(|| SimulationError::UnknownSignalType(path.to_string()))
    }

    /// Registered device class names, sorted
    pub fn device_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_and_short_paths() {
        let registry = Registry::with_defaults();
        let id = DeviceId::new();
        let device = registry
            .create(
                "quasi.devices.beam_splitters.ideal_beam_splitter.IdealBeamSplitter",
                Some("bs"),
                id,
            )
            .unwrap();
        assert_eq!(device.type_name(), "IdealBeamSplitter");
        assert_eq!(device.id(), id);
        assert_eq!(device.name(), Some("bs"));
        assert!(registry.create("IdealDetector", None, DeviceId::new()).is_ok());
        let time = registry
            .create("qureed.devices.variables.TimeVariable", None, DeviceId::new())
            .unwrap();
        assert_eq!(time.type_name(), "TimeVariable");
        assert_eq!(time.ports().get("time").map(|p| p.kind()), Some(SignalKind::Time));
        assert!(matches!(
            registry.create("quasi.devices.Teleporter", None, DeviceId::new()),
            Err(SimulationError::UnknownDeviceType(_))
        ));
    }

    #[test]
    fn test_signal_lookup() {
        let registry = Registry::with_defaults();
        assert_eq!(
            registry
                .signal_kind("quasi.signals.generic_bool_signal.GenericBoolSignal")
                .unwrap(),
            SignalKind::Bool
        );
        assert_eq!(registry.signal_kind("quantum").unwrap(), SignalKind::Quantum);
        assert!(registry.signal_kind("PolarizationSignal").is_err());
    }

    #[test]
    fn test_catalog_names_match_type_names() {
        let registry = Registry::with_defaults();
        for name in registry.device_types() {
            let device = registry.create(name, None, DeviceId::new()).unwrap();
            assert_eq!(device.type_name(), name);
        }
    }
}
