//! Port instances and signal binding.

use qureed_types::{PortDirection, PortSpec, SignalKind};

use crate::device::DeviceId;
use crate::error::WiringError;
use crate::signal::{PortRef, SignalRef};

/// A port on one device instance
#[derive(Debug, Clone)]
pub struct Port {
    spec: PortSpec,
    signal: Option<SignalRef>,
}

impl Port {
    pub fn label(&self) -> &'static str {
        self.spec.label
    }

    pub fn direction(&self) -> PortDirection {
        self.spec.direction
    }

    pub fn kind(&self) -> SignalKind {
        self.spec.kind
    }

    pub fn signal(&self) -> Option<&SignalRef> {
        self.signal.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.signal.is_some()
    }
}

/// The ports of one device, in schema order
#[derive(Debug, Clone)]
pub struct Ports {
    owner: DeviceId,
    ports: Vec<Port>,
}

impl Ports {
    pub fn new(owner: DeviceId, specs: &[PortSpec]) -> Self {
        Self {
            owner,
            ports: specs
                .iter()
                .map(|&spec| Port { spec, signal: None })
                .collect(),
        }
    }

    /// Device owning these ports
    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    pub fn get(&self, label: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.spec.label == label)
    }

    /// Signal bound to `label`, if any
    pub fn signal(&self, label: &str) -> Option<SignalRef> {
        self.get(label).and_then(|p| p.signal.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction() == PortDirection::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction() == PortDirection::Output)
    }

    /// Bind `signal` to the port `label`.
    ///
    /// Fails if the port does not exist, is already bound (unless
    /// `override_existing`), or does not accept the signal's kind.
    pub fn register_signal(
        &mut self,
        signal: &SignalRef,
        label: &str,
        override_existing: bool,
    ) -> Result<(), WiringError> {
        let owner = self.owner;
        let port = self
            .ports
            .iter_mut()
            .find(|p| p.spec.label == label)
            .ok_or_else(|| WiringError::NoPort {
                device: owner.to_string(),
                label: label.to_string(),
            })?;

        if port.signal.is_some() && !override_existing {
            return Err(WiringError::PortConnected {
                device: owner.to_string(),
                label: label.to_string(),
            });
        }

        if !signal.kind().is_a(port.spec.kind) {
            return Err(WiringError::PortSignalMismatch {
                label: label.to_string(),
                expected: port.spec.kind,
                actual: signal.kind(),
            });
        }

        let port_ref = PortRef::new(owner, label);
        if let Some(previous) = port.signal.take() {
            previous.unregister_port(&port_ref);
        }
        signal.register_port(port_ref);
        port.signal = Some(signal.clone());
        Ok(())
    }

    /// Unbind the port, returning the signal it held
    pub fn disconnect(&mut self, label: &str) -> Option<SignalRef> {
        let owner = self.owner;
        let port = self.ports.iter_mut().find(|p| p.spec.label == label)?;
        let signal = port.signal.take()?;
        signal.unregister_port(&PortRef::new(owner, label));
        Some(signal)
    }

    pub fn disconnect_all(&mut self) {
        let labels: Vec<&'static str> = self.ports.iter().map(|p| p.spec.label).collect();
        for label in labels {
            self.disconnect(label);
        }
    }

    /// Modes this device adds to the simulation: quantum outputs that cannot
    /// reuse an input mode, plus quantum inputs left unconnected.
    pub fn new_modes(&self) -> usize {
        let outputs = self.outputs().filter(|p| p.spec.is_quantum()).count();
        let inputs: Vec<&Port> = self.inputs().filter(|p| p.spec.is_quantum()).collect();
        outputs.saturating_sub(inputs.len()) + inputs.iter().filter(|p| !p.is_connected()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;

    const SPECS: [PortSpec; 3] = [
        PortSpec::input("trigger", SignalKind::Bool),
        PortSpec::input("input", SignalKind::Quantum),
        PortSpec::output("output", SignalKind::Quantum),
    ];

    #[test]
    fn test_register_and_disconnect() {
        let mut ports = Ports::new(DeviceId::new(), &SPECS);
        let signal = Signal::new(SignalKind::Quantum);
        ports.register_signal(&signal, "output", false).unwrap();
        assert_eq!(signal.ports().len(), 1);
        assert!(ports.get("output").unwrap().is_connected());

        let removed = ports.disconnect("output").unwrap();
        assert!(removed.ports().is_empty());
        assert!(ports.signal("output").is_none());
    }

    #[test]
    fn test_wiring_errors() {
        let mut ports = Ports::new(DeviceId::new(), &SPECS);
        let quantum = Signal::new(SignalKind::Quantum);
        assert!(matches!(
            ports.register_signal(&quantum, "missing", false),
            Err(WiringError::NoPort { .. })
        ));
        assert!(matches!(
            ports.register_signal(&Signal::new(SignalKind::Int), "trigger", false),
            Err(WiringError::PortSignalMismatch {
                expected: SignalKind::Bool,
                actual: SignalKind::Int,
                ..
            })
        ));
        ports.register_signal(&quantum, "input", false).unwrap();
        assert!(matches!(
            ports.register_signal(&Signal::new(SignalKind::Quantum), "input", false),
            Err(WiringError::PortConnected { .. })
        ));
    }

    #[test]
    fn test_override_moves_back_reference() {
        let mut ports = Ports::new(DeviceId::new(), &SPECS);
        let first = Signal::new(SignalKind::Quantum);
        let second = Signal::new(SignalKind::Fock);
        ports.register_signal(&first, "input", false).unwrap();
        ports.register_signal(&second, "input", true).unwrap();
        assert!(first.ports().is_empty());
        assert_eq!(second.ports().len(), 1);
    }

    #[test]
    fn test_new_modes_counts_unbound_quantum_inputs() {
        let mut ports = Ports::new(DeviceId::new(), &SPECS);
        // one output paired with one input, and that input is unbound
        assert_eq!(ports.new_modes(), 1);
        ports
            .register_signal(&Signal::new(SignalKind::Quantum), "input", false)
            .unwrap();
        assert_eq!(ports.new_modes(), 0);

        let source = Ports::new(DeviceId::new(), &[PortSpec::output("output", SignalKind::Quantum)]);
        assert_eq!(source.new_modes(), 1);
    }
}
