//! Signals: typed, thread-visible data cells with a one-shot "computed" latch.
//!
//! A signal is written once by its producer and then latched. Consumers block
//! on the latch in dataflow runs. A producer that fails abandons its signals so
//! consumers return an error instead of waiting forever.

use num_complex::Complex64;
use parking_lot::{Condvar, Mutex};
use qureed_types::SignalKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::device::DeviceId;
use crate::error::SignalError;
use crate::mode_manager::ModeId;

/// Shared handle to a signal
pub type SignalRef = Arc<Signal>;

/// Signals delivered to a device, keyed by the receiving port label
pub type SignalMap = BTreeMap<String, SignalRef>;

/// Reference carried by quantum signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantumContent {
    /// Mode the excitation lives in
    pub mode: ModeId,
    /// Emission timestamp, informational
    pub timestamp: f64,
}

/// Value stored in a signal
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SignalValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    Time(f64),
    Quantum(QuantumContent),
}

impl SignalValue {
    fn kind(&self) -> Option<SignalKind> {
        match self {
            SignalValue::Empty => None,
            SignalValue::Bool(_) => Some(SignalKind::Bool),
            SignalValue::Int(_) => Some(SignalKind::Int),
            SignalValue::Float(_) => Some(SignalKind::Float),
            SignalValue::Complex(_) => Some(SignalKind::Complex),
            SignalValue::Time(_) => Some(SignalKind::Time),
            SignalValue::Quantum(_) => Some(SignalKind::Quantum),
        }
    }

    fn name(&self) -> &'static str {
        self.kind().map(|k| k.as_str()).unwrap_or("empty")
    }
}

/// A port a signal is wired into
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub device: DeviceId,
    pub label: String,
}

impl PortRef {
    pub fn new(device: DeviceId, label: &str) -> Self {
        Self {
            device,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Pending,
    Computed,
    Abandoned,
}

#[derive(Debug)]
pub struct Signal {
    kind: SignalKind,
    contents: Mutex<SignalValue>,
    latch: Mutex<Latch>,
    ready: Condvar,
    ports: Mutex<Vec<PortRef>>,
}

impl Signal {
    /// Create an empty, pending signal of the given kind
    pub fn new(kind: SignalKind) -> SignalRef {
        Arc::new(Self {
            kind,
            contents: Mutex::new(SignalValue::Empty),
            latch: Mutex::new(Latch::Pending),
            ready: Condvar::new(),
            ports: Mutex::new(Vec::new()),
        })
    }

    /// Create a signal already holding `value` and latched
    pub fn computed(kind: SignalKind, value: SignalValue) -> Result<SignalRef, SignalError> {
        let signal = Self::new(kind);
        signal.set(value)?;
        signal.set_computed();
        Ok(signal)
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Store a value. Rejects values the signal kind cannot carry and
    /// writes after the latch is set.
    pub fn set(&self, value: SignalValue) -> Result<(), SignalError> {
        if let Some(value_kind) = value.kind() {
            if !(value_kind.is_a(self.kind) || self.kind.is_a(value_kind)) {
                return Err(SignalError::KindMismatch {
                    kind: self.kind,
                    value: value.name(),
                });
            }
        }
        if *self.latch.lock() != Latch::Pending {
            return Err(SignalError::AlreadyComputed);
        }
        *self.contents.lock() = value;
        Ok(())
    }

    pub fn set_bool(&self, value: bool) -> Result<(), SignalError> {
        self.set(SignalValue::Bool(value))
    }

    pub fn set_int(&self, value: i64) -> Result<(), SignalError> {
        self.set(SignalValue::Int(value))
    }

    pub fn set_float(&self, value: f64) -> Result<(), SignalError> {
        self.set(SignalValue::Float(value))
    }

    pub fn set_complex(&self, value: Complex64) -> Result<(), SignalError> {
        self.set(SignalValue::Complex(value))
    }

    pub fn set_time(&self, value: f64) -> Result<(), SignalError> {
        self.set(SignalValue::Time(value))
    }

    pub fn set_quantum(&self, mode: ModeId, timestamp: f64) -> Result<(), SignalError> {
        self.set(SignalValue::Quantum(QuantumContent { mode, timestamp }))
    }

    /// Mark the value as final and wake every waiter. Idempotent.
    pub fn set_computed(&self) {
        let mut latch = self.latch.lock();
        if *latch == Latch::Pending {
            *latch = Latch::Computed;
            self.ready.notify_all();
        }
    }

    /// Release waiters with an error; no effect once computed
    pub fn abandon(&self) {
        let mut latch = self.latch.lock();
        if *latch == Latch::Pending {
            *latch = Latch::Abandoned;
            self.ready.notify_all();
        }
    }

    pub fn is_computed(&self) -> bool {
        *self.latch.lock() == Latch::Computed
    }

    /// Block until the signal is computed, optionally bounded by `timeout`
    pub fn wait_till_compute(&self, timeout: Option<Duration>) -> Result<(), SignalError> {
        let mut latch = self.latch.lock();
        match timeout {
            None => {
                while *latch == Latch::Pending {
                    self.ready.wait(&mut latch);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while *latch == Latch::Pending {
                    if self.ready.wait_until(&mut latch, deadline).timed_out() {
                        break;
                    }
                }
            }
        }
        match *latch {
            Latch::Computed => Ok(()),
            Latch::Abandoned => Err(SignalError::Abandoned),
            Latch::Pending => Err(SignalError::NotReady {
                timeout_ms: timeout.map(|t| t.as_millis()).unwrap_or_default(),
            }),
        }
    }

    pub fn contents(&self) -> SignalValue {
        self.contents.lock().clone()
    }

    pub fn as_bool(&self) -> Result<bool, SignalError> {
        match *self.contents.lock() {
            SignalValue::Bool(v) => Ok(v),
            _ => Err(SignalError::Empty("bool")),
        }
    }

    pub fn as_int(&self) -> Result<i64, SignalError> {
        match *self.contents.lock() {
            SignalValue::Int(v) => Ok(v),
            _ => Err(SignalError::Empty("int")),
        }
    }

    /// Numeric value, widening ints
    pub fn as_float(&self) -> Result<f64, SignalError> {
        match *self.contents.lock() {
            SignalValue::Float(v) | SignalValue::Time(v) => Ok(v),
            SignalValue::Int(v) => Ok(v as f64),
            _ => Err(SignalError::Empty("float")),
        }
    }

    pub fn as_complex(&self) -> Result<Complex64, SignalError> {
        match *self.contents.lock() {
            SignalValue::Complex(v) => Ok(v),
            SignalValue::Float(v) => Ok(Complex64::new(v, 0.0)),
            _ => Err(SignalError::Empty("complex")),
        }
    }

    pub fn as_quantum(&self) -> Result<QuantumContent, SignalError> {
        match *self.contents.lock() {
            SignalValue::Quantum(q) => Ok(q),
            _ => Err(SignalError::Empty("quantum")),
        }
    }

    /// Record that `port` is wired to this signal
    pub fn register_port(&self, port: PortRef) {
        self.ports.lock().push(port);
    }

    pub fn unregister_port(&self, port: &PortRef) {
        let mut ports = self.ports.lock();
        if let Some(pos) = ports.iter().position(|p| p == port) {
            ports.remove(pos);
        }
    }

    /// Every port this signal is wired into
    pub fn ports(&self) -> Vec<PortRef> {
        self.ports.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_typed_setter_rejects_other_kinds() {
        let signal = Signal::new(SignalKind::Bool);
        assert!(matches!(
            signal.set_int(3),
            Err(SignalError::KindMismatch { kind: SignalKind::Bool, value: "int" })
        ));
        signal.set_bool(true).unwrap();
        assert_eq!(signal.as_bool(), Ok(true));
    }

    #[test]
    fn test_generic_signal_accepts_any_value() {
        let signal = Signal::new(SignalKind::Generic);
        signal.set_float(2.5).unwrap();
        assert_eq!(signal.as_float(), Ok(2.5));
    }

    #[test]
    fn test_write_after_latch_fails() {
        let signal = Signal::new(SignalKind::Int);
        signal.set_int(1).unwrap();
        signal.set_computed();
        signal.set_computed();
        assert_eq!(signal.set_int(2), Err(SignalError::AlreadyComputed));
        assert_eq!(signal.as_int(), Ok(1));
    }

    #[test]
    fn test_waiter_wakes_on_latch() {
        let signal = Signal::new(SignalKind::Float);
        let producer = signal.clone();
        let handle = thread::spawn(move || {
            producer.set_float(1.0).unwrap();
            producer.set_computed();
        });
        signal.wait_till_compute(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(signal.as_float(), Ok(1.0));
        handle.join().unwrap();
    }

    #[test]
    fn test_timeout_and_abandon() {
        let signal = Signal::new(SignalKind::Bool);
        assert!(matches!(
            signal.wait_till_compute(Some(Duration::from_millis(10))),
            Err(SignalError::NotReady { .. })
        ));
        signal.abandon();
        assert_eq!(signal.wait_till_compute(None), Err(SignalError::Abandoned));
        assert!(!signal.is_computed());
    }

    #[test]
    fn test_port_registration() {
        let signal = Signal::new(SignalKind::Quantum);
        let a = PortRef::new(DeviceId::new(), "output");
        let b = PortRef::new(DeviceId::new(), "input");
        signal.register_port(a.clone());
        signal.register_port(b.clone());
        signal.unregister_port(&a);
        assert_eq!(signal.ports(), vec![b]);
    }
}
