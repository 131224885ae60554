//! Error types for the simulation kernel

use qureed_fock::FockError;
use qureed_types::SignalKind;
use thiserror::Error;

use crate::device::DeviceId;
use crate::mode_manager::ModeId;

/// Errors raised while wiring signals into ports. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WiringError {
    #[error("Port with label '{label}' does not exist on {device}")]
    NoPort { device: String, label: String },

    #[error("Signal already registered for port '{label}' on {device}; pass override to replace it")]
    PortConnected { device: String, label: String },

    #[error("Port '{label}' accepts {expected} signals, got {actual}")]
    PortSignalMismatch {
        label: String,
        expected: SignalKind,
        actual: SignalKind,
    },
}

/// Errors raised by signal cells
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Cannot store a {value} value in a {kind} signal")]
    KindMismatch { kind: SignalKind, value: &'static str },

    #[error("Signal was already computed")]
    AlreadyComputed,

    #[error("Signal not computed within {timeout_ms} ms")]
    NotReady { timeout_ms: u128 },

    #[error("Signal was abandoned by a failed producer")]
    Abandoned,

    #[error("Signal holds no {0} value")]
    Empty(&'static str),
}

/// Mode bookkeeping errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModeError {
    #[error("Mode {0} was never created")]
    UnknownMode(ModeId),
}

/// Errors raised inside a device activation
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error("Numerical backend failed: {0}")]
    Fock(#[from] FockError),

    #[error("Required input '{0}' carries no value")]
    MissingInput(String),

    #[error("Output '{0}' was not computed by the device")]
    OutputNotComputed(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors surfaced by the simulation context
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Device {device} ({type_name}) failed: {source}")]
    Device {
        device: String,
        type_name: &'static str,
        #[source]
        source: DeviceError,
    },

    #[error("Device {0} has no event handler")]
    MissingHandler(DeviceId),

    #[error("Device type {0} implements neither the dataflow nor the event protocol")]
    MissingCapability(&'static str),

    #[error("Device {0} is not registered")]
    UnknownDevice(String),

    #[error("Device {0} is already registered")]
    DuplicateDevice(DeviceId),

    #[error("Unknown device type '{0}'")]
    UnknownDeviceType(String),

    #[error("Unknown signal type '{0}'")]
    UnknownSignalType(String),

    #[error("Dataflow task for {0} panicked")]
    TaskPanicked(String),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("Numerical backend failed: {0}")]
    Fock(#[from] FockError),

    #[error("Scheme parse error: {0}")]
    Scheme(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
