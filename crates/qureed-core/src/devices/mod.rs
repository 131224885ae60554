//! Device catalog.
//!
//! Every device implements both activation protocols so a circuit can run
//! as a dataflow evaluation or as a discrete-event simulation.

mod beam_splitter;
mod control;
mod detector;
mod fiber;
mod phase_shifter;
mod sources;
mod variables;

pub use beam_splitter::IdealBeamSplitter;
pub use control::{ClockTrigger, SimpleTrigger};
pub use detector::{Detection, IdealDetector};
pub use fiber::{propagation_delay, transmissivity, IdealFiber, LossyFiber};
pub use phase_shifter::IdealPhaseShifter;
pub use sources::{IdealCoherentSource, IdealNPhotonSource, IdealSqueezedSource};
pub use variables::{FloatVariable, IntVariable, TimeVariable};

use qureed_types::SignalKind;

use crate::context::DeviceContext;
use crate::error::{DeviceError, DeviceResult};
use crate::mode_manager::ModeId;
use crate::port::Ports;
use crate::signal::{Signal, SignalRef, SignalValue};
use crate::utils::SimTime;

/// Fresh latched quantum signal pointing at `mode`
pub(crate) fn quantum_signal(mode: ModeId, time: SimTime) -> DeviceResult<SignalRef> {
    let signal = Signal::new(SignalKind::Quantum);
    signal.set_quantum(mode, time.seconds())?;
    signal.set_computed();
    Ok(signal)
}

/// Fresh latched classical signal
pub(crate) fn classical_signal(kind: SignalKind, value: SignalValue) -> DeviceResult<SignalRef> {
    Ok(Signal::computed(kind, value)?)
}

/// Write `mode` into the signal bound to `label` and latch it. Unbound
/// outputs are skipped.
pub(crate) fn set_quantum_output(ports: &Ports, label: &str, mode: ModeId) -> DeviceResult<()> {
    if let Some(signal) = ports.signal(label) {
        signal.set_quantum(mode, 0.0)?;
        signal.set_computed();
    }
    Ok(())
}

/// Mode carried by a bound quantum input, or a fresh vacuum mode if the port
/// is unbound
pub(crate) fn input_mode_or_vacuum(
    ctx: &DeviceContext,
    ports: &Ports,
    label: &str,
) -> DeviceResult<(ModeId, usize)> {
    match ports.signal(label) {
        Some(signal) => {
            let mode = signal.as_quantum()?.mode;
            Ok((mode, ctx.mode_index(mode)?))
        }
        None => Ok(ctx.new_mode()),
    }
}

/// Value of a bound, latched float input
pub(crate) fn latched_float(ports: &Ports, label: &str) -> DeviceResult<Option<f64>> {
    match ports.signal(label) {
        Some(signal) if signal.is_computed() => Ok(Some(signal.as_float()?)),
        _ => Ok(None),
    }
}

/// Value of a bound, latched int input
pub(crate) fn latched_int(ports: &Ports, label: &str) -> DeviceResult<Option<i64>> {
    match ports.signal(label) {
        Some(signal) if signal.is_computed() => Ok(Some(signal.as_int()?)),
        _ => Ok(None),
    }
}

pub(crate) fn photon_count(key: &str, value: i64) -> DeviceResult<usize> {
    usize::try_from(value).map_err(|_| DeviceError::InvalidValue {
        key: key.to_string(),
        reason: format!("{} is not a photon number", value),
    })
}
