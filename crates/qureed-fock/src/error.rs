//! Fock engine errors

use thiserror::Error;

/// Errors raised at the numerical engine boundary
#[derive(Error, Debug)]
pub enum FockError {
    #[error("Cutoff must be at least 1, got {0}")]
    InvalidCutoff(usize),

    #[error("Mode {mode} out of range for a {num_modes}-mode state")]
    ModeOutOfRange { mode: usize, num_modes: usize },

    #[error("Mode {0} targeted more than once")]
    DuplicateMode(usize),

    #[error("Gate acts on {gate} modes but {targets} target modes were given")]
    ArityMismatch { gate: usize, targets: usize },

    #[error("Photon number {n} is not representable with cutoff {cutoff}")]
    PhotonNumberOutOfRange { n: usize, cutoff: usize },

    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("State trace {0:e} is zero, cannot renormalise")]
    ZeroTrace(f64),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    Shape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Reshape failed: {0}")]
    Reshape(#[from] ndarray::ShapeError),
}

pub type FockResult<T> = Result<T, FockError>;

pub(crate) fn check_cutoff(cutoff: usize) -> FockResult<()> {
    if cutoff == 0 {
        return Err(FockError::InvalidCutoff(cutoff));
    }
    Ok(())
}

/// Targets must be distinct and inside `0..num_modes`
pub(crate) fn check_modes(modes: &[usize], num_modes: usize) -> FockResult<()> {
    for (i, &mode) in modes.iter().enumerate() {
        if mode >= num_modes {
            return Err(FockError::ModeOutOfRange { mode, num_modes });
        }
        if modes[..i].contains(&mode) {
            return Err(FockError::DuplicateMode(mode));
        }
    }
    Ok(())
}
