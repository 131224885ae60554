//! Numerical backends.
//!
//! Devices never touch the Fock engine directly. They ask the backend for
//! gates and queue them on the experiment by mode index.

mod fock_first;

pub use fock_first::FockBackendFirst;

use num_complex::Complex64;
use qureed_fock::{FockResult, FockState, Gate};

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn set_number_of_modes(&self, num_modes: usize);

    fn set_dimensions(&self, cutoff: usize);

    /// Grow the mode count if more modes were allocated than budgeted
    fn ensure_modes(&self, num_modes: usize);

    /// Prepare for a new run
    fn initialize(&self);

    fn cutoff(&self) -> usize;

    fn create(&self) -> FockResult<Gate>;

    fn destroy(&self) -> FockResult<Gate>;

    fn number(&self) -> FockResult<Gate>;

    /// Squeezing `S(z)` with `z = r e^{i theta}`
    fn squeeze(&self, z: Complex64) -> FockResult<Gate>;

    /// Displacement `D(alpha)`
    fn displace(&self, alpha: Complex64) -> FockResult<Gate>;

    fn phase_shift(&self, theta: f64) -> FockResult<Gate>;

    fn kerr(&self, kappa: f64) -> FockResult<Gate>;

    fn beam_splitter(&self, theta: f64, phi: f64) -> FockResult<Gate>;

    /// Kraus set of a pure-loss channel with transmissivity `transmission`
    fn loss(&self, transmission: f64) -> FockResult<Vec<Gate>>;

    fn apply_operator(&self, gate: Gate, modes: &[usize]) -> FockResult<()>;

    fn apply_channel(&self, kraus: Vec<Gate>, modes: &[usize]) -> FockResult<()>;

    fn initialize_number_state(&self, photon_number: usize, mode: usize) -> FockResult<()>;

    fn execute(&self) -> FockResult<FockState>;

    /// State from the last execution
    fn state(&self) -> Option<FockState>;
}
