//! Truncated Fock-space numerics for QuReed.
//!
//! Operators are dense `Array2<Complex64>` matrices over the number basis
//! `|0>, ..., |D-1>`. Multi-mode density matrices are rank `2n` tensors with
//! interleaved axes `(ket_0, bra_0, ket_1, bra_1, ...)`, each of length `D`.
//!
//! Gates are applied by moving the targeted axes to the back of the tensor and
//! multiplying `G rho G^dagger` block by block, so the cost grows with the
//! number of targeted modes rather than with the full tensor rank.

mod contract;
mod error;
mod gate;
pub mod kets;
pub mod ops;
mod state;

pub use contract::*;
pub use error::*;
pub use gate::*;
pub use state::*;

pub use num_complex::Complex64;

/// Dense single-mode (or flattened multi-mode) operator
pub type Operator = ndarray::Array2<Complex64>;

/// Imaginary unit
pub const I: Complex64 = Complex64::new(0.0, 1.0);

/// Traces below this magnitude cannot be renormalised
pub const ZERO_TRACE_TOLERANCE: f64 = 1e-14;
