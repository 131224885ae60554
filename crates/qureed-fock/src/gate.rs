//! Gates as flattened `(D^k, D^k)` matrices.

use ndarray::{Array2, Array4, ArrayD};
use num_complex::Complex64;

use crate::{check_cutoff, ops, FockError, FockResult, Operator};

/// A unitary (or Kraus) operator acting on `arity` modes.
///
/// Rows index the output occupation numbers and columns the input ones, both
/// flattened row-major over the targeted modes in target order.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    matrix: Operator,
    arity: usize,
    cutoff: usize,
}

impl Gate {
    /// Wrap a single-mode `(D, D)` operator
    pub fn single(op: Operator) -> FockResult<Self> {
        let cutoff = op.nrows();
        check_cutoff(cutoff)?;
        if op.ncols() != cutoff {
            return Err(FockError::Shape {
                expected: vec![cutoff, cutoff],
                actual: op.shape().to_vec(),
            });
        }
        Ok(Self {
            matrix: op,
            arity: 1,
            cutoff,
        })
    }

    /// Build from a flattened matrix acting on `arity` modes
    pub fn from_matrix(matrix: Operator, arity: usize, cutoff: usize) -> FockResult<Self> {
        check_cutoff(cutoff)?;
        let dim = cutoff.pow(arity as u32);
        if matrix.shape() != [dim, dim] {
            return Err(FockError::Shape {
                expected: vec![dim, dim],
                actual: matrix.shape().to_vec(),
            });
        }
        Ok(Self {
            matrix,
            arity,
            cutoff,
        })
    }

    /// Build from a rank-`2k` tensor with interleaved `(out, in, out, in, ...)` axes
    pub fn from_interleaved(tensor: ArrayD<Complex64>) -> FockResult<Self> {
        let rank = tensor.ndim();
        let cutoff = tensor.shape().first().copied().unwrap_or(0);
        check_cutoff(cutoff)?;
        if rank % 2 != 0 || tensor.shape().iter().any(|&d| d != cutoff) {
            return Err(FockError::Shape {
                expected: vec![cutoff; rank + rank % 2],
                actual: tensor.shape().to_vec(),
            });
        }
        let arity = rank / 2;
        let axes: Vec<usize> = (0..rank)
            .step_by(2)
            .chain((1..rank).step_by(2))
            .collect();
        let dim = cutoff.pow(arity as u32);
        let matrix = tensor
            .permuted_axes(axes.as_slice())
            .as_standard_layout()
            .into_owned()
            .into_shape((dim, dim))?;
        Ok(Self {
            matrix,
            arity,
            cutoff,
        })
    }

    /// Beamsplitter gate on two modes
    pub fn beamsplitter(theta: f64, phi: f64, cutoff: usize) -> FockResult<Self> {
        let b: Array4<Complex64> = ops::beamsplitter(theta, phi, cutoff);
        Self::from_interleaved(b.permuted_axes([0, 2, 1, 3]).into_dyn())
    }

    pub fn matrix(&self) -> &Operator {
        &self.matrix
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Conjugate transpose of the gate
    pub fn dagger(&self) -> Self {
        Self {
            matrix: ops::dagger(&self.matrix),
            arity: self.arity,
            cutoff: self.cutoff,
        }
    }

    /// Compose two gates on the same modes: `self` after `first`
    pub fn after(&self, first: &Gate) -> FockResult<Self> {
        if self.arity != first.arity || self.cutoff != first.cutoff {
            return Err(FockError::Shape {
                expected: vec![self.arity, self.cutoff],
                actual: vec![first.arity, first.cutoff],
            });
        }
        Ok(Self {
            matrix: self.matrix.dot(&first.matrix),
            arity: self.arity,
            cutoff: self.cutoff,
        })
    }

    /// Dimension of the space the matrix acts on
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }
}

impl TryFrom<Array2<Complex64>> for Gate {
    type Error = FockError;

    fn try_from(op: Array2<Complex64>) -> FockResult<Self> {
        Gate::single(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_rejects_non_square() {
        let op = Array2::zeros((2, 3));
        assert!(matches!(Gate::single(op), Err(FockError::Shape { .. })));
    }

    #[test]
    fn test_beamsplitter_gate_is_unitary_on_low_photon_sector() {
        let cutoff = 3;
        let gate = Gate::beamsplitter(0.4, 0.9, cutoff).unwrap();
        assert_eq!(gate.arity(), 2);
        let product = gate.dagger().matrix().dot(gate.matrix());
        // Inputs |p, q> with p + q < cutoff keep their norm
        for p in 0..cutoff {
            for q in 0..cutoff - p {
                let col = p * cutoff + q;
                assert_relative_eq!(product[[col, col]].re, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_beamsplitter_matrix_layout() {
        let gate = Gate::beamsplitter(0.3, 0.0, 2).unwrap();
        // photon in mode 0: |1,0> column, transmitted to |1,0> row
        assert_relative_eq!(gate.matrix()[[2, 2]].re, 0.3_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(gate.matrix()[[1, 2]].re, 0.3_f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_phase_shifts_compose_additively() {
        let first = Gate::single(ops::phase_shift(0.4, 5)).unwrap();
        let second = Gate::single(ops::phase_shift(0.7, 5)).unwrap();
        let combined = second.after(&first).unwrap();
        let expected = ops::phase_shift(1.1, 5);
        for (got, want) in combined.matrix().iter().zip(expected.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_displacement_undone_by_opposite_phase() {
        let cutoff = 30;
        let (r, phi) = (0.5, 0.3);
        let dm = crate::kets::ket_to_dm(&crate::kets::fock_ket(2, cutoff).unwrap()).into_dyn();
        let forward = Gate::single(ops::displacement(r, phi, cutoff)).unwrap();
        let back =
            Gate::single(ops::displacement(r, phi + std::f64::consts::PI, cutoff)).unwrap();

        let displaced = crate::apply_gate(&forward, &dm, &[0], 1, cutoff).unwrap();
        assert!((displaced[&[2, 2][..]].re - 1.0).abs() > 1e-2);
        let restored = crate::apply_gate(&back, &displaced, &[0], 1, cutoff).unwrap();

        for (got, want) in restored.iter().zip(dm.iter()) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-8);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-8);
        }
    }
}
