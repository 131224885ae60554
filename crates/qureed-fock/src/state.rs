//! Immutable multi-mode Fock state.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use num_complex::Complex64;

use crate::{contract, kets, FockError, FockResult};

/// A density matrix over `num_modes` modes truncated at `cutoff` photons per mode
#[derive(Debug, Clone, PartialEq)]
pub struct FockState {
    data: ArrayD<Complex64>,
    num_modes: usize,
    cutoff: usize,
}

impl FockState {
    /// Wrap an interleaved density matrix, validating its shape
    pub fn new(data: ArrayD<Complex64>, num_modes: usize, cutoff: usize) -> FockResult<Self> {
        let expected = vec![cutoff; 2 * num_modes];
        if cutoff == 0 {
            return Err(FockError::InvalidCutoff(cutoff));
        }
        if data.shape() != expected.as_slice() {
            return Err(FockError::Shape {
                expected,
                actual: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            num_modes,
            cutoff,
        })
    }

    pub fn vacuum(num_modes: usize, cutoff: usize) -> FockResult<Self> {
        Self::new(kets::vacuum_dm(num_modes, cutoff)?, num_modes, cutoff)
    }

    pub fn num_modes(&self) -> usize {
        self.num_modes
    }

    pub fn cutoff_dim(&self) -> usize {
        self.cutoff
    }

    /// Interleaved density matrix
    pub fn dm(&self) -> &ArrayD<Complex64> {
        &self.data
    }

    pub fn into_dm(self) -> ArrayD<Complex64> {
        self.data
    }

    /// `(D^n, D^n)` matrix view of the state
    pub fn matrix(&self) -> FockResult<Array2<Complex64>> {
        contract::dm_to_matrix(&self.data, self.num_modes, self.cutoff)
    }

    pub fn trace(&self) -> FockResult<f64> {
        Ok(contract::trace(&self.data, self.num_modes, self.cutoff)?.re)
    }

    /// `Tr(rho^2)`
    pub fn purity(&self) -> FockResult<f64> {
        let m = self.matrix()?;
        Ok(m.iter().map(|z| z.norm_sqr()).sum())
    }

    pub fn all_fock_probs(&self) -> FockResult<ArrayD<f64>> {
        contract::all_fock_probs(&self.data, self.num_modes, self.cutoff)
    }

    /// Probability of one occupation pattern, one entry per mode
    pub fn fock_prob(&self, pattern: &[usize]) -> FockResult<f64> {
        if pattern.len() != self.num_modes {
            return Err(FockError::Shape {
                expected: vec![self.num_modes],
                actual: vec![pattern.len()],
            });
        }
        if let Some(&n) = pattern.iter().find(|&&n| n >= self.cutoff) {
            return Err(FockError::PhotonNumberOutOfRange {
                n,
                cutoff: self.cutoff,
            });
        }
        let index: Vec<usize> = pattern.iter().flat_map(|&n| [n, n]).collect();
        Ok(self.data[IxDyn(&index)].re)
    }

    pub fn reduced_dm(&self, modes: &[usize]) -> FockResult<ArrayD<Complex64>> {
        contract::reduced_dm(&self.data, modes, self.num_modes, self.cutoff)
    }

    /// `<n>` of one mode
    pub fn mean_photon(&self, mode: usize) -> FockResult<f64> {
        let reduced = contract::reduced_dm_single(&self.data, mode, self.num_modes, self.cutoff)?;
        Ok(reduced
            .diag()
            .iter()
            .enumerate()
            .map(|(n, p)| n as f64 * p.re)
            .sum())
    }

    /// Probability of finding every mode empty
    pub fn fidelity_vacuum(&self) -> f64 {
        self.data[IxDyn(&vec![0; 2 * self.num_modes])].re
    }

    /// `<psi| rho |psi>` for a pure state given as a flattened ket of length `D^n`
    pub fn fidelity_pure(&self, ket: &Array1<Complex64>) -> FockResult<f64> {
        let m = self.matrix()?;
        if ket.len() != m.nrows() {
            return Err(FockError::Shape {
                expected: vec![m.nrows()],
                actual: vec![ket.len()],
            });
        }
        let bra = ket.mapv(|z| z.conj());
        Ok(bra.dot(&m.dot(ket)).re)
    }

    /// Uhlmann fidelity `(Tr sqrt(sqrt(rho) sigma sqrt(rho)))^2` between two mixed states
    pub fn fidelity(&self, other: &FockState) -> FockResult<f64> {
        if self.num_modes != other.num_modes || self.cutoff != other.cutoff {
            return Err(FockError::Shape {
                expected: vec![self.num_modes, self.cutoff],
                actual: vec![other.num_modes, other.cutoff],
            });
        }
        let rho = to_nalgebra(&self.matrix()?);
        let sigma = to_nalgebra(&other.matrix()?);
        let sqrt_rho = hermitian_sqrt(rho);
        let inner = &sqrt_rho * sigma * &sqrt_rho;
        let eigen = SymmetricEigen::new(hermitize(inner));
        let root_sum: f64 = eigen.eigenvalues.iter().map(|&l| l.max(0.0).sqrt()).sum();
        Ok(root_sum * root_sum)
    }
}

fn to_nalgebra(m: &Array2<Complex64>) -> DMatrix<Complex64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]])
}

/// Remove the anti-Hermitian rounding residue before eigendecomposition
fn hermitize(m: DMatrix<Complex64>) -> DMatrix<Complex64> {
    (&m + m.adjoint()) * Complex64::new(0.5, 0.0)
}

fn hermitian_sqrt(m: DMatrix<Complex64>) -> DMatrix<Complex64> {
    let eigen = SymmetricEigen::new(hermitize(m));
    let roots = eigen
        .eigenvalues
        .map(|l| Complex64::new(l.max(0.0).sqrt(), 0.0));
    &eigen.eigenvectors * DMatrix::from_diagonal(&roots) * eigen.eigenvectors.adjoint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply_gate, ops, Gate};
    use approx::assert_relative_eq;

    fn prepared(n: usize, cutoff: usize) -> FockState {
        let vac = kets::vacuum_dm(1, cutoff).unwrap();
        let gate = Gate::single(ops::fock_operator(n, cutoff).unwrap()).unwrap();
        FockState::new(apply_gate(&gate, &vac, &[0], 1, cutoff).unwrap(), 1, cutoff).unwrap()
    }

    #[test]
    fn test_vacuum_probabilities() {
        let state = FockState::vacuum(2, 4).unwrap();
        let probs = state.all_fock_probs().unwrap();
        assert_relative_eq!(probs[IxDyn(&[0, 0])], 1.0);
        assert_relative_eq!(probs.sum(), 1.0);
        assert_relative_eq!(state.fidelity_vacuum(), 1.0);
        assert_relative_eq!(state.purity().unwrap(), 1.0);
    }

    #[test]
    fn test_mean_photon_of_number_state() {
        let state = prepared(3, 5);
        assert_relative_eq!(state.mean_photon(0).unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(state.fock_prob(&[3]).unwrap(), 1.0, epsilon = 1e-12);
        assert!(state.fock_prob(&[5]).is_err());
    }

    #[test]
    fn test_fidelity_pure_against_coherent_ket() {
        let cutoff = 15;
        let vac = kets::vacuum_dm(1, cutoff).unwrap();
        let gate = Gate::single(ops::displacement(0.6, 1.2, cutoff)).unwrap();
        let state = FockState::new(apply_gate(&gate, &vac, &[0], 1, cutoff).unwrap(), 1, cutoff).unwrap();
        let ket = kets::coherent_ket(0.6, 1.2, cutoff);
        assert_relative_eq!(state.fidelity_pure(&ket).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mixed_fidelity() {
        let one = prepared(1, 3);
        let zero = FockState::vacuum(1, 3).unwrap();
        assert_relative_eq!(one.fidelity(&one).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(one.fidelity(&zero).unwrap(), 0.0, epsilon = 1e-9);

        let mixture = (one.dm() + zero.dm()) / Complex64::new(2.0, 0.0);
        let mixed = FockState::new(mixture, 1, 3).unwrap();
        assert_relative_eq!(mixed.fidelity(&zero).unwrap(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(mixed.purity().unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        let data = ArrayD::zeros(IxDyn(&[3, 3]));
        assert!(matches!(FockState::new(data, 2, 3), Err(FockError::Shape { .. })));
    }
}
