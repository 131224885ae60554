//! Elementary states in the number basis.

use ndarray::{Array1, Array2, ArrayD, IxDyn};
use num_complex::Complex64;

use crate::{check_cutoff, FockError, FockResult};

/// Number state `|n>`
pub fn fock_ket(n: usize, cutoff: usize) -> FockResult<Array1<Complex64>> {
    if n >= cutoff {
        return Err(FockError::PhotonNumberOutOfRange { n, cutoff });
    }
    let mut ket = Array1::zeros(cutoff);
    ket[n] = Complex64::new(1.0, 0.0);
    Ok(ket)
}

/// Truncated coherent state `|alpha>` with `alpha = r e^{i phi}`.
/// Not renormalised after truncation.
pub fn coherent_ket(r: f64, phi: f64, cutoff: usize) -> Array1<Complex64> {
    let alpha = Complex64::from_polar(r, phi);
    let mut ket = Array1::zeros(cutoff);
    let mut term = Complex64::new((-(r * r) / 2.0).exp(), 0.0);
    for n in 0..cutoff {
        if n > 0 {
            term = term * alpha / (n as f64).sqrt();
        }
        ket[n] = term;
    }
    ket
}

/// `|psi><psi|`
pub fn ket_to_dm(ket: &Array1<Complex64>) -> Array2<Complex64> {
    let n = ket.len();
    Array2::from_shape_fn((n, n), |(i, j)| ket[i] * ket[j].conj())
}

/// Multi-mode vacuum density matrix with interleaved axes
pub fn vacuum_dm(num_modes: usize, cutoff: usize) -> FockResult<ArrayD<Complex64>> {
    check_cutoff(cutoff)?;
    let mut dm = ArrayD::zeros(IxDyn(&vec![cutoff; 2 * num_modes]));
    dm[IxDyn(&vec![0; 2 * num_modes])] = Complex64::new(1.0, 0.0);
    Ok(dm)
}

/// Tensor product of single-mode density matrices, interleaved in the given order
pub fn product_dm(factors: &[Array2<Complex64>]) -> FockResult<ArrayD<Complex64>> {
    let cutoff = factors.first().map(|f| f.nrows()).unwrap_or(1);
    check_cutoff(cutoff)?;
    for f in factors {
        if f.shape() != [cutoff, cutoff] {
            return Err(FockError::Shape {
                expected: vec![cutoff, cutoff],
                actual: f.shape().to_vec(),
            });
        }
    }
    let shape = vec![cutoff; 2 * factors.len()];
    Ok(ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
        factors
            .iter()
            .enumerate()
            .fold(Complex64::new(1.0, 0.0), |acc, (m, f)| {
                acc * f[[idx[2 * m], idx[2 * m + 1]]]
            })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coherent_ket_norm_approaches_one() {
        let ket = coherent_ket(1.0, 0.5, 25);
        let norm: f64 = ket.iter().map(|z| z.norm_sqr()).sum();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_vacuum_dm_shape() {
        let dm = vacuum_dm(2, 3).unwrap();
        assert_eq!(dm.shape(), &[3, 3, 3, 3]);
        assert_eq!(dm[IxDyn(&[0, 0, 0, 0])], Complex64::new(1.0, 0.0));
        assert!(vacuum_dm(1, 0).is_err());
    }

    #[test]
    fn test_product_dm_places_factors_on_interleaved_axes() {
        let one = ket_to_dm(&fock_ket(1, 3).unwrap());
        let zero = ket_to_dm(&fock_ket(0, 3).unwrap());
        let dm = product_dm(&[one, zero]).unwrap();
        assert_eq!(dm[IxDyn(&[1, 1, 0, 0])], Complex64::new(1.0, 0.0));
        assert_eq!(dm[IxDyn(&[0, 0, 1, 1])], Complex64::new(0.0, 0.0));
    }
}
