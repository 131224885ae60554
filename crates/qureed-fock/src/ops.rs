//! Operator builders in the truncated number basis.
//!
//! Displacement, squeezing and beamsplitter matrix elements are filled by the
//! two-term recurrences of Miatto & Quesada, "Fast optimization of parametrized
//! quantum optical circuits" (Quantum 4, 366, 2020). Each element depends only
//! on neighbours already computed, which keeps every entry numerically stable
//! without evaluating Laguerre polynomials.

use ndarray::{Array2, Array4};
use num_complex::Complex64;

use crate::{FockError, FockResult, Operator, I};

fn sqrt_table(cutoff: usize) -> Vec<f64> {
    (0..cutoff).map(|n| (n as f64).sqrt()).collect()
}

/// Annihilation operator `a` with `sqrt(n)` on the first super-diagonal
pub fn annihilation(cutoff: usize) -> Operator {
    let mut a = Array2::zeros((cutoff, cutoff));
    for n in 1..cutoff {
        a[[n - 1, n]] = Complex64::new((n as f64).sqrt(), 0.0);
    }
    a
}

/// Creation operator `a^dagger`
pub fn creation(cutoff: usize) -> Operator {
    dagger(&annihilation(cutoff))
}

/// Number operator `a^dagger a`
pub fn number(cutoff: usize) -> Operator {
    Array2::from_diag(&ndarray::Array1::from_iter(
        (0..cutoff).map(|n| Complex64::new(n as f64, 0.0)),
    ))
}

/// Identity on one mode
pub fn identity(cutoff: usize) -> Operator {
    Array2::eye(cutoff)
}

/// Conjugate transpose
pub fn dagger(op: &Operator) -> Operator {
    op.t().mapv(|z| z.conj())
}

/// Displacement `D(alpha)` with `alpha = r e^{i phi}`
pub fn displacement(r: f64, phi: f64, cutoff: usize) -> Operator {
    let mut d = Array2::zeros((cutoff, cutoff));
    if cutoff == 0 {
        return d;
    }
    let sqrt = sqrt_table(cutoff);
    let alpha = Complex64::from_polar(r, phi);

    d[[0, 0]] = Complex64::new((-(r * r) / 2.0).exp(), 0.0);

    for row in 1..cutoff {
        d[[row, 0]] = alpha / sqrt[row] * d[[row - 1, 0]];
    }

    for row in 0..cutoff {
        for col in 1..cutoff {
            let mut value = -alpha.conj() / sqrt[col] * d[[row, col - 1]];
            if row > 0 {
                value += sqrt[row] / sqrt[col] * d[[row - 1, col - 1]];
            }
            d[[row, col]] = value;
        }
    }
    d
}

/// Single-mode squeezing `S(z)` with `z = r e^{i theta}`
pub fn squeezing(r: f64, theta: f64, cutoff: usize) -> Operator {
    let mut s = Array2::zeros((cutoff, cutoff));
    if cutoff == 0 {
        return s;
    }
    let sqrt = sqrt_table(cutoff);
    let sech = 1.0 / r.cosh();
    let tanh = Complex64::from_polar(r.tanh(), theta);

    s[[0, 0]] = Complex64::new(sech.sqrt(), 0.0);

    for m in (2..cutoff).step_by(2) {
        s[[m, 0]] = sqrt[m - 1] / sqrt[m] * -tanh * s[[m - 2, 0]];
    }

    for m in 0..cutoff {
        for n in 1..cutoff {
            if (m + n) % 2 != 0 {
                continue;
            }
            let mut value = Complex64::new(0.0, 0.0);
            if m > 0 {
                value += sqrt[m] * sech * s[[m - 1, n - 1]];
            }
            if n > 1 {
                value += sqrt[n - 1] * tanh.conj() * s[[m, n - 2]];
            }
            s[[m, n]] = value / sqrt[n];
        }
    }
    s
}

/// Two-mode beamsplitter tensor `B[m, n, p, q] = <m, n| U |p, q>`.
///
/// `theta` is the mixing angle (transmissivity `cos^2 theta`) and `phi` the
/// reflection phase. Use [`crate::Gate::beamsplitter`] to obtain the gate in
/// the `(out, in, out, in)` axis convention.
pub fn beamsplitter(theta: f64, phi: f64, cutoff: usize) -> Array4<Complex64> {
    let mut b = Array4::zeros((cutoff, cutoff, cutoff, cutoff));
    if cutoff == 0 {
        return b;
    }
    let sqrt = sqrt_table(cutoff);
    let cos = Complex64::new(theta.cos(), 0.0);
    let sin = Complex64::from_polar(theta.sin(), phi);

    // Only the off-diagonal blocks of the 4x4 mixing matrix enter the recurrence.
    let v02 = cos;
    let v12 = sin;
    let v03 = -sin.conj();
    let v13 = cos;

    b[[0, 0, 0, 0]] = Complex64::new(1.0, 0.0);

    for m in 0..cutoff {
        for n in 0..cutoff - m {
            let p = m + n;
            if p == 0 || p >= cutoff {
                continue;
            }
            let mut value = Complex64::new(0.0, 0.0);
            if m > 0 {
                value += v02 * sqrt[m] * b[[m - 1, n, p - 1, 0]];
            }
            if n > 0 {
                value += v12 * sqrt[n] * b[[m, n - 1, p - 1, 0]];
            }
            b[[m, n, p, 0]] = value / sqrt[p];
        }
    }

    for m in 0..cutoff {
        for n in 0..cutoff {
            for p in 0..cutoff {
                let total = m + n;
                if total <= p || total - p >= cutoff {
                    continue;
                }
                let q = total - p;
                let mut value = Complex64::new(0.0, 0.0);
                if m > 0 {
                    value += v03 * sqrt[m] * b[[m - 1, n, p, q - 1]];
                }
                if n > 0 {
                    value += v13 * sqrt[n] * b[[m, n - 1, p, q - 1]];
                }
                b[[m, n, p, q]] = value / sqrt[q];
            }
        }
    }
    b
}

/// Phase rotation `exp(i theta n)`
pub fn phase_shift(theta: f64, cutoff: usize) -> Operator {
    Array2::from_diag(&ndarray::Array1::from_iter(
        (0..cutoff).map(|n| (I * theta * n as f64).exp()),
    ))
}

/// Kerr interaction `exp(i kappa n^2)`
pub fn kerr(kappa: f64, cutoff: usize) -> Operator {
    Array2::from_diag(&ndarray::Array1::from_iter(
        (0..cutoff).map(|n| (I * kappa * (n * n) as f64).exp()),
    ))
}

/// `(a^dagger)^n / sqrt(n!)`, mapping the vacuum onto `|n>`
pub fn fock_operator(n: usize, cutoff: usize) -> FockResult<Operator> {
    if n >= cutoff {
        return Err(FockError::PhotonNumberOutOfRange { n, cutoff });
    }
    let create = creation(cutoff);
    let mut op = identity(cutoff);
    let mut factorial = 1.0_f64;
    for k in 1..=n {
        op = create.dot(&op);
        factorial *= k as f64;
    }
    Ok(op / Complex64::new(factorial.sqrt(), 0.0))
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Kraus operators of a pure-loss channel with transmissivity `transmission`.
///
/// `E_k = sum_n sqrt(C(n, k)) T^((n - k) / 2) (1 - T)^(k / 2) |n - k><n|`
/// for `k = 0..cutoff`.
pub fn loss_channel(transmission: f64, cutoff: usize) -> FockResult<Vec<Operator>> {
    if !(0.0..=1.0).contains(&transmission) {
        return Err(FockError::InvalidParameter {
            name: "transmission",
            value: transmission,
        });
    }
    let kraus = (0..cutoff)
        .map(|k| {
            let mut e = Array2::zeros((cutoff, cutoff));
            for n in k..cutoff {
                let amplitude = binomial(n, k).sqrt()
                    * transmission.powf((n - k) as f64 / 2.0)
                    * (1.0 - transmission).powf(k as f64 / 2.0);
                e[[n - k, n]] = Complex64::new(amplitude, 0.0);
            }
            e
        })
        .collect();
    Ok(kraus)
}
