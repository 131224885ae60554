//! Index-isolating contractions on interleaved density matrices.

use ndarray::{Array2, Array3, ArrayD, Axis, IxDyn};
use num_complex::Complex64;

use crate::{check_cutoff, check_modes, FockError, FockResult, Gate, ZERO_TRACE_TOLERANCE};

fn check_dm(dm: &ArrayD<Complex64>, num_modes: usize, cutoff: usize) -> FockResult<()> {
    check_cutoff(cutoff)?;
    let expected = vec![cutoff; 2 * num_modes];
    if dm.shape() != expected.as_slice() {
        return Err(FockError::Shape {
            expected,
            actual: dm.shape().to_vec(),
        });
    }
    Ok(())
}

/// Axis order placing untouched mode pairs first, then the targeted kets,
/// then the targeted bras.
fn isolating_permutation(modes: &[usize], num_modes: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..num_modes)
        .filter(|m| !modes.contains(m))
        .flat_map(|m| [2 * m, 2 * m + 1])
        .collect();
    perm.extend(modes.iter().map(|&m| 2 * m));
    perm.extend(modes.iter().map(|&m| 2 * m + 1));
    perm
}

fn inverse(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

/// Apply `G rho G^dagger` with `G` acting on `modes` (in gate order)
pub fn apply_gate(
    gate: &Gate,
    dm: &ArrayD<Complex64>,
    modes: &[usize],
    num_modes: usize,
    cutoff: usize,
) -> FockResult<ArrayD<Complex64>> {
    check_dm(dm, num_modes, cutoff)?;
    check_modes(modes, num_modes)?;
    if gate.arity() != modes.len() {
        return Err(FockError::ArityMismatch {
            gate: gate.arity(),
            targets: modes.len(),
        });
    }
    if gate.cutoff() != cutoff {
        return Err(FockError::Shape {
            expected: vec![cutoff],
            actual: vec![gate.cutoff()],
        });
    }
    log::trace!(target: "qureed::fock", "applying {}-mode gate on {:?}", gate.arity(), modes);

    let perm = isolating_permutation(modes, num_modes);
    let target_dim = gate.dim();
    let rest = cutoff.pow(2 * (num_modes - modes.len()) as u32);

    let mut blocks: Array3<Complex64> = dm
        .view()
        .permuted_axes(perm.as_slice())
        .as_standard_layout()
        .into_owned()
        .into_shape((rest, target_dim, target_dim))?;

    let g = gate.matrix();
    let g_dag = gate.dagger();
    for mut block in blocks.axis_iter_mut(Axis(0)) {
        let updated = g.dot(&block).dot(g_dag.matrix());
        block.assign(&updated);
    }

    let permuted = blocks.into_shape(IxDyn(&vec![cutoff; 2 * num_modes]))?;
    Ok(permuted
        .permuted_axes(inverse(&perm).as_slice())
        .as_standard_layout()
        .into_owned())
}

/// Apply a channel given by its Kraus operators: `sum_k E_k rho E_k^dagger`
pub fn apply_channel(
    kraus: &[Gate],
    dm: &ArrayD<Complex64>,
    modes: &[usize],
    num_modes: usize,
    cutoff: usize,
) -> FockResult<ArrayD<Complex64>> {
    check_dm(dm, num_modes, cutoff)?;
    let mut out = ArrayD::zeros(dm.raw_dim());
    for op in kraus {
        out = out + apply_gate(op, dm, modes, num_modes, cutoff)?;
    }
    Ok(out)
}

/// Flatten to a `(D^n, D^n)` matrix with kets on rows and bras on columns
pub fn dm_to_matrix(
    dm: &ArrayD<Complex64>,
    num_modes: usize,
    cutoff: usize,
) -> FockResult<Array2<Complex64>> {
    check_dm(dm, num_modes, cutoff)?;
    let perm: Vec<usize> = (0..2 * num_modes)
        .step_by(2)
        .chain((1..2 * num_modes).step_by(2))
        .collect();
    let dim = cutoff.pow(num_modes as u32);
    Ok(dm
        .view()
        .permuted_axes(perm.as_slice())
        .as_standard_layout()
        .into_owned()
        .into_shape((dim, dim))?)
}

/// Full trace of the density matrix
pub fn trace(dm: &ArrayD<Complex64>, num_modes: usize, cutoff: usize) -> FockResult<Complex64> {
    Ok(dm_to_matrix(dm, num_modes, cutoff)?.diag().sum())
}

/// Divide by the trace so the state is normalised
pub fn renormalize(
    dm: ArrayD<Complex64>,
    num_modes: usize,
    cutoff: usize,
) -> FockResult<ArrayD<Complex64>> {
    let tr = trace(&dm, num_modes, cutoff)?;
    if tr.norm() < ZERO_TRACE_TOLERANCE {
        return Err(FockError::ZeroTrace(tr.norm()));
    }
    Ok(dm / tr)
}

/// Trace out every mode not listed in `keep`.
///
/// The result has interleaved axes for the kept modes in the order given.
pub fn reduced_dm(
    dm: &ArrayD<Complex64>,
    keep: &[usize],
    num_modes: usize,
    cutoff: usize,
) -> FockResult<ArrayD<Complex64>> {
    check_dm(dm, num_modes, cutoff)?;
    check_modes(keep, num_modes)?;

    let traced: Vec<usize> = (0..num_modes).filter(|m| !keep.contains(m)).collect();
    let mut perm: Vec<usize> = keep.iter().flat_map(|&m| [2 * m, 2 * m + 1]).collect();
    perm.extend(traced.iter().map(|&m| 2 * m));
    perm.extend(traced.iter().map(|&m| 2 * m + 1));

    let kept_dim = cutoff.pow(2 * keep.len() as u32);
    let traced_dim = cutoff.pow(traced.len() as u32);
    let blocks: Array3<Complex64> = dm
        .view()
        .permuted_axes(perm.as_slice())
        .as_standard_layout()
        .into_owned()
        .into_shape((kept_dim, traced_dim, traced_dim))?;

    let reduced = ndarray::Array1::from_iter(
        blocks
            .axis_iter(Axis(0))
            .map(|block| block.diag().sum()),
    );
    Ok(reduced.into_shape(IxDyn(&vec![cutoff; 2 * keep.len()]))?)
}

/// Trace out everything but `mode`, returning a `(D, D)` matrix
pub fn reduced_dm_single(
    dm: &ArrayD<Complex64>,
    mode: usize,
    num_modes: usize,
    cutoff: usize,
) -> FockResult<Array2<Complex64>> {
    Ok(reduced_dm(dm, &[mode], num_modes, cutoff)?.into_shape((cutoff, cutoff))?)
}

/// Probabilities of every number-basis pattern, shape `[D; n]`
pub fn all_fock_probs(
    dm: &ArrayD<Complex64>,
    num_modes: usize,
    cutoff: usize,
) -> FockResult<ArrayD<f64>> {
    let probs = dm_to_matrix(dm, num_modes, cutoff)?.diag().mapv(|z| z.re);
    Ok(probs.into_shape(IxDyn(&vec![cutoff; num_modes]))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kets, ops};
    use approx::assert_relative_eq;

    fn photon_pair(cutoff: usize) -> ArrayD<Complex64> {
        let one = kets::ket_to_dm(&kets::fock_ket(1, cutoff).unwrap());
        kets::product_dm(&[one.clone(), one]).unwrap()
    }

    #[test]
    fn test_single_mode_gate_matches_dense_product() {
        let cutoff = 4;
        let dm = kets::vacuum_dm(1, cutoff).unwrap();
        let d = ops::displacement(0.7, 0.1, cutoff);
        let gate = Gate::single(d.clone()).unwrap();
        let out = apply_gate(&gate, &dm, &[0], 1, cutoff).unwrap();
        let dense = d.dot(&Array2::from_shape_fn((cutoff, cutoff), |(i, j)| {
            dm[IxDyn(&[i, j])]
        }))
        .dot(&ops::dagger(&d));
        for i in 0..cutoff {
            for j in 0..cutoff {
                assert_relative_eq!((out[IxDyn(&[i, j])] - dense[[i, j]]).norm(), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_gate_on_second_mode_leaves_first_alone() {
        let cutoff = 3;
        let dm = kets::vacuum_dm(2, cutoff).unwrap();
        let gate = Gate::single(ops::fock_operator(2, cutoff).unwrap()).unwrap();
        let out = apply_gate(&gate, &dm, &[1], 2, cutoff).unwrap();
        assert_relative_eq!(out[IxDyn(&[0, 0, 2, 2])].re, 1.0, epsilon = 1e-12);
        let probs = all_fock_probs(&out, 2, cutoff).unwrap();
        assert_relative_eq!(probs[IxDyn(&[0, 2])], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hong_ou_mandel_dip() {
        let cutoff = 3;
        let gate = Gate::beamsplitter(std::f64::consts::FRAC_PI_4, 0.0, cutoff).unwrap();
        let out = apply_gate(&gate, &photon_pair(cutoff), &[0, 1], 2, cutoff).unwrap();
        let probs = all_fock_probs(&out, 2, cutoff).unwrap();
        assert_relative_eq!(probs[IxDyn(&[1, 1])], 0.0, epsilon = 1e-12);
        assert_relative_eq!(probs[IxDyn(&[2, 0])], 0.5, epsilon = 1e-12);
        assert_relative_eq!(probs[IxDyn(&[0, 2])], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_gate_modes_follow_target_order() {
        let cutoff = 2;
        let one = kets::ket_to_dm(&kets::fock_ket(1, cutoff).unwrap());
        let zero = kets::ket_to_dm(&kets::fock_ket(0, cutoff).unwrap());
        let dm = kets::product_dm(&[one, zero]).unwrap();
        let gate = Gate::beamsplitter(std::f64::consts::FRAC_PI_2, 0.0, cutoff).unwrap();

        let forward = apply_gate(&gate, &dm, &[0, 1], 2, cutoff).unwrap();
        let swapped = apply_gate(&gate, &dm, &[1, 0], 2, cutoff).unwrap();
        let pf = all_fock_probs(&forward, 2, cutoff).unwrap();
        let ps = all_fock_probs(&swapped, 2, cutoff).unwrap();
        assert_relative_eq!(pf[IxDyn(&[0, 1])], 1.0, epsilon = 1e-12);
        assert_relative_eq!(ps[IxDyn(&[0, 1])], 1.0, epsilon = 1e-12);
        assert_relative_eq!(pf[IxDyn(&[1, 0])], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reduced_dm_of_product_state() {
        let cutoff = 3;
        let one = kets::ket_to_dm(&kets::fock_ket(1, cutoff).unwrap());
        let two = kets::ket_to_dm(&kets::fock_ket(2, cutoff).unwrap());
        let dm = kets::product_dm(&[one, two.clone()]).unwrap();
        let reduced = reduced_dm_single(&dm, 1, 2, cutoff).unwrap();
        assert_eq!(reduced, two);
        let both = reduced_dm(&dm, &[1, 0], 2, cutoff).unwrap();
        assert_relative_eq!(both[IxDyn(&[2, 2, 1, 1])].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validation_errors() {
        let dm = kets::vacuum_dm(2, 3).unwrap();
        let gate = Gate::single(ops::number(3)).unwrap();
        assert!(matches!(
            apply_gate(&gate, &dm, &[2], 2, 3),
            Err(FockError::ModeOutOfRange { mode: 2, num_modes: 2 })
        ));
        assert!(matches!(
            apply_gate(&gate, &dm, &[0, 1], 2, 3),
            Err(FockError::ArityMismatch { gate: 1, targets: 2 })
        ));
        let bs = Gate::beamsplitter(0.1, 0.0, 3).unwrap();
        assert!(matches!(
            apply_gate(&bs, &dm, &[1, 1], 2, 3),
            Err(FockError::DuplicateMode(1))
        ));
        assert!(matches!(
            apply_gate(&gate, &dm, &[0], 3, 3),
            Err(FockError::Shape { .. })
        ));
    }

    #[test]
    fn test_renormalize_rejects_zero_trace() {
        let dm = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(matches!(renormalize(dm, 1, 2), Err(FockError::ZeroTrace(_))));
    }

    #[test]
    fn test_loss_channel_scales_mean_photon() {
        let cutoff = 4;
        let dm = kets::vacuum_dm(1, cutoff).unwrap();
        let prep = Gate::single(ops::fock_operator(2, cutoff).unwrap()).unwrap();
        let dm = apply_gate(&prep, &dm, &[0], 1, cutoff).unwrap();
        let kraus: Vec<Gate> = ops::loss_channel(0.25, cutoff)
            .unwrap()
            .into_iter()
            .map(Gate::single)
            .collect::<FockResult<_>>()
            .unwrap();
        let out = apply_channel(&kraus, &dm, &[0], 1, cutoff).unwrap();
        assert_relative_eq!(trace(&out, 1, cutoff).unwrap().re, 1.0, epsilon = 1e-12);
        let probs = all_fock_probs(&out, 1, cutoff).unwrap();
        let mean: f64 = probs.iter().enumerate().map(|(n, p)| n as f64 * p).sum();
        assert_relative_eq!(mean, 0.5, epsilon = 1e-12);
    }
}
