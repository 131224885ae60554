//! Experiment: queued state preparations, operations and channels.
//!
//! Devices queue physics while the simulation runs. `execute` builds the
//! vacuum and drains the queues in a fixed order: preparations, then
//! operations, then channels.

use log::{debug, info};
use parking_lot::Mutex;
use qureed_fock::{
    apply_channel, apply_gate, ops, renormalize, FockError, FockResult, FockState, Gate,
};

/// Number-state preparation on each listed mode
#[derive(Debug, Clone, PartialEq)]
pub struct StatePreparation {
    pub photon_number: usize,
    pub modes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedOperation {
    pub gate: Gate,
    pub modes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedChannel {
    pub kraus: Vec<Gate>,
    pub modes: Vec<usize>,
}

#[derive(Debug, Default)]
struct ExperimentInner {
    num_modes: usize,
    cutoff: usize,
    preparations: Vec<StatePreparation>,
    operations: Vec<QueuedOperation>,
    channels: Vec<QueuedChannel>,
    state: Option<FockState>,
}

/// Shared experiment; every method takes `&self` so devices on different
/// threads can queue work concurrently.
#[derive(Debug)]
pub struct Experiment {
    inner: Mutex<ExperimentInner>,
}

fn check_targets(arity: usize, modes: &[usize]) -> FockResult<()> {
    if arity != modes.len() {
        return Err(FockError::ArityMismatch {
            gate: arity,
            targets: modes.len(),
        });
    }
    for (i, m) in modes.iter().enumerate() {
        if modes[..i].contains(m) {
            return Err(FockError::DuplicateMode(*m));
        }
    }
    Ok(())
}

impl Experiment {
    pub fn new(num_modes: usize, cutoff: usize) -> Self {
        Self {
            inner: Mutex::new(ExperimentInner {
                num_modes,
                cutoff,
                ..Default::default()
            }),
        }
    }

    pub fn num_modes(&self) -> usize {
        self.inner.lock().num_modes
    }

    pub fn cutoff(&self) -> usize {
        self.inner.lock().cutoff
    }

    pub fn update_mode_number(&self, num_modes: usize) {
        self.inner.lock().num_modes = num_modes;
    }

    pub fn update_dimensions(&self, cutoff: usize) {
        self.inner.lock().cutoff = cutoff;
    }

    /// Grow the mode count to at least `num_modes`
    pub fn ensure_modes(&self, num_modes: usize) {
        let mut inner = self.inner.lock();
        if num_modes > inner.num_modes {
            debug!(
                target: "qureed::simulation",
                "growing experiment from {} to {} modes", inner.num_modes, num_modes
            );
            inner.num_modes = num_modes;
        }
    }

    /// Drop the last computed state before a new run
    pub fn prepare_experiment(&self) {
        self.inner.lock().state = None;
    }

    /// Queue preparation of `|n>` on each of `modes`
    pub fn state_init(&self, photon_number: usize, modes: &[usize]) -> FockResult<()> {
        let mut inner = self.inner.lock();
        if photon_number >= inner.cutoff {
            return Err(FockError::PhotonNumberOutOfRange {
                n: photon_number,
                cutoff: inner.cutoff,
            });
        }
        inner.preparations.push(StatePreparation {
            photon_number,
            modes: modes.to_vec(),
        });
        Ok(())
    }

    pub fn add_operation(&self, gate: Gate, modes: &[usize]) -> FockResult<()> {
        check_targets(gate.arity(), modes)?;
        self.inner.lock().operations.push(QueuedOperation {
            gate,
            modes: modes.to_vec(),
        });
        Ok(())
    }

    pub fn add_channel(&self, kraus: Vec<Gate>, modes: &[usize]) -> FockResult<()> {
        for op in &kraus {
            check_targets(op.arity(), modes)?;
        }
        self.inner.lock().channels.push(QueuedChannel {
            kraus,
            modes: modes.to_vec(),
        });
        Ok(())
    }

    /// Number of queued preparations, operations and channels
    pub fn pending(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock();
        (
            inner.preparations.len(),
            inner.operations.len(),
            inner.channels.len(),
        )
    }

    /// Build the state from vacuum. Queues are kept so execution is repeatable.
    pub fn execute(&self) -> FockResult<FockState> {
        let mut inner = self.inner.lock();
        let (n, cutoff) = (inner.num_modes, inner.cutoff);
        info!(
            target: "qureed::simulation",
            "executing experiment: {} modes, cutoff {}, {} preparations, {} operations, {} channels",
            n,
            cutoff,
            inner.preparations.len(),
            inner.operations.len(),
            inner.channels.len()
        );

        let mut dm = FockState::vacuum(n, cutoff)?.into_dm();

        for prep in &inner.preparations {
            let gate = Gate::single(ops::fock_operator(prep.photon_number, cutoff)?)?;
            for &mode in &prep.modes {
                dm = apply_gate(&gate, &dm, &[mode], n, cutoff)?;
            }
            dm = renormalize(dm, n, cutoff)?;
        }

        for op in &inner.operations {
            dm = apply_gate(&op.gate, &dm, &op.modes, n, cutoff)?;
            dm = renormalize(dm, n, cutoff)?;
        }

        for channel in &inner.channels {
            dm = apply_channel(&channel.kraus, &dm, &channel.modes, n, cutoff)?;
        }

        let state = FockState::new(dm, n, cutoff)?;
        inner.state = Some(state.clone());
        Ok(state)
    }

    /// State from the last `execute`
    pub fn state(&self) -> Option<FockState> {
        self.inner.lock().state.clone()
    }

    /// Clear all queues and the computed state
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.preparations.clear();
        inner.operations.clear();
        inner.channels.clear();
        inner.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::IxDyn;

    #[test]
    fn test_empty_experiment_is_vacuum() {
        let exp = Experiment::new(2, 3);
        let state = exp.execute().unwrap();
        let probs = state.all_fock_probs().unwrap();
        assert_relative_eq!(probs[IxDyn(&[0, 0])], 1.0);
    }

    #[test]
    fn test_preparations_run_before_operations() {
        let exp = Experiment::new(2, 3);
        // queued before the preparation, applied after it
        exp.add_operation(Gate::beamsplitter(std::f64::consts::FRAC_PI_2, 0.0, 3).unwrap(), &[0, 1])
            .unwrap();
        exp.state_init(1, &[0]).unwrap();
        let state = exp.execute().unwrap();
        assert_relative_eq!(state.mean_photon(1).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.mean_photon(0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_channel_applied_last() {
        let exp = Experiment::new(1, 4);
        exp.state_init(2, &[0]).unwrap();
        let kraus = ops::loss_channel(0.5, 4)
            .unwrap()
            .into_iter()
            .map(Gate::single)
            .collect::<FockResult<Vec<_>>>()
            .unwrap();
        exp.add_channel(kraus, &[0]).unwrap();
        let state = exp.execute().unwrap();
        assert_relative_eq!(state.mean_photon(0).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.trace().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_execute_is_repeatable_until_reset() {
        let exp = Experiment::new(1, 3);
        exp.state_init(1, &[0]).unwrap();
        let first = exp.execute().unwrap();
        let second = exp.execute().unwrap();
        assert_eq!(first, second);
        assert_eq!(exp.pending(), (1, 0, 0));
        exp.reset();
        assert!(exp.state().is_none());
        assert_eq!(exp.pending(), (0, 0, 0));
    }

    #[test]
    fn test_queue_validation() {
        let exp = Experiment::new(2, 3);
        assert!(matches!(
            exp.state_init(3, &[0]),
            Err(FockError::PhotonNumberOutOfRange { n: 3, cutoff: 3 })
        ));
        let bs = Gate::beamsplitter(0.2, 0.0, 3).unwrap();
        assert!(matches!(
            exp.add_operation(bs.clone(), &[0]),
            Err(FockError::ArityMismatch { gate: 2, targets: 1 })
        ));
        assert!(matches!(exp.add_operation(bs, &[1, 1]), Err(FockError::DuplicateMode(1))));
    }

    #[test]
    fn test_out_of_range_mode_fails_at_execute() {
        let exp = Experiment::new(1, 3);
        exp.state_init(1, &[2]).unwrap();
        assert!(matches!(exp.execute(), Err(FockError::ModeOutOfRange { mode: 2, .. })));
        exp.ensure_modes(3);
        assert_eq!(exp.num_modes(), 3);
        assert!(exp.execute().is_ok());
    }
}
