use log::debug;
use num_complex::Complex64;
use qureed_fock::{ops, FockResult, FockState, Gate};
use std::sync::Arc;

use super::Backend;
use crate::experiment::Experiment;

/// Backend that queues everything on an [`Experiment`] and builds the Fock
/// state when executed.
#[derive(Debug, Clone)]
pub struct FockBackendFirst {
    experiment: Arc<Experiment>,
}

impl FockBackendFirst {
    pub fn new(experiment: Arc<Experiment>) -> Self {
        Self { experiment }
    }

    pub fn experiment(&self) -> &Arc<Experiment> {
        &self.experiment
    }
}

impl Backend for FockBackendFirst {
    fn name(&self) -> &'static str {
        "fock_first"
    }

    fn set_number_of_modes(&self, num_modes: usize) {
        self.experiment.update_mode_number(num_modes);
    }

    fn set_dimensions(&self, cutoff: usize) {
        self.experiment.update_dimensions(cutoff);
    }

    fn ensure_modes(&self, num_modes: usize) {
        self.experiment.ensure_modes(num_modes);
    }

    fn initialize(&self) {
        debug!(
            target: "qureed::simulation",
            "initialising backend with {} modes, cutoff {}",
            self.experiment.num_modes(),
            self.experiment.cutoff()
        );
        self.experiment.prepare_experiment();
    }

    fn cutoff(&self) -> usize {
        self.experiment.cutoff()
    }

    fn create(&self) -> FockResult<Gate> {
        Gate::single(ops::creation(self.cutoff()))
    }

    fn destroy(&self) -> FockResult<Gate> {
        Gate::single(ops::annihilation(self.cutoff()))
    }

    fn number(&self) -> FockResult<Gate> {
        Gate::single(ops::number(self.cutoff()))
    }

    fn squeeze(&self, z: Complex64) -> FockResult<Gate> {
        let (r, theta) = z.to_polar();
        Gate::single(ops::squeezing(r, theta, self.cutoff()))
    }

    fn displace(&self, alpha: Complex64) -> FockResult<Gate> {
        let (r, phi) = alpha.to_polar();
        Gate::single(ops::displacement(r, phi, self.cutoff()))
    }

    fn phase_shift(&self, theta: f64) -> FockResult<Gate> {
        Gate::single(ops::phase_shift(theta, self.cutoff()))
    }

    fn kerr(&self, kappa: f64) -> FockResult<Gate> {
        Gate::single(ops::kerr(kappa, self.cutoff()))
    }

    fn beam_splitter(&self, theta: f64, phi: f64) -> FockResult<Gate> {
        Gate::beamsplitter(theta, phi, self.cutoff())
    }

    fn loss(&self, transmission: f64) -> FockResult<Vec<Gate>> {
        ops::loss_channel(transmission, self.cutoff())?
            .into_iter()
            .map(Gate::single)
            .collect()
    }

    fn apply_operator(&self, gate: Gate, modes: &[usize]) -> FockResult<()> {
        self.experiment.add_operation(gate, modes)
    }

    fn apply_channel(&self, kraus: Vec<Gate>, modes: &[usize]) -> FockResult<()> {
        self.experiment.add_channel(kraus, modes)
    }

    fn initialize_number_state(&self, photon_number: usize, mode: usize) -> FockResult<()> {
        self.experiment.state_init(photon_number, &[mode])
    }

    fn execute(&self) -> FockResult<FockState> {
        self.experiment.execute()
    }

    fn state(&self) -> Option<FockState> {
        self.experiment.state()
    }
}
