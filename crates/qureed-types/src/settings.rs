//! Simulation settings types.

use serde::{Deserialize, Serialize};

/// Representation the simulation tracks quantum state in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationType {
    /// Truncated Fock-basis density matrix
    #[default]
    Fock,
    /// Gaussian (covariance) representation, no numerical backend attached
    Gaussian,
}

impl SimulationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationType::Fock => "fock",
            SimulationType::Gaussian => "gaussian",
        }
    }
}

/// How a run is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Time-ordered discrete-event simulation
    #[default]
    Des,
    /// One task per device, synchronised on signal latches
    Dataflow,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Des => "des",
            ExecutionMode::Dataflow => "dataflow",
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "des" => Ok(ExecutionMode::Des),
            "dataflow" => Ok(ExecutionMode::Dataflow),
            other => Err(format!("unknown execution mode '{}'", other)),
        }
    }
}

/// Available numerical backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Density-matrix Fock backend, operations queued and executed after the run
    #[default]
    FockFirst,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::FockFirst => "fock_first",
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fock-space truncation (dimension of each mode)
    pub cutoff: usize,

    /// State representation
    pub simulation_type: SimulationType,

    /// How `run` drives the devices
    pub execution: ExecutionMode,

    /// Numerical backend
    pub backend: BackendKind,

    /// Simulated time covered by one DES run, in seconds
    pub duration: f64,

    /// Upper bound on how long a dataflow device waits for an input, in
    /// milliseconds. `None` waits forever.
    pub signal_timeout_ms: Option<u64>,

    /// Refractive index used for fiber propagation delay
    pub fiber_refractive_index: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            cutoff: 10,
            simulation_type: SimulationType::Fock,
            execution: ExecutionMode::Des,
            backend: BackendKind::FockFirst,
            duration: 1.0,
            signal_timeout_ms: Some(10_000),
            fiber_refractive_index: 1.45,
        }
    }
}

impl SimulationSettings {
    pub fn with_cutoff(mut self, cutoff: usize) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_simulation_type(mut self, simulation_type: SimulationType) -> Self {
        self.simulation_type = simulation_type;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_signal_timeout_ms(mut self, timeout: Option<u64>) -> Self {
        self.signal_timeout_ms = timeout;
        self
    }

    /// Dataflow wait bound as a `Duration`
    pub fn signal_timeout(&self) -> Option<std::time::Duration> {
        self.signal_timeout_ms.map(std::time::Duration::from_millis)
    }
}
