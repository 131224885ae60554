//! Physical constants and simulation defaults

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Default refractive index of optical fiber
pub const FIBER_REFRACTIVE_INDEX: f64 = 1.45;

/// Time a beam splitter collects coincident photons before interfering them (s)
pub const BEAM_SPLITTER_PROCESSING_TIME: f64 = 1e-9;

/// Variables emit before any trigger so parameters are in place at t = 0
pub const VARIABLE_EMIT_TIME: f64 = -1.0;

/// Default beam splitter mixing angle (50:50)
pub const BALANCED_THETA: f64 = std::f64::consts::FRAC_PI_4;

/// Port label used by `register_triggers`
pub const TRIGGER_PORT: &str = "trigger";
