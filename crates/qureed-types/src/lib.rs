//! Shared types for QuReed simulations.
//!
//! This crate defines the plain data structures used across the QuReed crates:
//! - Port directions and the signal kind hierarchy
//! - Simulation settings and backend selection
//! - The persisted JSON scheme describing devices and their wiring

mod port;
mod scheme;
mod settings;
mod signal_kind;

pub use port::*;
pub use scheme::*;
pub use settings::*;
pub use signal_kind::*;
