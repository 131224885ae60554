//! Constants and small value types shared across the kernel

pub mod constants;
mod time;

pub use time::SimTime;
