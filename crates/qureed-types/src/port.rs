//! Port types for device inputs and outputs.

use serde::{Deserialize, Serialize};

use crate::SignalKind;

/// Direction of a port (input or output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// Port definition in a device type (the static per-type port schema)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Port label, unique within a device
    pub label: &'static str,

    /// Direction
    pub direction: PortDirection,

    /// Accepted signal kind (sub-kinds are accepted too)
    pub kind: SignalKind,
}

impl PortSpec {
    pub const fn input(label: &'static str, kind: SignalKind) -> Self {
        Self {
            label,
            direction: PortDirection::Input,
            kind,
        }
    }

    pub const fn output(label: &'static str, kind: SignalKind) -> Self {
        Self {
            label,
            direction: PortDirection::Output,
            kind,
        }
    }

    /// True for ports carrying exactly quantum signals (used for mode budgeting)
    pub fn is_quantum(&self) -> bool {
        self.kind == SignalKind::Quantum
    }
}
