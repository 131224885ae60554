//! Signal kind hierarchy.
//!
//! Kinds form a small tree rooted at [`SignalKind::Generic`]. A port declared
//! with kind `K` accepts any signal whose kind is `K` or descends from `K`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Generic,
    Bool,
    Int,
    Float,
    Complex,
    Time,
    Quantum,
    Fock,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        SignalKind::Generic,
        SignalKind::Bool,
        SignalKind::Int,
        SignalKind::Float,
        SignalKind::Complex,
        SignalKind::Time,
        SignalKind::Quantum,
        SignalKind::Fock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Generic => "generic",
            SignalKind::Bool => "bool",
            SignalKind::Int => "int",
            SignalKind::Float => "float",
            SignalKind::Complex => "complex",
            SignalKind::Time => "time",
            SignalKind::Quantum => "quantum",
            SignalKind::Fock => "fock",
        }
    }

    /// Direct parent in the hierarchy, `None` for the root
    pub fn parent(&self) -> Option<SignalKind> {
        match self {
            SignalKind::Generic => None,
            SignalKind::Fock => Some(SignalKind::Quantum),
            _ => Some(SignalKind::Generic),
        }
    }

    /// Returns true if `self` is `other` or a descendant of `other`
    pub fn is_a(&self, other: SignalKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Quantum signals carry mode references rather than classical values
    pub fn is_quantum(&self) -> bool {
        self.is_a(SignalKind::Quantum)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
