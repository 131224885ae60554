//! Mode allocation.
//!
//! Devices refer to optical modes through opaque [`ModeId`]s. The manager maps
//! each id to a dense tensor index in creation order. Indices are never reused
//! within one simulation.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::error::ModeError;

/// Opaque mode identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(Uuid);

impl ModeId {
    pub fn new() -> Self {
        ModeId(Uuid::new_v4())
    }
}

impl Default for ModeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps mode ids to tensor indices
#[derive(Debug, Default)]
pub struct ModeManager {
    modes: Mutex<HashMap<ModeId, usize>>,
}

impl ModeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new mode at the next free index
    pub fn create_new_mode(&self) -> ModeId {
        self.create_indexed_mode().0
    }

    /// Allocate a new mode and return it with its index in one step
    pub fn create_indexed_mode(&self) -> (ModeId, usize) {
        let mut modes = self.modes.lock();
        let id = ModeId::new();
        let index = modes.len();
        modes.insert(id, index);
        debug!(target: "qureed::simulation", "created mode {} at index {}", id, index);
        (id, index)
    }

    pub fn get_mode_index(&self, id: ModeId) -> Result<usize, ModeError> {
        self.modes
            .lock()
            .get(&id)
            .copied()
            .ok_or(ModeError::UnknownMode(id))
    }

    /// Modes are never released, so the tensor layout stays stable for the run
    pub fn remove_mode(&self, id: ModeId) {
        debug!(target: "qureed::simulation", "remove_mode({}) ignored, modes are not reused", id);
    }

    pub fn clear_modes(&self) {
        self.modes.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.modes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.lock().is_empty()
    }

    /// All modes ordered by index
    pub fn modes(&self) -> Vec<(ModeId, usize)> {
        let mut modes: Vec<_> = self.modes.lock().iter().map(|(&id, &i)| (id, i)).collect();
        modes.sort_by_key(|&(_, i)| i);
        modes
    }
}
