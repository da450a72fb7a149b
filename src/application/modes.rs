//! # Mode Store
//!
//! Last selected mode per participant. Absence means `Mode::Unset`; entries are
//! only ever overwritten, never deleted.

use dashmap::DashMap;

use crate::domain::types::{Mode, ParticipantId};

#[derive(Debug, Default)]
pub struct ModeStore {
    modes: DashMap<ParticipantId, Mode>,
}

impl ModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modes(entries: impl IntoIterator<Item = (ParticipantId, Mode)>) -> Self {
        let store = Self::new();
        for (id, mode) in entries {
            store.set_mode(id, mode);
        }
        store
    }

    pub fn get_mode(&self, id: &ParticipantId) -> Mode {
        self.modes.get(id).map(|m| *m).unwrap_or_default()
    }

    /// Overwrites unconditionally. `Unset` is never stored.
    pub fn set_mode(&self, id: ParticipantId, mode: Mode) {
        if !mode.is_selectable() {
            tracing::warn!("Ignoring attempt to store mode {} for {}", mode, id);
            return;
        }
        self.modes.insert(id, mode);
    }

    /// Snapshot of every stored entry, sorted by participant.
    pub fn list_all(&self) -> Vec<(ParticipantId, Mode)> {
        let mut entries: Vec<(ParticipantId, Mode)> = self
            .modes
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
