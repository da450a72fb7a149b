//! # Bot State
//!
//! Optional JSON snapshot of participant modes, bans and the last active
//! handler set. Written after each mutation when `system.persist_state` is on,
//! read once at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::types::{Mode, ParticipantId};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    #[serde(default)]
    pub modes: BTreeMap<ParticipantId, Mode>,
    #[serde(default)]
    pub banned: BTreeSet<ParticipantId>,
    #[serde(default)]
    pub active: Option<Mode>,
}

/// Where the snapshot lives on disk.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot, or returns an empty state if it is missing or unreadable.
    pub fn load(&self) -> BotState {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return BotState::default();
        };
        match serde_json::from_str::<BotState>(&content) {
            Ok(mut state) => {
                // Unset is implied by absence.
                state.modes.retain(|_, mode| mode.is_selectable());
                state
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                BotState::default()
            }
        }
    }

    /// Persists the snapshot, writing to a temporary file first.
    pub fn save(&self, state: &BotState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pid;

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        assert_eq!(file.load(), BotState::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nested/state.json"));

        let mut state = BotState::default();
        state.modes.insert(pid("@alice:example.org"), Mode::Merge);
        state.banned.insert(pid("@mallory:example.org"));
        state.active = Some(Mode::Merge);
        file.save(&state).unwrap();

        assert_eq!(file.load(), state);
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_and_unset_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let file = StateFile::new(&path);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(file.load(), BotState::default());

        fs::write(
            &path,
            r#"{"modes": {"@alice:example.org": "unset", "@bob:example.org": "rename"}}"#,
        )
        .unwrap();
        let state = file.load();
        assert_eq!(state.modes.len(), 1);
        assert_eq!(state.modes.get(&pid("@bob:example.org")), Some(&Mode::Rename));
    }
}
