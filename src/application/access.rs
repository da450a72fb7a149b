//! # Access Gate
//!
//! Holds the ban list and answers allow/deny queries for every inbound event.

use dashmap::DashSet;

use crate::domain::types::ParticipantId;

#[derive(Debug, Default)]
pub struct AccessGate {
    banned: DashSet<ParticipantId>,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banned(ids: impl IntoIterator<Item = ParticipantId>) -> Self {
        let gate = Self::new();
        for id in ids {
            gate.banned.insert(id);
        }
        gate
    }

    pub fn is_banned(&self, id: &ParticipantId) -> bool {
        self.banned.contains(id)
    }

    /// Returns `true` if the id was not banned before. Banning twice is a no-op.
    pub fn ban(&self, id: ParticipantId) -> bool {
        self.banned.insert(id)
    }

    /// Returns `true` if the id was banned before. Unbanning twice is a no-op.
    pub fn unban(&self, id: &ParticipantId) -> bool {
        self.banned.remove(id).is_some()
    }

    pub fn list(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.banned.iter().map(|id| id.key().clone()).collect();
        ids.sort();
        ids
    }
}
