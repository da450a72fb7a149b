//! # Domain Errors
//!
//! Typed failures of the dispatch core. Everything here is recoverable:
//! the dispatcher turns each variant into a reply or a log line.

use std::error::Error as StdError;

use crate::domain::types::{EventKind, Mode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParticipantIdError {
    #[error("participant id is empty")]
    Empty,
    #[error("malformed participant id: {0}")]
    Malformed(String),
}

/// A handler set could not be resolved or initialised during a swap.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("mode {0} cannot be activated")]
    NotSelectable(Mode),

    #[error("no feature plugin registered for mode {0}")]
    Unregistered(Mode),

    #[error("plugin for {expected} produced a handler set for {actual}")]
    Mismatch { expected: Mode, actual: Mode },

    #[error("failed to initialise {mode} handlers: {source}")]
    Init {
        mode: Mode,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl LoadError {
    pub fn init(mode: Mode, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Init {
            mode,
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The installed handler set no longer matches the mode the caller asked for.
    #[error("handler set for {requested} is not active (active: {active:?})")]
    StaleHandlerSet {
        requested: Mode,
        active: Option<Mode>,
    },

    #[error("no {kind} handler in the {mode} handler set")]
    NoHandler { mode: Mode, kind: EventKind },

    #[error("handler failed: {0:#}")]
    Handler(anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit destination unavailable: {0}")]
    Unavailable(String),

    #[error("audit delivery failed: {0}")]
    Delivery(String),
}
