//! # Domain Traits
//!
//! Abstract interfaces for the collaborators of the dispatch core
//! (chat transport, audit destination, feature plugins).
//! Allows for pluggable implementations in the Infrastructure layer and in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::error::{AuditError, LoadError};
use crate::domain::types::{EventKind, FeatureEvent, Mode, ParticipantId};

/// Abstract interface for a Chat Provider (e.g., Matrix, Console)
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message to the room
    async fn send_message(&self, content: &str) -> Result<String, String>;

    /// Send a notification (not tracked/editable)
    async fn send_notification(&self, content: &str) -> Result<(), String>;

    /// Get the current room ID
    fn room_id(&self) -> String;
}

/// Fixed destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), AuditError>;

    /// Human readable name of the destination, for logs.
    fn describe(&self) -> String;
}

/// Behaviour bound to one event kind inside a handler set.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> anyhow::Result<()>;
}

/// The complete set of event bindings implementing one mode.
#[derive(Clone)]
pub struct HandlerSet {
    mode: Mode,
    handlers: HashMap<EventKind, Arc<dyn Handler>>,
}

impl HandlerSet {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            handlers: HashMap::new(),
        }
    }

    pub fn bind(mut self, kind: EventKind, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn handler(&self, kind: EventKind) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(&kind)
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.handlers.keys().copied().collect()
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("mode", &self.mode)
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// A statically linked feature module that produces the handler set for its mode.
///
/// `load` and `unload` must both be idempotent.
#[async_trait]
pub trait FeaturePlugin: Send + Sync {
    fn mode(&self) -> Mode;

    async fn load(&self) -> Result<HandlerSet, LoadError>;

    async fn unload(&self);
}
