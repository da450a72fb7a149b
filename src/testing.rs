//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::domain::error::{AuditError, LoadError};
use crate::domain::traits::{AuditSink, ChatProvider, FeaturePlugin, Handler, HandlerSet};
use crate::domain::types::{EventKind, FeatureEvent, Mode, ParticipantId};

pub fn pid(s: &str) -> ParticipantId {
    ParticipantId::parse(s).unwrap()
}

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Chat room that remembers everything sent to it.
#[derive(Default)]
pub struct RecordingChat {
    messages: Mutex<Vec<String>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for RecordingChat {
    async fn send_message(&self, content: &str) -> Result<String, String> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(content.to_string());
        Ok(format!("$event{}", messages.len()))
    }

    async fn send_notification(&self, content: &str) -> Result<(), String> {
        self.messages.lock().unwrap().push(content.to_string());
        Ok(())
    }

    fn room_id(&self) -> String {
        "!test:example.org".to_string()
    }
}

/// Chat room where every send fails.
pub struct DeadChat;

#[async_trait]
impl ChatProvider for DeadChat {
    async fn send_message(&self, _content: &str) -> Result<String, String> {
        Err("room unreachable".to_string())
    }

    async fn send_notification(&self, _content: &str) -> Result<(), String> {
        Err("room unreachable".to_string())
    }

    fn room_id(&self) -> String {
        "!dead:example.org".to_string()
    }
}

/// Audit sink forwarding delivered records to a channel, or failing every delivery.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<String>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, fail: false }), rx)
    }

    pub fn failing() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx, fail: true }), rx)
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn deliver(&self, text: &str) -> Result<(), AuditError> {
        let _ = self.tx.send(text.to_string());
        if self.fail {
            return Err(AuditError::Delivery("room unreachable".to_string()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "recording sink".to_string()
    }
}

pub async fn next_record(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("audit record not delivered in time")
        .expect("audit channel closed")
}

struct StubHandler {
    label: String,
    delay: Option<Duration>,
    journal: Journal,
    handled: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for StubHandler {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        _sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:begin", self.label));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.handled.fetch_add(1, Ordering::SeqCst);
        chat.send_message(&format!("{}:{}", self.label, event.kind))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        self.journal.lock().unwrap().push(format!("{}:end", self.label));
        Ok(())
    }
}

/// Feature plugin whose handlers echo `<mode>:<kind>` back to the chat.
pub struct StubPlugin {
    mode: Mode,
    produces: Mode,
    kinds: Vec<EventKind>,
    fail: bool,
    delay: Option<Duration>,
    journal: Journal,
    loads: AtomicUsize,
    unloads: AtomicUsize,
    handled: Arc<AtomicUsize>,
}

impl StubPlugin {
    fn build(mode: Mode, kinds: &[EventKind]) -> Self {
        Self {
            mode,
            produces: mode,
            kinds: kinds.to_vec(),
            fail: false,
            delay: None,
            journal: Journal::default(),
            loads: AtomicUsize::new(0),
            unloads: AtomicUsize::new(0),
            handled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn new(mode: Mode, kinds: &[EventKind]) -> Arc<Self> {
        Arc::new(Self::build(mode, kinds))
    }

    pub fn failing(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::build(mode, &[])
        })
    }

    pub fn producing(mode: Mode, produces: Mode) -> Arc<Self> {
        Arc::new(Self {
            produces,
            ..Self::build(mode, &[])
        })
    }

    pub fn slow(mode: Mode, kinds: &[EventKind], delay: Duration, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            journal,
            ..Self::build(mode, kinds)
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeaturePlugin for StubPlugin {
    fn mode(&self) -> Mode {
        self.mode
    }

    async fn load(&self) -> Result<HandlerSet, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:load", self.mode));
        if self.fail {
            return Err(LoadError::init(
                self.mode,
                anyhow::anyhow!("work directory unavailable"),
            ));
        }
        let handler: Arc<dyn Handler> = Arc::new(StubHandler {
            label: self.produces.to_string(),
            delay: self.delay,
            journal: self.journal.clone(),
            handled: self.handled.clone(),
        });
        Ok(self
            .kinds
            .iter()
            .fold(HandlerSet::new(self.produces), |set, kind| {
                set.bind(*kind, handler.clone())
            }))
    }

    async fn unload(&self) {
        self.unloads.fetch_add(1, Ordering::SeqCst);
    }
}
