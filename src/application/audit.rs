//! # Audit Notifier
//!
//! Forwards audit records to the configured audit room. Delivery runs on its
//! own task so the reply to the participant never waits on it, and a failed
//! delivery is only logged.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::traits::AuditSink;
use crate::domain::types::AuditRecord;

#[derive(Clone, Default)]
pub struct AuditNotifier {
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditNotifier {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Records are logged locally and dropped.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Spawns delivery of `record`. The handle is only useful to tests; callers drop it.
    pub fn notify(&self, record: AuditRecord) -> Option<JoinHandle<()>> {
        let text = record.to_string();
        if record.is_failure() {
            tracing::warn!("Audit: {}", text);
        } else {
            tracing::info!("Audit: {}", text);
        }

        let sink = self.sink.clone()?;
        Some(tokio::spawn(async move {
            if let Err(e) = sink.deliver(&text).await {
                tracing::warn!("Dropping audit record for {}: {}", sink.describe(), e);
            }
        }))
    }
}
