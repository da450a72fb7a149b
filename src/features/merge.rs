//! # Merge Feature
//!
//! Handler set for `Mode::Merge`: collects uploads into a per-participant queue
//! and hands the ordered queue off on `.done`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::config::MergeConfig;
use crate::domain::error::LoadError;
use crate::domain::traits::{ChatProvider, FeaturePlugin, Handler, HandlerSet};
use crate::domain::types::{EventKind, FeatureEvent, FileRef, Mode, ParticipantId};
use crate::features::{attached_file, say};
use crate::strings::features as text;

type Queues = Arc<Mutex<HashMap<ParticipantId, Vec<FileRef>>>>;

pub struct MergePlugin {
    config: MergeConfig,
    queues: Queues,
}

impl MergePlugin {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            queues: Queues::default(),
        }
    }
}

#[async_trait]
impl FeaturePlugin for MergePlugin {
    fn mode(&self) -> Mode {
        Mode::Merge
    }

    async fn load(&self) -> Result<HandlerSet, LoadError> {
        if self.config.max_files < 2 {
            return Err(LoadError::init(
                Mode::Merge,
                anyhow::anyhow!("max_files must be at least 2, got {}", self.config.max_files),
            ));
        }
        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| LoadError::init(Mode::Merge, e))?;

        let queues = self.queues.clone();
        Ok(HandlerSet::new(Mode::Merge)
            .bind(EventKind::StartCommand, Arc::new(Start))
            .bind(
                EventKind::FileUpload,
                Arc::new(Enqueue {
                    queues: queues.clone(),
                    max_files: self.config.max_files,
                }),
            )
            .bind(
                EventKind::Finish,
                Arc::new(Finish {
                    queues: queues.clone(),
                }),
            )
            .bind(EventKind::Clear, Arc::new(Clear { queues })))
    }

    async fn unload(&self) {
        self.queues.lock().await.clear();
    }
}

struct Start;

#[async_trait]
impl Handler for Start {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        _sender: &ParticipantId,
        _event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        say(chat, text::MERGE_WELCOME).await
    }
}

struct Enqueue {
    queues: Queues,
    max_files: usize,
}

#[async_trait]
impl Handler for Enqueue {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let Some(file) = attached_file(chat, event).await? else {
            return Ok(());
        };
        let reply = {
            let mut queues = self.queues.lock().await;
            let queue = queues.entry(sender.clone()).or_default();
            if queue.len() >= self.max_files {
                text::merge_queue_full(self.max_files)
            } else {
                queue.push(file.clone());
                text::merge_added(file, queue.len())
            }
        };
        say(chat, &reply).await
    }
}

struct Finish {
    queues: Queues,
}

#[async_trait]
impl Handler for Finish {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        _event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let files = {
            let mut queues = self.queues.lock().await;
            let count = queues.get(sender).map(Vec::len).unwrap_or(0);
            if count < 2 {
                drop(queues);
                return say(chat, &text::merge_needs_more(count)).await;
            }
            queues.remove(sender).unwrap_or_default()
        };
        tracing::info!("Merge of {} files requested by {}", files.len(), sender);
        say(chat, &text::merge_started(&files)).await
    }
}

struct Clear {
    queues: Queues,
}

#[async_trait]
impl Handler for Clear {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        _event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let count = self
            .queues
            .lock()
            .await
            .remove(sender)
            .map(|q| q.len())
            .unwrap_or(0);
        say(chat, &text::merge_cleared(count)).await
    }
}
