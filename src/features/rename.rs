//! # Rename Feature
//!
//! Handler set for `Mode::Rename`: acknowledges uploads for renaming and keeps a
//! custom thumbnail per participant while the set is loaded.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::config::RenameConfig;
use crate::domain::error::LoadError;
use crate::domain::traits::{ChatProvider, FeaturePlugin, Handler, HandlerSet};
use crate::domain::types::{EventKind, FeatureEvent, FileRef, Mode, ParticipantId};
use crate::features::{attached_file, say};
use crate::strings::features as text;

type Thumbnails = Arc<Mutex<HashMap<ParticipantId, FileRef>>>;

pub struct RenamePlugin {
    config: RenameConfig,
    thumbnails: Thumbnails,
}

impl RenamePlugin {
    pub fn new(config: RenameConfig) -> Self {
        Self {
            config,
            thumbnails: Thumbnails::default(),
        }
    }
}

#[async_trait]
impl FeaturePlugin for RenamePlugin {
    fn mode(&self) -> Mode {
        Mode::Rename
    }

    async fn load(&self) -> Result<HandlerSet, LoadError> {
        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| LoadError::init(Mode::Rename, e))?;

        let thumbs = self.thumbnails.clone();
        Ok(HandlerSet::new(Mode::Rename)
            .bind(EventKind::StartCommand, Arc::new(Start))
            .bind(
                EventKind::FileUpload,
                Arc::new(Upload {
                    thumbnails: thumbs.clone(),
                }),
            )
            .bind(
                EventKind::SaveThumbnail,
                Arc::new(SaveThumbnail {
                    thumbnails: thumbs.clone(),
                }),
            )
            .bind(
                EventKind::DeleteThumbnail,
                Arc::new(DeleteThumbnail { thumbnails: thumbs }),
            ))
    }

    async fn unload(&self) {
        self.thumbnails.lock().await.clear();
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
        say(chat, text::RENAME_WELCOME).await
    }
}

struct Upload {
    thumbnails: Thumbnails,
}

#[async_trait]
impl Handler for Upload {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let Some(file) = attached_file(chat, event).await? else {
            return Ok(());
        };
        let with_thumbnail = self.thumbnails.lock().await.contains_key(sender);
        tracing::info!("Rename requested by {} for {}", sender, file.name);
        say(chat, &text::rename_queued(file, with_thumbnail)).await
    }
}

struct SaveThumbnail {
    thumbnails: Thumbnails,
}

#[async_trait]
impl Handler for SaveThumbnail {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let Some(file) = attached_file(chat, event).await? else {
            return Ok(());
        };
        self.thumbnails
            .lock()
            .await
            .insert(sender.clone(), file.clone());
        say(chat, text::THUMBNAIL_SAVED).await
    }
}

struct DeleteThumbnail {
    thumbnails: Thumbnails,
}

#[async_trait]
impl Handler for DeleteThumbnail {
    async fn handle(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        _event: &FeatureEvent,
    ) -> anyhow::Result<()> {
        let removed = self.thumbnails.lock().await.remove(sender).is_some();
        say(
            chat,
            if removed {
                text::THUMBNAIL_DELETED
            } else {
                text::NO_THUMBNAIL
            },
        )
        .await
    }
}
