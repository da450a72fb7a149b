//! # Matrix Service Adapter
//!
//! Implements the `ChatProvider` trait for the Matrix protocol using the `matrix_sdk`.
//! Also provides the audit sink for the fixed audit room and the translation of
//! Matrix message content into dispatcher actions.

use crate::application::parsing;
use crate::domain::error::AuditError;
use crate::domain::traits::{AuditSink, ChatProvider};
use crate::domain::types::{Action, FileRef};
use async_trait::async_trait;
use matrix_sdk::Client;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::OwnedRoomId;
use matrix_sdk::ruma::events::room::MediaSource;
use matrix_sdk::ruma::events::room::message::{MessageType, RoomMessageEventContent};

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn send_message(&self, content: &str) -> Result<String, String> {
        tracing::info!("Bot sending message to {}: {}", self.room_id(), content);
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }

    async fn send_notification(&self, content: &str) -> Result<(), String> {
        // Notifications are also markdown messages for now
        self.send_message(content).await.map(|_| ())
    }
}

/// Delivers audit records as notices in a fixed room.
pub struct MatrixAuditSink {
    client: Client,
    room_id: OwnedRoomId,
}

impl MatrixAuditSink {
    pub fn new(client: Client, room_id: &str) -> anyhow::Result<Self> {
        let room_id = OwnedRoomId::try_from(room_id)
            .map_err(|e| anyhow::anyhow!("invalid audit room id '{}': {}", room_id, e))?;
        Ok(Self { client, room_id })
    }
}

#[async_trait]
impl AuditSink for MatrixAuditSink {
    async fn deliver(&self, text: &str) -> Result<(), AuditError> {
        let room = self
            .client
            .get_room(&self.room_id)
            .ok_or_else(|| AuditError::Unavailable(format!("not joined to {}", self.room_id)))?;
        room.send(RoomMessageEventContent::notice_plain(text))
            .await
            .map(|_| ())
            .map_err(|e| AuditError::Delivery(e.to_string()))
    }

    fn describe(&self) -> String {
        self.room_id.to_string()
    }
}

/// Maps Matrix message content to an action. `None` means the bot should stay quiet.
pub fn action_from_message(msgtype: &MessageType) -> Option<Action> {
    match msgtype {
        MessageType::Text(text) => parsing::parse_text(&text.body),
        MessageType::File(file) => Some(parsing::file_upload(FileRef {
            name: file.filename.clone().unwrap_or_else(|| file.body.clone()),
            source: media_uri(&file.source),
            size: file.info.as_ref().and_then(|i| i.size).map(u64::from),
        })),
        MessageType::Video(video) => Some(parsing::file_upload(FileRef {
            name: video.filename.clone().unwrap_or_else(|| video.body.clone()),
            source: media_uri(&video.source),
            size: video.info.as_ref().and_then(|i| i.size).map(u64::from),
        })),
        MessageType::Audio(audio) => Some(parsing::file_upload(FileRef {
            name: audio.filename.clone().unwrap_or_else(|| audio.body.clone()),
            source: media_uri(&audio.source),
            size: audio.info.as_ref().and_then(|i| i.size).map(u64::from),
        })),
        MessageType::Image(image) => Some(parsing::thumbnail_upload(FileRef {
            name: image.filename.clone().unwrap_or_else(|| image.body.clone()),
            source: media_uri(&image.source),
            size: image.info.as_ref().and_then(|i| i.size).map(u64::from),
        })),
        _ => None,
    }
}

fn media_uri(source: &MediaSource) -> String {
    match source {
        MediaSource::Plain(uri) => uri.to_string(),
        MediaSource::Encrypted(file) => file.url.to_string(),
    }
}
