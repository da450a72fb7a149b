//! # Main Entry Point
//!
//! Wires the dispatch core to Matrix:
//! - Domain: Configuration, Types and Traits
//! - Application: Access gate, Mode store, Handler set registry, Audit, Dispatcher
//! - Features: Rename and Merge handler sets
//! - Infrastructure: Matrix adapter and audit sink
//!

mod application;
mod domain;
mod features;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::SyncRoomMessageEvent,
    },
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::access::AccessGate;
use crate::application::audit::AuditNotifier;
use crate::application::dispatcher::Dispatcher;
use crate::application::modes::ModeStore;
use crate::application::registry::HandlerSetRegistry;
use crate::application::state::StateFile;
use crate::domain::config::AppConfig;
use crate::domain::types::{InboundEvent, ParticipantId};
use crate::infrastructure::matrix::{MatrixAuditSink, MatrixService, action_from_message};
use crate::strings::messages;

#[derive(Parser, Debug)]
#[command(name = "renamerge", about = "Rename/merge Matrix bot")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.config)?;

    // 2. Logging Setup
    let data_dir = config.system.data_dir.clone();
    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    // Clear previous session log
    let log_path = data_dir.join("session.log");
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&data_dir, "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Starting Renamerge...");
    tracing::info!("{}", messages::config_loaded(&config.services.matrix.username));

    // 3. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(
            &config.services.matrix.username,
            &config.services.matrix.password,
        )
        .send()
        .await?;

    tracing::info!("{}", messages::LOGIN_SUCCESS);

    if let Some(name) = &config.services.matrix.display_name
        && let Err(e) = client.account().set_display_name(Some(name.as_str())).await
    {
        tracing::warn!("Failed to set display name: {}", e);
    }

    // 4. Dispatch Core
    let state_file = config
        .system
        .persist_state
        .then(|| StateFile::new(config.state_path()));
    let restored = state_file.as_ref().map(StateFile::load).unwrap_or_default();
    tracing::info!(
        "Restored {} participant modes and {} bans",
        restored.modes.len(),
        restored.banned.len()
    );

    let gate = Arc::new(AccessGate::with_banned(restored.banned.iter().cloned()));
    let modes = Arc::new(ModeStore::with_modes(restored.modes.clone()));

    let registry = features::builtin(&config.features)
        .into_iter()
        .fold(HandlerSetRegistry::new(config.dispatch.isolation), |r, p| {
            r.register(p)
        });
    let registry = Arc::new(registry);
    registry.preload().await;
    if let Some(active) = restored.active
        && let Err(e) = registry.swap(active).await
    {
        tracing::error!("Failed to restore {} handler set: {}", active, e);
    }

    let audit = match &config.audit.room {
        Some(room_id) => AuditNotifier::new(Arc::new(MatrixAuditSink::new(
            client.clone(),
            room_id,
        )?)),
        None => {
            tracing::info!("No audit room configured; audit records are only logged");
            AuditNotifier::disabled()
        }
    };

    let mut dispatcher = Dispatcher::new(
        gate,
        modes,
        registry,
        audit,
        config.system.admin.iter().cloned(),
    );
    if let Some(file) = state_file {
        dispatcher = dispatcher.with_state_file(file);
    }
    let dispatcher = Arc::new(dispatcher);

    // 5. Event Loop
    let start_time = std::time::SystemTime::now();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let dispatcher = dispatcher.clone();

        async move {
            let Some(original_msg) = ev.as_original() else {
                return;
            };

            // Ignore events older than start_time
            let ts = ev.origin_server_ts();
            let event_time =
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
            if event_time < start_time {
                return;
            }

            if original_msg.sender == room.own_user_id() {
                return;
            }

            let Some(action) = action_from_message(&original_msg.content.msgtype) else {
                return;
            };

            let sender = match ParticipantId::parse(original_msg.sender.as_str()) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Dropping event from unusable sender: {}", e);
                    return;
                }
            };

            let chat = MatrixService::new(room);
            let outcome = dispatcher.handle(&chat, InboundEvent { sender, action }).await;
            tracing::debug!("Event resolved as {:?}", outcome);
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            tracing::info!("{}", messages::invite_received(room.room_id().as_str()));
            if let Err(e) = room.join().await {
                tracing::warn!("{}", messages::join_invite_fail(&e.to_string()));
            }
        }
    });

    // 6. Sync until shutdown
    tokio::select! {
        res = client.sync(SyncSettings::default()) => {
            if let Err(e) = res {
                tracing::error!("{}", messages::sync_loop_fail(&e.to_string()));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}
