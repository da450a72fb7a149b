//! # Dispatcher
//!
//! Entry point for every inbound event. Checks the ban list, applies mode
//! selections, resolves the participant's mode and routes feature events
//! into the handler set registry. Every failure is turned into a reply here;
//! nothing escapes to the transport loop.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::access::AccessGate;
use crate::application::audit::AuditNotifier;
use crate::application::modes::ModeStore;
use crate::application::registry::HandlerSetRegistry;
use crate::application::state::{BotState, StateFile};
use crate::domain::error::DispatchError;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{
    Action, AuditRecord, FeatureEvent, InboundEvent, Mode, ParticipantId, Transition,
};
use crate::interface::commands;
use crate::strings::messages;

/// How an inbound event was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Banned,
    ModeSet(Mode),
    SwitchFailed(Mode),
    SelectModeFirst,
    Stale,
    Unsupported,
    Handled,
    HandlerFailed,
    Admin,
    Unauthorized,
    Info,
    Unknown,
}

pub struct Dispatcher {
    gate: Arc<AccessGate>,
    modes: Arc<ModeStore>,
    registry: Arc<HandlerSetRegistry>,
    audit: AuditNotifier,
    admins: BTreeSet<ParticipantId>,
    state_file: Option<StateFile>,
    persist_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        gate: Arc<AccessGate>,
        modes: Arc<ModeStore>,
        registry: Arc<HandlerSetRegistry>,
        audit: AuditNotifier,
        admins: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        Self {
            gate,
            modes,
            registry,
            audit,
            admins: admins.into_iter().collect(),
            state_file: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Snapshot state to `file` after every mutation.
    pub fn with_state_file(mut self, file: StateFile) -> Self {
        self.state_file = Some(file);
        self
    }

    pub fn is_admin(&self, id: &ParticipantId) -> bool {
        self.admins.contains(id)
    }

    pub async fn handle(&self, chat: &dyn ChatProvider, event: InboundEvent) -> Outcome {
        let InboundEvent { sender, action } = event;
        tracing::info!("Dispatching {:?} from {}", action, sender);

        if self.gate.is_banned(&sender) {
            reply(chat, messages::BANNED).await;
            return Outcome::Banned;
        }

        match action {
            Action::SelectMode(mode) => self.select_mode(chat, sender, mode).await,
            Action::Feature(feature) => self.route_feature(chat, &sender, &feature).await,
            Action::Admin(cmd) => {
                if !self.is_admin(&sender) {
                    tracing::warn!("Rejected admin command from {}", sender);
                    reply(chat, messages::AUTH_DENIED).await;
                    return Outcome::Unauthorized;
                }
                let ctx = commands::admin::AdminContext {
                    gate: &self.gate,
                    modes: &self.modes,
                    audit: &self.audit,
                    admins: &self.admins,
                };
                let changed = match commands::admin::handle_admin(&ctx, chat, &sender, cmd).await {
                    Ok(changed) => changed,
                    Err(e) => {
                        tracing::error!("Admin command from {} failed: {}", sender, e);
                        true
                    }
                };
                if changed {
                    self.persist().await;
                }
                Outcome::Admin
            }
            Action::Status => {
                let mode = self.modes.get_mode(&sender);
                let active = self.registry.active_mode().await;
                if let Err(e) = commands::misc::handle_status(
                    chat,
                    mode,
                    active,
                    self.registry.isolation(),
                )
                .await
                {
                    tracing::warn!("Failed to send status: {}", e);
                }
                Outcome::Info
            }
            Action::Help => {
                if let Err(e) = commands::help::handle_help(chat).await {
                    tracing::warn!("Failed to send help: {}", e);
                }
                Outcome::Info
            }
            Action::Unknown(cmd) => {
                tracing::debug!("Unknown command '{}' from {}", cmd, sender);
                reply(chat, messages::UNKNOWN_COMMAND).await;
                Outcome::Unknown
            }
        }
    }

    /// Swaps the registry first and records the mode only once the swap
    /// succeeded, so an abandoned selection never leaves the store ahead of
    /// the installed handlers.
    async fn select_mode(&self, chat: &dyn ChatProvider, sender: ParticipantId, mode: Mode) -> Outcome {
        let previous = self.modes.get_mode(&sender);

        if let Err(e) = self.registry.swap(mode).await {
            tracing::error!("Mode switch to {} for {} failed: {}", mode, sender, e);
            reply(chat, &messages::switch_failed(mode)).await;
            // Best effort; delivery errors are logged by the notifier.
            let _ = self.audit.notify(AuditRecord::now(
                sender,
                Transition::ModeSwitchFailed {
                    to: mode,
                    reason: e.to_string(),
                },
            ));
            return Outcome::SwitchFailed(mode);
        }

        self.modes.set_mode(sender.clone(), mode);
        reply(chat, &messages::mode_set(mode)).await;
        // Best effort; delivery errors are logged by the notifier.
        let _ = self.audit.notify(AuditRecord::now(
            sender,
            Transition::ModeSelected {
                from: previous,
                to: mode,
            },
        ));
        self.persist().await;
        Outcome::ModeSet(mode)
    }

    async fn route_feature(
        &self,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> Outcome {
        let mode = self.modes.get_mode(sender);
        if mode == Mode::Unset {
            reply(chat, messages::SELECT_MODE_FIRST).await;
            return Outcome::SelectModeFirst;
        }

        match self.registry.dispatch(mode, chat, sender, event).await {
            Ok(()) => Outcome::Handled,
            Err(DispatchError::StaleHandlerSet { requested, active }) => {
                tracing::info!(
                    "Stale handler set for {} (wanted {}, active {:?})",
                    sender,
                    requested,
                    active
                );
                reply(chat, messages::STALE_HANDLER_SET).await;
                Outcome::Stale
            }
            Err(DispatchError::NoHandler { mode, kind }) => {
                reply(chat, &messages::unsupported_action(kind, mode)).await;
                Outcome::Unsupported
            }
            Err(DispatchError::Handler(e)) => {
                tracing::error!("{} handler for {} failed: {:#}", mode, sender, e);
                reply(chat, messages::ACTION_FAILED).await;
                Outcome::HandlerFailed
            }
        }
    }

    async fn persist(&self) {
        let Some(file) = &self.state_file else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let state = BotState {
            modes: self.modes.list_all().into_iter().collect(),
            banned: self.gate.list().into_iter().collect(),
            active: self.registry.active_mode().await,
        };
        if let Err(e) = file.save(&state) {
            tracing::warn!("Failed to save state to {}: {}", file.path().display(), e);
        }
    }
}

async fn reply(chat: &dyn ChatProvider, text: &str) {
    if let Err(e) = chat.send_notification(text).await {
        tracing::warn!("Failed to reply in {}: {}", chat.room_id(), e);
    }
}
