//! # Admin Commands
//!
//! Handles `.ban`, `.unban`, `.banned`, `.modes` and `.admins`.
//! The dispatcher has already checked that the sender is an administrator.

use anyhow::Result;
use std::collections::BTreeSet;

use crate::application::access::AccessGate;
use crate::application::audit::AuditNotifier;
use crate::application::modes::ModeStore;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{AdminCommand, AuditRecord, ParticipantId, Transition};
use crate::strings::messages;

pub struct AdminContext<'a> {
    pub gate: &'a AccessGate,
    pub modes: &'a ModeStore,
    pub audit: &'a AuditNotifier,
    pub admins: &'a BTreeSet<ParticipantId>,
}

/// Runs one admin command. Returns `true` when ban state changed.
///
/// An `Err` is only possible before any state was touched.
pub async fn handle_admin(
    ctx: &AdminContext<'_>,
    chat: &dyn ChatProvider,
    sender: &ParticipantId,
    command: AdminCommand,
) -> Result<bool> {
    match command {
        AdminCommand::Ban(raw) => {
            let Some(target) = parse_target(chat, &raw, messages::BAN_USAGE).await? else {
                return Ok(false);
            };
            let changed = ctx.gate.ban(target.clone());
            tracing::info!("{} banned {} (changed: {})", sender, target, changed);
            if changed {
                // Best effort; delivery errors are logged by the notifier.
                let _ = ctx.audit.notify(AuditRecord::now(
                    sender.clone(),
                    Transition::Banned {
                        target: target.clone(),
                    },
                ));
            }
            acknowledge(chat, &messages::banned_ok(&target, changed)).await;
            Ok(changed)
        }
        AdminCommand::Unban(raw) => {
            let Some(target) = parse_target(chat, &raw, messages::UNBAN_USAGE).await? else {
                return Ok(false);
            };
            let changed = ctx.gate.unban(&target);
            tracing::info!("{} unbanned {} (changed: {})", sender, target, changed);
            if changed {
                // Best effort; delivery errors are logged by the notifier.
                let _ = ctx.audit.notify(AuditRecord::now(
                    sender.clone(),
                    Transition::Unbanned {
                        target: target.clone(),
                    },
                ));
            }
            acknowledge(chat, &messages::unbanned_ok(&target, changed)).await;
            Ok(changed)
        }
        AdminCommand::ListBanned => {
            let lines: Vec<String> = ctx.gate.list().iter().map(|id| id.to_string()).collect();
            send(chat, &messages::listing("🚫 Banned", &lines, "Nobody is banned.")).await?;
            Ok(false)
        }
        AdminCommand::ListModes => {
            let lines: Vec<String> = ctx
                .modes
                .list_all()
                .iter()
                .map(|(id, mode)| format!("{id}: {mode}"))
                .collect();
            send(chat, &messages::listing("🔀 Modes", &lines, "No modes selected yet.")).await?;
            Ok(false)
        }
        AdminCommand::ListAdmins => {
            let lines: Vec<String> = ctx.admins.iter().map(|id| id.to_string()).collect();
            send(chat, &messages::listing("👑 Admins", &lines, "No admins.")).await?;
            Ok(false)
        }
    }
}

async fn parse_target(
    chat: &dyn ChatProvider,
    raw: &str,
    usage: &str,
) -> Result<Option<ParticipantId>> {
    if raw.trim().is_empty() {
        send(chat, usage).await?;
        return Ok(None);
    }
    match ParticipantId::parse(raw) {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            send(chat, &messages::invalid_participant(&e.to_string())).await?;
            Ok(None)
        }
    }
}

async fn send(chat: &dyn ChatProvider, text: &str) -> Result<()> {
    chat.send_notification(text)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

/// Reply sent after ban state already changed. Failures are only logged.
async fn acknowledge(chat: &dyn ChatProvider, text: &str) {
    if let Err(e) = send(chat, text).await {
        tracing::warn!("Failed to acknowledge admin command in {}: {}", chat.room_id(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Mode;
    use crate::testing::{DeadChat, RecordingChat, RecordingSink, next_record, pid};

    struct Fixture {
        gate: AccessGate,
        modes: ModeStore,
        audit: AuditNotifier,
        admins: BTreeSet<ParticipantId>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                gate: AccessGate::new(),
                modes: ModeStore::new(),
                audit: AuditNotifier::disabled(),
                admins: [pid("@root:example.org")].into_iter().collect(),
            }
        }

        fn ctx(&self) -> AdminContext<'_> {
            AdminContext {
                gate: &self.gate,
                modes: &self.modes,
                audit: &self.audit,
                admins: &self.admins,
            }
        }
    }

    #[tokio::test]
    async fn test_ban_twice_reports_no_change() {
        let f = Fixture::new();
        let chat = RecordingChat::new();
        let root = pid("@root:example.org");
        let cmd = || AdminCommand::Ban("@mallory:example.org".to_string());

        assert!(handle_admin(&f.ctx(), &chat, &root, cmd()).await.unwrap());
        assert!(!handle_admin(&f.ctx(), &chat, &root, cmd()).await.unwrap());
        assert!(f.gate.is_banned(&pid("@mallory:example.org")));
        assert_eq!(
            chat.last().as_deref(),
            Some("@mallory:example.org was already banned.")
        );
    }

    #[tokio::test]
    async fn test_invalid_target_is_rejected() {
        let f = Fixture::new();
        let chat = RecordingChat::new();
        let root = pid("@root:example.org");

        let changed = handle_admin(&f.ctx(), &chat, &root, AdminCommand::Ban("mallory".to_string()))
            .await
            .unwrap();
        assert!(!changed);
        assert!(chat.last().unwrap().starts_with("Invalid user id"));

        handle_admin(&f.ctx(), &chat, &root, AdminCommand::Unban(String::new()))
            .await
            .unwrap();
        assert_eq!(chat.last().as_deref(), Some(messages::UNBAN_USAGE));
        assert!(f.gate.list().is_empty());
    }

    #[tokio::test]
    async fn test_listings() {
        let f = Fixture::new();
        let chat = RecordingChat::new();
        let root = pid("@root:example.org");
        f.modes.set_mode(pid("@alice:example.org"), Mode::Merge);

        handle_admin(&f.ctx(), &chat, &root, AdminCommand::ListModes)
            .await
            .unwrap();
        assert!(chat.last().unwrap().contains("@alice:example.org: merge"));

        handle_admin(&f.ctx(), &chat, &root, AdminCommand::ListBanned)
            .await
            .unwrap();
        assert!(chat.last().unwrap().contains("Nobody is banned."));

        handle_admin(&f.ctx(), &chat, &root, AdminCommand::ListAdmins)
            .await
            .unwrap();
        assert!(chat.last().unwrap().contains("@root:example.org"));
    }

    #[tokio::test]
    async fn test_only_real_changes_are_audited() {
        let (sink, mut rx) = RecordingSink::new();
        let f = Fixture {
            audit: AuditNotifier::new(sink),
            ..Fixture::new()
        };
        let chat = RecordingChat::new();
        let root = pid("@root:example.org");
        let ban = || AdminCommand::Ban("@mallory:example.org".to_string());
        let unban = || AdminCommand::Unban("@mallory:example.org".to_string());

        handle_admin(&f.ctx(), &chat, &root, ban()).await.unwrap();
        handle_admin(&f.ctx(), &chat, &root, ban()).await.unwrap();
        handle_admin(&f.ctx(), &chat, &root, unban()).await.unwrap();
        handle_admin(&f.ctx(), &chat, &root, unban()).await.unwrap();

        assert!(next_record(&mut rx).await.contains("banned @mallory:example.org"));
        assert!(next_record(&mut rx).await.contains("unbanned @mallory:example.org"));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ban_survives_failed_reply() {
        let (sink, mut rx) = RecordingSink::new();
        let f = Fixture {
            audit: AuditNotifier::new(sink),
            ..Fixture::new()
        };
        let chat = DeadChat;
        let root = pid("@root:example.org");
        let mallory = pid("@mallory:example.org");

        let changed = handle_admin(
            &f.ctx(),
            &chat,
            &root,
            AdminCommand::Ban("@mallory:example.org".to_string()),
        )
        .await
        .unwrap();
        assert!(changed);
        assert!(f.gate.is_banned(&mallory));
        assert!(next_record(&mut rx).await.contains("banned @mallory:example.org"));
    }
}
