//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.

use crate::domain::types::{EventKind, Mode, ParticipantId};

pub const AUTH_DENIED: &str = "🚫 **Authorization Denied**.";
pub const UNKNOWN_COMMAND: &str = "❓ Unknown command. Send `.help` for the list.";
pub const BANNED: &str = "🚫 You are banned from using this bot.";
pub const SELECT_MODE_FIRST: &str =
    "⚠️ Please select a mode first: `.rename` or `.merge`.";
pub const STALE_HANDLER_SET: &str =
    "🔁 The mode was changed by another action, please retry.";
pub const ACTION_FAILED: &str = "❌ Something went wrong while handling that. Please try again.";

pub fn mode_set(mode: Mode) -> String {
    format!("✅ Mode set to **{mode}**.")
}

pub fn switch_failed(mode: Mode) -> String {
    format!("❌ Failed to switch mode to **{mode}**. Your previous mode is unchanged.")
}

pub fn unsupported_action(kind: EventKind, mode: Mode) -> String {
    format!("⚠️ Unsupported action for this mode: `{kind}` is not available in **{mode}** mode.")
}

pub fn status_msg(mode: Mode, active: Option<Mode>, isolation: &str) -> String {
    let active = active.map(|m| m.to_string()).unwrap_or_else(|| "none".to_string());
    format!("**Your mode**: {mode}\n**Active handlers**: {active}\n**Isolation**: {isolation}")
}

pub const BAN_USAGE: &str = "Usage: `.ban <@user:server>`";
pub const UNBAN_USAGE: &str = "Usage: `.unban <@user:server>`";

pub fn invalid_participant(err: &str) -> String {
    format!("Invalid user id: {err}")
}

pub fn banned_ok(id: &ParticipantId, changed: bool) -> String {
    if changed {
        format!("🔨 Banned {id}.")
    } else {
        format!("{id} was already banned.")
    }
}

pub fn unbanned_ok(id: &ParticipantId, changed: bool) -> String {
    if changed {
        format!("🕊️ Unbanned {id}.")
    } else {
        format!("{id} was not banned.")
    }
}

pub fn listing(title: &str, lines: &[String], empty: &str) -> String {
    if lines.is_empty() {
        format!("**{title}**\n{empty}")
    } else {
        format!("**{title}**\n{}", lines.join("\n"))
    }
}

pub const LOGIN_SUCCESS: &str = "Logged in successfully!";

pub fn config_loaded(user: &str) -> String {
    format!("Loaded configuration for user: {user}")
}

pub fn invite_received(room_id: &str) -> String {
    format!("💌 Received invite for room {room_id:?}")
}

pub fn join_invite_fail(err: &str) -> String {
    format!("Failed to join room after invite: {err}")
}

pub fn sync_loop_fail(err: &str) -> String {
    format!("Sync loop failed: {err}")
}
