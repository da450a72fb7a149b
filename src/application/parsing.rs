//! # Parsing Logic
//!
//! Turns inbound message text into an [`Action`]. Commands use the `.` prefix;
//! anything else is not addressed to the bot.

use crate::domain::types::{Action, AdminCommand, EventKind, FeatureEvent, FileRef, Mode};

pub const COMMAND_PREFIX: char = '.';

/// Parses a text message. Returns `None` for plain chatter.
pub fn parse_text(body: &str) -> Option<Action> {
    let msg = body.trim();
    let rest = msg.strip_prefix(COMMAND_PREFIX)?;
    if rest.is_empty() || rest.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let (cmd, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    let cmd = cmd.to_lowercase();

    let action = match cmd.as_str() {
        "rename" => Action::SelectMode(Mode::Rename),
        "merge" => Action::SelectMode(Mode::Merge),
        "start" => Action::Feature(FeatureEvent::command(EventKind::StartCommand)),
        "delthumb" => Action::Feature(FeatureEvent::command(EventKind::DeleteThumbnail)),
        "done" => Action::Feature(FeatureEvent::command(EventKind::Finish)),
        "clear" => Action::Feature(FeatureEvent::command(EventKind::Clear)),
        "ban" => Action::Admin(AdminCommand::Ban(first_arg(args))),
        "unban" => Action::Admin(AdminCommand::Unban(first_arg(args))),
        "banned" => Action::Admin(AdminCommand::ListBanned),
        "modes" => Action::Admin(AdminCommand::ListModes),
        "admins" => Action::Admin(AdminCommand::ListAdmins),
        "status" => Action::Status,
        "help" => Action::Help,
        _ => Action::Unknown(cmd),
    };
    Some(action)
}

/// A document or media upload.
pub fn file_upload(file: FileRef) -> Action {
    Action::Feature(FeatureEvent::with_file(EventKind::FileUpload, file))
}

/// An image, taken as the participant's custom thumbnail.
pub fn thumbnail_upload(file: FileRef) -> Action {
    Action::Feature(FeatureEvent::with_file(EventKind::SaveThumbnail, file))
}

fn first_arg(args: &str) -> String {
    args.split_whitespace().next().unwrap_or_default().to_string()
}
