//! # Domain Types
//!
//! Common data structures and enums used across the dispatch core:
//! participants, modes, inbound events and audit records.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::domain::error::ParticipantIdError;

static PARTICIPANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@[^:\s]+:[A-Za-z0-9.\-]+(:[0-9]{1,5})?$").unwrap()
});

/// Opaque identifier of a conversation principal, as reported by the transport.
///
/// For Matrix this is the sender's fully qualified user id (`@alice:example.org`).
/// Construction goes through [`ParticipantId::parse`], so a value of this type is
/// always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(raw: &str) -> Result<Self, ParticipantIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ParticipantIdError::Empty);
        }
        if !PARTICIPANT_RE.is_match(raw) {
            return Err(ParticipantIdError::Malformed(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ParticipantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

/// Feature mode a participant has selected.
///
/// `Unset` is never stored; it is what the mode store reports for anyone
/// who has not picked a mode yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Unset,
    Rename,
    Merge,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Unset => "unset",
            Mode::Rename => "rename",
            Mode::Merge => "merge",
        }
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self, Mode::Unset)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(Mode::Rename),
            "merge" => Ok(Mode::Merge),
            "unset" => Ok(Mode::Unset),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Kind of feature event a handler set can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartCommand,
    FileUpload,
    SaveThumbnail,
    DeleteThumbnail,
    Finish,
    Clear,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StartCommand => "start",
            EventKind::FileUpload => "file upload",
            EventKind::SaveThumbnail => "save thumbnail",
            EventKind::DeleteThumbnail => "delete thumbnail",
            EventKind::Finish => "finish",
            EventKind::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// Reference to a file the transport received. The bytes stay with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    /// Transport-specific content locator (an `mxc://` URI for Matrix).
    pub source: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEvent {
    pub kind: EventKind,
    pub file: Option<FileRef>,
}

impl FeatureEvent {
    pub fn command(kind: EventKind) -> Self {
        Self { kind, file: None }
    }

    pub fn with_file(kind: EventKind, file: FileRef) -> Self {
        Self {
            kind,
            file: Some(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Ban(String),
    Unban(String),
    ListBanned,
    ListModes,
    ListAdmins,
}

/// What the participant asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectMode(Mode),
    Feature(FeatureEvent),
    Admin(AdminCommand),
    Status,
    Help,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: ParticipantId,
    pub action: Action,
}

/// State transition recorded for the audit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ModeSelected { from: Mode, to: Mode },
    ModeSwitchFailed { to: Mode, reason: String },
    Banned { target: ParticipantId },
    Unbanned { target: ParticipantId },
}

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub at: DateTime<Utc>,
    pub participant: ParticipantId,
    pub transition: Transition,
}

impl AuditRecord {
    pub fn now(participant: ParticipantId, transition: Transition) -> Self {
        Self {
            at: Utc::now(),
            participant,
            transition,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.transition, Transition::ModeSwitchFailed { .. })
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.at.format("%Y-%m-%d %H:%M:%S UTC");
        match &self.transition {
            Transition::ModeSelected { from, to } => {
                write!(f, "[{ts}] {} switched mode {from} -> {to}", self.participant)
            }
            Transition::ModeSwitchFailed { to, reason } => write!(
                f,
                "[{ts}] {} failed to switch to {to}: {reason}",
                self.participant
            ),
            Transition::Banned { target } => {
                write!(f, "[{ts}] {} banned {target}", self.participant)
            }
            Transition::Unbanned { target } => {
                write!(f, "[{ts}] {} unbanned {target}", self.participant)
            }
        }
    }
}
