//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Matrix connection, admin list, audit channel,
//! dispatch strategy and feature plugin settings.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::types::ParticipantId;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML")
    }

    pub fn state_path(&self) -> PathBuf {
        self.system.data_dir.join("state.json")
    }
}

/// System-level settings for the bot.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    /// Participants allowed to run administrator commands.
    #[serde(default)]
    pub admin: Vec<ParticipantId>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Snapshot modes and bans to `<data_dir>/state.json`.
    #[serde(default)]
    pub persist_state: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            admin: Vec::new(),
            data_dir: default_data_dir(),
            persist_state: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct AuditConfig {
    /// Room id that receives audit records. Records are only logged when unset.
    #[serde(default)]
    pub room: Option<String>,
}

/// How handler sets are shared between participants.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// One active handler set for everyone; swapping affects all participants.
    Shared,
    /// Every mode keeps its own loaded set; dispatch resolves by the caller's mode.
    #[default]
    PerMode,
}

impl std::fmt::Display for Isolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Isolation::Shared => f.write_str("shared"),
            Isolation::PerMode => f.write_str("per_mode"),
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct DispatchConfig {
    #[serde(default)]
    pub isolation: Isolation,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FeaturesConfig {
    #[serde(default)]
    pub rename: RenameConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenameConfig {
    #[serde(default = "default_rename_dir")]
    pub work_dir: PathBuf,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            work_dir: default_rename_dir(),
        }
    }
}

fn default_rename_dir() -> PathBuf {
    PathBuf::from("data/rename")
}

#[derive(Debug, Deserialize, Clone)]
pub struct MergeConfig {
    #[serde(default = "default_merge_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            work_dir: default_merge_dir(),
            max_files: default_max_files(),
        }
    }
}

fn default_merge_dir() -> PathBuf {
    PathBuf::from("data/merge")
}

fn default_max_files() -> usize {
    10
}

/// Configuration for various connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub matrix: MatrixConfig,
}

/// Specific configuration for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub username: String,
    pub password: String,
    pub homeserver: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
