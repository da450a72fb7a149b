//! # Feature Plugins
//!
//! Statically linked feature modules, one per selectable mode. Each produces
//! the handler set the registry installs for its mode.

pub mod merge;
pub mod rename;

use std::sync::Arc;

use crate::domain::config::FeaturesConfig;
use crate::domain::traits::{ChatProvider, FeaturePlugin};
use crate::domain::types::{FeatureEvent, FileRef};
use crate::strings::features::MISSING_FILE;

/// All feature plugins built from configuration.
pub fn builtin(config: &FeaturesConfig) -> Vec<Arc<dyn FeaturePlugin>> {
    vec![
        Arc::new(rename::RenamePlugin::new(config.rename.clone())),
        Arc::new(merge::MergePlugin::new(config.merge.clone())),
    ]
}

pub(crate) async fn say(chat: &dyn ChatProvider, text: &str) -> anyhow::Result<()> {
    chat.send_message(text)
        .await
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(e))
}

/// The file carried by `event`, replying when there is none.
pub(crate) async fn attached_file<'a>(
    chat: &dyn ChatProvider,
    event: &'a FeatureEvent,
) -> anyhow::Result<Option<&'a FileRef>> {
    match &event.file {
        Some(file) => Ok(Some(file)),
        None => {
            say(chat, MISSING_FILE).await?;
            Ok(None)
        }
    }
}
