//! # Status Command
//!
//! Handles `.status`: the caller's mode and the registry's active handler set.

use anyhow::Result;

use crate::domain::config::Isolation;
use crate::domain::traits::ChatProvider;
use crate::domain::types::Mode;

pub async fn handle_status(
    chat: &dyn ChatProvider,
    mode: Mode,
    active: Option<Mode>,
    isolation: Isolation,
) -> Result<()> {
    let msg = crate::strings::messages::status_msg(mode, active, &isolation.to_string());
    chat.send_message(&msg).await.map(|_| ()).map_err(|e| anyhow::anyhow!(e))
}
