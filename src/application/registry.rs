//! # Handler Set Registry
//!
//! Owns the loaded handler sets and routes feature events into them.
//!
//! `swap` takes the write half of a single `RwLock`, `dispatch` holds the read
//! half for the whole handler call, so a dispatch always runs against a fully
//! installed set and a swap waits for in-flight handlers to finish.
//!
//! With [`Isolation::Shared`] there is exactly one installed set and a swap
//! replaces it for everyone. With [`Isolation::PerMode`] every mode keeps its
//! own set and dispatch resolves by the caller's mode.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::config::Isolation;
use crate::domain::error::{DispatchError, LoadError};
use crate::domain::traits::{ChatProvider, FeaturePlugin, HandlerSet};
use crate::domain::types::{FeatureEvent, Mode, ParticipantId};

#[derive(Debug, Default)]
struct Installed {
    /// Mode of the most recent successful swap.
    active: Option<Mode>,
    sets: HashMap<Mode, HandlerSet>,
}

pub struct HandlerSetRegistry {
    plugins: HashMap<Mode, Arc<dyn FeaturePlugin>>,
    isolation: Isolation,
    installed: RwLock<Installed>,
}

impl HandlerSetRegistry {
    pub fn new(isolation: Isolation) -> Self {
        Self {
            plugins: HashMap::new(),
            isolation,
            installed: RwLock::new(Installed::default()),
        }
    }

    pub fn register(mut self, plugin: Arc<dyn FeaturePlugin>) -> Self {
        let mode = plugin.mode();
        if self.plugins.insert(mode, plugin).is_some() {
            tracing::warn!("Replacing previously registered plugin for mode {}", mode);
        }
        self
    }

    pub fn isolation(&self) -> Isolation {
        self.isolation
    }

    pub async fn active_mode(&self) -> Option<Mode> {
        self.installed.read().await.active
    }

    /// Loads every registered plugin up front. Only meaningful for per-mode isolation;
    /// failures are logged and retried on the next swap into that mode.
    pub async fn preload(&self) {
        if self.isolation != Isolation::PerMode {
            return;
        }
        let mut installed = self.installed.write().await;
        for (mode, plugin) in &self.plugins {
            if installed.sets.contains_key(mode) {
                continue;
            }
            match load_checked(*mode, plugin.as_ref()).await {
                Ok(set) => {
                    tracing::info!("Preloaded {} handler set", mode);
                    installed.sets.insert(*mode, set);
                }
                Err(e) => tracing::error!("Failed to preload {} handler set: {}", mode, e),
            }
        }
    }

    /// Makes `mode` the active handler set.
    ///
    /// The new set is loaded before anything is retired, so on error the
    /// previously installed set stays in place.
    pub async fn swap(&self, mode: Mode) -> Result<(), LoadError> {
        if !mode.is_selectable() {
            return Err(LoadError::NotSelectable(mode));
        }
        let plugin = self
            .plugins
            .get(&mode)
            .cloned()
            .ok_or(LoadError::Unregistered(mode))?;

        let mut installed = self.installed.write().await;
        if installed.sets.contains_key(&mode) {
            installed.active = Some(mode);
            tracing::debug!("Handler set {} already installed", mode);
            return Ok(());
        }

        let set = load_checked(mode, plugin.as_ref()).await?;

        let retired: Vec<Mode> = match self.isolation {
            Isolation::Shared => installed.sets.drain().map(|(m, _)| m).collect(),
            Isolation::PerMode => Vec::new(),
        };
        installed.sets.insert(mode, set);
        installed.active = Some(mode);

        for old in retired {
            if let Some(p) = self.plugins.get(&old) {
                p.unload().await;
                tracing::info!("Unloaded {} handler set", old);
            }
        }
        tracing::info!("Installed {} handler set ({} isolation)", mode, self.isolation);
        Ok(())
    }

    /// Routes `event` to the handler bound for its kind in `mode`'s handler set.
    ///
    /// Fails with `StaleHandlerSet` rather than running another mode's handler.
    pub async fn dispatch(
        &self,
        mode: Mode,
        chat: &dyn ChatProvider,
        sender: &ParticipantId,
        event: &FeatureEvent,
    ) -> Result<(), DispatchError> {
        let installed = self.installed.read().await;
        let set = match self.isolation {
            Isolation::Shared => installed
                .active
                .filter(|active| *active == mode)
                .and_then(|m| installed.sets.get(&m)),
            Isolation::PerMode => installed.sets.get(&mode),
        }
        .ok_or(DispatchError::StaleHandlerSet {
            requested: mode,
            active: installed.active,
        })?;

        let handler = set.handler(event.kind).ok_or(DispatchError::NoHandler {
            mode,
            kind: event.kind,
        })?;

        handler
            .handle(chat, sender, event)
            .await
            .map_err(DispatchError::Handler)
    }
}

async fn load_checked(mode: Mode, plugin: &dyn FeaturePlugin) -> Result<HandlerSet, LoadError> {
    let set = plugin.load().await?;
    if set.mode() != mode {
        plugin.unload().await;
        return Err(LoadError::Mismatch {
            expected: mode,
            actual: set.mode(),
        });
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EventKind;
    use crate::testing::{RecordingChat, StubPlugin, pid};

    fn shared(plugins: &[Arc<StubPlugin>]) -> HandlerSetRegistry {
        plugins
            .iter()
            .fold(HandlerSetRegistry::new(Isolation::Shared), |r, p| {
                r.register(p.clone())
            })
    }

    #[tokio::test]
    async fn test_swap_then_dispatch() {
        let rename = StubPlugin::new(Mode::Rename, &[EventKind::FileUpload]);
        let merge = StubPlugin::new(Mode::Merge, &[EventKind::FileUpload]);
        let registry = shared(&[rename.clone(), merge.clone()]);
        let chat = RecordingChat::new();
        let alice = pid("@alice:example.org");
        let event = FeatureEvent::command(EventKind::FileUpload);

        registry.swap(Mode::Rename).await.unwrap();
        registry
            .dispatch(Mode::Rename, &chat, &alice, &event)
            .await
            .unwrap();
        assert_eq!(chat.sent(), vec!["rename:file upload"]);

        let err = registry
            .dispatch(Mode::Merge, &chat, &alice, &event)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::StaleHandlerSet {
                requested: Mode::Merge,
                active: Some(Mode::Rename)
            }
        ));
        assert_eq!(merge.handled(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_before_any_swap_is_stale() {
        let registry = shared(&[StubPlugin::new(Mode::Rename, &[EventKind::StartCommand])]);
        let chat = RecordingChat::new();
        let err = registry
            .dispatch(
                Mode::Rename,
                &chat,
                &pid("@alice:example.org"),
                &FeatureEvent::command(EventKind::StartCommand),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::StaleHandlerSet { active: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_shared_swap_unloads_previous() {
        let rename = StubPlugin::new(Mode::Rename, &[]);
        let merge = StubPlugin::new(Mode::Merge, &[]);
        let registry = shared(&[rename.clone(), merge.clone()]);

        registry.swap(Mode::Rename).await.unwrap();
        registry.swap(Mode::Merge).await.unwrap();
        assert_eq!(rename.loads(), 1);
        assert_eq!(rename.unloads(), 1);
        assert_eq!(merge.loads(), 1);
        assert_eq!(registry.active_mode().await, Some(Mode::Merge));

        // Swapping into the installed mode does not reload it.
        registry.swap(Mode::Merge).await.unwrap();
        assert_eq!(merge.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_swap_keeps_previous_set() {
        let rename = StubPlugin::new(Mode::Rename, &[EventKind::FileUpload]);
        let merge = StubPlugin::failing(Mode::Merge);
        let registry = shared(&[rename.clone(), merge.clone()]);
        let chat = RecordingChat::new();
        let alice = pid("@alice:example.org");

        registry.swap(Mode::Rename).await.unwrap();
        let err = registry.swap(Mode::Merge).await.unwrap_err();
        assert!(matches!(err, LoadError::Init { mode: Mode::Merge, .. }));
        assert_eq!(registry.active_mode().await, Some(Mode::Rename));
        assert_eq!(rename.unloads(), 0);

        registry
            .dispatch(
                Mode::Rename,
                &chat,
                &alice,
                &FeatureEvent::command(EventKind::FileUpload),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_swap_rejects_unset_and_unregistered() {
        let registry = shared(&[StubPlugin::new(Mode::Rename, &[])]);
        assert!(matches!(
            registry.swap(Mode::Unset).await,
            Err(LoadError::NotSelectable(Mode::Unset))
        ));
        assert!(matches!(
            registry.swap(Mode::Merge).await,
            Err(LoadError::Unregistered(Mode::Merge))
        ));
        assert_eq!(registry.active_mode().await, None);
    }

    #[tokio::test]
    async fn test_mismatched_plugin_is_rejected() {
        let liar = StubPlugin::producing(Mode::Merge, Mode::Rename);
        let registry = HandlerSetRegistry::new(Isolation::Shared).register(liar.clone());
        assert!(matches!(
            registry.swap(Mode::Merge).await,
            Err(LoadError::Mismatch {
                expected: Mode::Merge,
                actual: Mode::Rename
            })
        ));
        assert_eq!(liar.unloads(), 1);
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let registry = shared(&[StubPlugin::new(Mode::Rename, &[EventKind::FileUpload])]);
        registry.swap(Mode::Rename).await.unwrap();
        let err = registry
            .dispatch(
                Mode::Rename,
                &RecordingChat::new(),
                &pid("@alice:example.org"),
                &FeatureEvent::command(EventKind::Finish),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::NoHandler {
                mode: Mode::Rename,
                kind: EventKind::Finish
            }
        ));
    }

    #[tokio::test]
    async fn test_per_mode_routes_by_requested_mode() {
        let rename = StubPlugin::new(Mode::Rename, &[EventKind::FileUpload]);
        let merge = StubPlugin::new(Mode::Merge, &[EventKind::FileUpload]);
        let registry = HandlerSetRegistry::new(Isolation::PerMode)
            .register(rename.clone())
            .register(merge.clone());
        registry.preload().await;

        registry.swap(Mode::Merge).await.unwrap();
        let chat = RecordingChat::new();
        let event = FeatureEvent::command(EventKind::FileUpload);
        registry
            .dispatch(Mode::Rename, &chat, &pid("@bob:example.org"), &event)
            .await
            .unwrap();
        registry
            .dispatch(Mode::Merge, &chat, &pid("@alice:example.org"), &event)
            .await
            .unwrap();

        assert_eq!(chat.sent(), vec!["rename:file upload", "merge:file upload"]);
        assert_eq!(rename.unloads(), 0);
        assert_eq!(rename.loads(), 1);
        assert_eq!(merge.loads(), 1);
    }

    #[tokio::test]
    async fn test_per_mode_retries_failed_preload() {
        let merge = StubPlugin::failing(Mode::Merge);
        let registry = HandlerSetRegistry::new(Isolation::PerMode).register(merge.clone());
        registry.preload().await;
        assert!(registry.swap(Mode::Merge).await.is_err());
        assert_eq!(merge.loads(), 2);
        assert_eq!(registry.active_mode().await, None);
    }
}
