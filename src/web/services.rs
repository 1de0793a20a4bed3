// src/web/services.rs
use crate::contact::ContactBook;
use crate::controller::FormController;
use crate::core::{open_slots, ConfigManager, DocumentStore, GitHubMirror, RemoteMirror, SlotStore};
use crate::render::RenderContext;
use crate::session::SessionGate;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Everything the server and the CLI share, wired from configuration
pub struct Services {
    pub slots: Arc<dyn SlotStore>,
    pub store: DocumentStore,
    pub remote: Arc<dyn RemoteMirror>,
    pub session: SessionGate,
    pub controller: FormController,
    pub contacts: ContactBook,
    pub render: RenderContext,
}

impl Services {
    pub async fn wire(config: &ConfigManager) -> Result<Self> {
        let slots = open_slots(&config.storage).await?;
        let remote: Arc<dyn RemoteMirror> = Arc::new(GitHubMirror::new(config.mirror.clone())?);
        Self::with_parts(config, slots, remote).await
    }

    pub async fn with_parts(
        config: &ConfigManager,
        slots: Arc<dyn SlotStore>,
        remote: Arc<dyn RemoteMirror>,
    ) -> Result<Self> {
        let store = DocumentStore::new(slots.clone());
        let session = SessionGate::new(slots.clone(), config.admin.clone(), config.remote_token.clone());
        session
            .ensure_password_seeded()
            .await
            .context("Failed to seed the admin password")?;

        let controller = FormController::new(store.clone(), remote.clone(), session.clone());

        Ok(Self {
            contacts: ContactBook::new(slots.clone()),
            render: RenderContext::new(config.mirror.clone()),
            slots,
            store,
            remote,
            session,
            controller,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_manager::EnvironmentConfig;
    use crate::core::slots::{keys, MemorySlots};
    use crate::testing::FakeMirror;

    #[tokio::test]
    async fn test_wiring_seeds_password_and_shares_slots() {
        let config = ConfigManager::from_environment_config("local".to_string(), EnvironmentConfig::default()).unwrap();
        let slots: Arc<dyn SlotStore> = Arc::new(MemorySlots::default());

        let services = Services::with_parts(&config, slots.clone(), Arc::new(FakeMirror::default()))
            .await
            .unwrap();

        assert_eq!(
            slots.get(keys::ADMIN_PASSWORD).await.unwrap().as_deref(),
            Some("change-me")
        );
        services.session.set_credential("tok").await.unwrap();
        assert_eq!(services.controller.session().credential().await.as_deref(), Some("tok"));
    }
}
