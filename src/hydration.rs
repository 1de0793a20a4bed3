// src/hydration.rs
//! Front-stage startup: a local copy always wins, the remote is only consulted on first run

use serde::Serialize;

use crate::app_log;
use crate::core::{DocumentStore, RemoteMirror};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationOutcome {
    LocalKept,
    AdoptedRemote,
    RemoteUnavailable,
}

pub async fn hydrate_front(
    store: &DocumentStore,
    remote: &dyn RemoteMirror,
    credential: Option<&str>,
) -> HydrationOutcome {
    if store.has_local().await {
        return HydrationOutcome::LocalKept;
    }

    match remote.fetch_document(credential).await {
        Some(doc) => {
            store.save(&doc).await;
            app_log!(info, "No local document, adopted the remote copy");
            HydrationOutcome::AdoptedRemote
        }
        None => {
            app_log!(info, "No local document and no remote copy, using defaults");
            HydrationOutcome::RemoteUnavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemorySlots;
    use crate::render::{render_page, RenderContext};
    use crate::core::config_manager::MirrorConfig;
    use crate::testing::FakeMirror;
    use crate::types::ResumeDocument;
    use std::sync::Arc;

    fn named(name: &str) -> ResumeDocument {
        let mut doc = ResumeDocument::seed();
        doc.profile.name = name.to_string();
        doc
    }

    #[tokio::test]
    async fn test_local_wins_over_remote() {
        let store = DocumentStore::new(Arc::new(MemorySlots::default()));
        store.save(&named("Local Person")).await;
        let remote = FakeMirror::with_document(named("Remote Person"));

        let outcome = hydrate_front(&store, &remote, None).await;
        assert_eq!(outcome, HydrationOutcome::LocalKept);

        let html = render_page(&store.load().await, &RenderContext::new(MirrorConfig::default()));
        assert!(html.contains("Local Person"));
        assert!(!html.contains("Remote Person"));
    }

    #[tokio::test]
    async fn test_empty_local_adopts_remote() {
        let store = DocumentStore::new(Arc::new(MemorySlots::default()));
        let remote = FakeMirror::with_document(named("Remote Person"));

        assert_eq!(hydrate_front(&store, &remote, None).await, HydrationOutcome::AdoptedRemote);
        assert_eq!(store.load().await.profile.name, "Remote Person");
    }

    #[tokio::test]
    async fn test_unreachable_remote_leaves_store_empty() {
        let store = DocumentStore::new(Arc::new(MemorySlots::default()));

        let outcome = hydrate_front(&store, &FakeMirror::offline(), None).await;
        assert_eq!(outcome, HydrationOutcome::RemoteUnavailable);
        assert!(!store.has_local().await);
    }
}
