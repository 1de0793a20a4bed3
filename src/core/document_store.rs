// src/core/document_store.rs
//! Whole-document persistence on top of a slot store

use std::sync::Arc;

use crate::app_log;
use crate::core::slots::{keys, SlotStore};
use crate::types::ResumeDocument;

#[derive(Clone)]
pub struct DocumentStore {
    slots: Arc<dyn SlotStore>,
}

impl DocumentStore {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &Arc<dyn SlotStore> {
        &self.slots
    }

    /// Read the document. Falls back to (and persists) the seed when the slot is
    /// empty, unreadable or unparseable. Anything not stored in canonical form is
    /// written back, so `save(load())` leaves the slot untouched.
    pub async fn load(&self) -> ResumeDocument {
        let raw = match self.slots.get(keys::DOCUMENT).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                app_log!(info, "No stored document, seeding defaults");
                return self.reseed().await;
            }
            Err(e) => {
                app_log!(error, "Failed to read stored document, resetting: {:#}", e);
                return self.reseed().await;
            }
        };

        match ResumeDocument::from_json(&raw) {
            Ok((doc, migrated)) => {
                if migrated {
                    app_log!(info, "Stored document migrated to current shape");
                }
                let canonical = doc.to_json().map_or(false, |c| c == raw);
                if migrated || !canonical {
                    self.save(&doc).await;
                }
                doc
            }
            Err(e) => {
                app_log!(error, "Failed to parse stored document, resetting: {:#}", e);
                self.reseed().await
            }
        }
    }

    /// Replace the stored document. Failures are logged, never returned.
    pub async fn save(&self, doc: &ResumeDocument) {
        let serialized = match doc.to_json() {
            Ok(s) => s,
            Err(e) => {
                app_log!(error, "Failed to serialize document: {:#}", e);
                return;
            }
        };

        if let Err(e) = self.slots.set(keys::DOCUMENT, &serialized).await {
            app_log!(error, "Failed to persist document: {:#}", e);
        }
    }

    /// Whether a local copy exists at all, parseable or not
    pub async fn has_local(&self) -> bool {
        matches!(self.slots.get(keys::DOCUMENT).await, Ok(Some(_)))
    }

    /// Clear the slot; the next load seeds again
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.slots.remove(keys::DOCUMENT).await
    }

    async fn reseed(&self) -> ResumeDocument {
        let seed = ResumeDocument::seed();
        self.save(&seed).await;
        seed
    }
}
