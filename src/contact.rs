// src/contact.rs
//! Visitor messages left through the public contact form

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app_log;
use crate::core::slots::{keys, SlotStore};
use crate::types::new_id;
use crate::utils::trimmed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ContactBook {
    slots: Arc<dyn SlotStore>,
}

impl ContactBook {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self { slots }
    }

    /// Oldest first
    pub async fn list(&self) -> Result<Vec<ContactMessage>> {
        match self.slots.get(keys::CONTACT_MESSAGES).await? {
            Some(raw) => serde_json::from_str(&raw).context("Failed to parse stored contact messages"),
            None => Ok(Vec::new()),
        }
    }

    /// Append a message. Returns `Ok(None)` when a required field is blank.
    pub async fn submit(&self, name: &str, email: &str, message: &str) -> Result<Option<ContactMessage>> {
        let (name, email, message) = (trimmed(name), trimmed(email), trimmed(message));
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Ok(None);
        }

        // An unreadable list is left alone rather than overwritten
        let mut messages = self.list().await?;

        let entry = ContactMessage {
            id: new_id(),
            name,
            email,
            message,
            timestamp: Utc::now(),
        };
        messages.push(entry.clone());

        let serialized = serde_json::to_string(&messages).context("Failed to serialize contact messages")?;
        self.slots.set(keys::CONTACT_MESSAGES, &serialized).await?;

        app_log!(info, "Contact message received from {}", entry.email);
        Ok(Some(entry))
    }
}
