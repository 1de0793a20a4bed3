// src/session.rs
//! Admin session gate. A stored boolean flag plus a password check - this keeps casual
//! visitors out of the admin surface and nothing more.

use anyhow::Result;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use std::sync::Arc;
use thiserror::Error;

use crate::app_log;
use crate::core::config_manager::AdminConfig;
use crate::core::slots::{keys, SlotStore};

pub const SESSION_COOKIE: &str = "cv_admin";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Current password and the new password (twice) are required")]
    IncompleteForm,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("New password and confirmation do not match")]
    ConfirmationMismatch,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::IncompleteForm => "INCOMPLETE_FORM",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::ConfirmationMismatch => "CONFIRMATION_MISMATCH",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[derive(Clone)]
pub struct SessionGate {
    slots: Arc<dyn SlotStore>,
    admin: AdminConfig,
    env_credential: Option<String>,
}

impl SessionGate {
    pub fn new(slots: Arc<dyn SlotStore>, admin: AdminConfig, env_credential: Option<String>) -> Self {
        Self {
            slots,
            admin,
            env_credential,
        }
    }

    async fn expected_password(&self) -> Result<String> {
        Ok(self
            .slots
            .get(keys::ADMIN_PASSWORD)
            .await?
            .unwrap_or_else(|| self.admin.password.clone()))
    }

    /// Store the configured password on first run so later changes have something to replace
    pub async fn ensure_password_seeded(&self) -> Result<()> {
        if self.slots.get(keys::ADMIN_PASSWORD).await?.is_none() {
            self.slots
                .set(keys::ADMIN_PASSWORD, &self.admin.password)
                .await?;
        }
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        let expected = self.expected_password().await?;

        if username.trim() != self.admin.username || password.trim() != expected {
            app_log!(warn, "Rejected admin login for '{}'", username.trim());
            return Err(SessionError::InvalidCredentials);
        }

        self.slots.set(keys::ADMIN_SESSION, "true").await?;
        app_log!(info, "Admin '{}' logged in", self.admin.username);
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.slots.remove(keys::ADMIN_SESSION).await?;
        app_log!(info, "Admin logged out");
        Ok(())
    }

    pub async fn is_logged_in(&self) -> bool {
        matches!(
            self.slots.get(keys::ADMIN_SESSION).await,
            Ok(Some(flag)) if flag == "true"
        )
    }

    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), SessionError> {
        let (current, new, confirm) = (current.trim(), new.trim(), confirm.trim());

        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(SessionError::IncompleteForm);
        }
        if current != self.expected_password().await? {
            return Err(SessionError::WrongPassword);
        }
        if new != confirm {
            return Err(SessionError::ConfirmationMismatch);
        }

        self.slots.set(keys::ADMIN_PASSWORD, new).await?;
        app_log!(info, "Admin password changed");
        Ok(())
    }

    /// Remote write credential; the environment wins over the stored slot
    pub async fn credential(&self) -> Option<String> {
        if let Some(token) = &self.env_credential {
            return Some(token.clone());
        }
        match self.slots.get(keys::REMOTE_TOKEN).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                app_log!(error, "Failed to read remote credential: {:#}", e);
                None
            }
        }
    }

    pub async fn set_credential(&self, token: &str) -> Result<()> {
        self.slots.set(keys::REMOTE_TOKEN, token.trim()).await?;
        app_log!(info, "Remote credential stored");
        Ok(())
    }

    pub async fn clear_credential(&self) -> Result<()> {
        self.slots.remove(keys::REMOTE_TOKEN).await
    }
}

/// Request guard for admin routes: the stored session flag and the private cookie set at login
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let gate = match req.guard::<&State<SessionGate>>().await {
            Outcome::Success(gate) => gate,
            Outcome::Error((status, _)) => {
                return Outcome::Error((
                    status,
                    SessionError::Storage(anyhow::anyhow!("Session gate not configured")),
                ))
            }
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let has_cookie = req
            .cookies()
            .get_private(SESSION_COOKIE)
            .map(|c| c.value() == "1")
            .unwrap_or(false);

        if has_cookie && gate.is_logged_in().await {
            Outcome::Success(AdminSession)
        } else {
            app_log!(warn, "Admin route requested without a session");
            Outcome::Error((Status::Unauthorized, SessionError::InvalidCredentials))
        }
    }
}
