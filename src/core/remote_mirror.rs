// src/core/remote_mirror.rs
//! Remote mirror - publishes the document and images to a GitHub repository through the
//! contents API, and reads them back through the public CDN/raw mirrors

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::app_log;
use crate::core::asset_validator::{AssetValidationError, AssetValidator};
use crate::core::config_manager::MirrorConfig;
use crate::types::response::{
    ApiErrorBody, ContentEntry, PutContentRequest, PutContentResponse, RepoResponse, UserResponse,
};
use crate::types::ResumeDocument;
use crate::utils::asset_file_name;

const USER_AGENT: &str = concat!("cvfolio/", env!("CARGO_PKG_VERSION"));
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("No remote credential configured")]
    MissingCredential,

    #[error("Remote rejected the write, revision marker is stale (status {status}): {message}")]
    Conflict { status: u16, message: String },

    #[error("Remote API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid asset: {0}")]
    InvalidAsset(#[from] AssetValidationError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl MirrorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::Conflict { .. } => "REMOTE_CONFLICT",
            Self::Api { .. } => "REMOTE_API_ERROR",
            Self::Http(_) => "REMOTE_UNREACHABLE",
            Self::InvalidAsset(e) => e.error_type.code(),
            Self::Serialize(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishReceipt {
    pub commit: String,
    /// Revision marker of the file after the write
    pub revision: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialStatus {
    pub login: String,
    pub can_push: bool,
    pub can_pull: bool,
}

/// The remote port. Fetches never fail loudly; writes need a credential.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn fetch_document(&self, credential: Option<&str>) -> Option<ResumeDocument>;

    async fn publish_document(
        &self,
        doc: &ResumeDocument,
        credential: Option<&str>,
    ) -> Result<PublishReceipt, MirrorError>;

    /// Store an image and return its public URL
    async fn upload_asset(
        &self,
        file_name: &str,
        bytes: &[u8],
        credential: Option<&str>,
    ) -> Result<String, MirrorError>;

    async fn verify_credential(&self, credential: &str) -> Result<CredentialStatus, MirrorError>;
}

pub(crate) fn require_credential(credential: Option<&str>) -> Result<&str, MirrorError> {
    credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(MirrorError::MissingCredential)
}

/// Map a failed contents-API write to an error. 409 and 412 are stale markers;
/// 422 is what GitHub answers when an existing file is written without one.
pub fn classify_write_failure(status: StatusCode, body: &str) -> MirrorError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => MirrorError::Conflict {
            status: status.as_u16(),
            message,
        },
        StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => MirrorError::Conflict {
            status: status.as_u16(),
            message,
        },
        _ => MirrorError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

pub struct GitHubMirror {
    client: reqwest::Client,
    config: MirrorConfig,
}

impl GitHubMirror {
    pub fn new(config: MirrorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: MirrorConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    fn authed(&self, request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, JSON_MEDIA_TYPE)
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, label: &str) -> Option<String> {
        match request.send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    app_log!(warn, "Failed to read {} response: {}", label, e);
                    None
                }
            },
            Ok(response) => {
                app_log!(warn, "{} fetch returned status {}", label, response.status());
                None
            }
            Err(e) => {
                app_log!(warn, "{} fetch failed: {}", label, e);
                None
            }
        }
    }

    /// Current revision marker of `path`, `None` when the file does not exist yet
    async fn current_revision(&self, path: &str, token: &str) -> Result<Option<String>, MirrorError> {
        let response = self
            .authed(self.client.get(self.config.contents_url(path)), token)
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_write_failure(status, &body));
        }

        let entry: ContentEntry = response.json().await?;
        Ok(Some(entry.sha))
    }

    async fn put_file(
        &self,
        path: &str,
        bytes: &[u8],
        message: String,
        sha: Option<String>,
        token: &str,
    ) -> Result<PutContentResponse, MirrorError> {
        let body = PutContentRequest {
            message,
            content: STANDARD.encode(bytes),
            branch: &self.config.branch,
            sha,
        };

        app_log!(trace, "PUT {}", self.config.contents_url(path));

        let response = self
            .authed(self.client.put(self.config.contents_url(path)), token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json::<PutContentResponse>().await?)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(error, "Remote write of {} failed ({}): {}", path, status, error_text);
            Err(classify_write_failure(status, &error_text))
        }
    }
}

#[async_trait]
impl RemoteMirror for GitHubMirror {
    async fn fetch_document(&self, credential: Option<&str>) -> Option<ResumeDocument> {
        let bust = Utc::now().timestamp_millis().to_string();
        let path = &self.config.data_path;

        let mut body = self
            .get_text(
                self.client.get(self.config.cdn_url(path)).query(&[("t", &bust)]),
                "CDN",
            )
            .await;

        if body.is_none() {
            body = self
                .get_text(
                    self.client.get(self.config.raw_url(path)).query(&[("t", &bust)]),
                    "Raw",
                )
                .await;
        }

        if body.is_none() {
            if let Ok(token) = require_credential(credential) {
                let request = self
                    .client
                    .get(self.config.contents_url(path))
                    .query(&[("ref", self.config.branch.as_str())])
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header(ACCEPT, RAW_MEDIA_TYPE);
                body = self.get_text(request, "Contents API").await;
            }
        }

        let body = body?;
        match ResumeDocument::from_json(&body) {
            Ok((doc, _)) => {
                app_log!(info, "Loaded document from remote mirror");
                Some(doc)
            }
            Err(e) => {
                app_log!(warn, "Remote document is not usable: {:#}", e);
                None
            }
        }
    }

    async fn publish_document(
        &self,
        doc: &ResumeDocument,
        credential: Option<&str>,
    ) -> Result<PublishReceipt, MirrorError> {
        let token = require_credential(credential)?;
        let path = &self.config.data_path;

        let sha = self.current_revision(path, token).await?;
        let content = serde_json::to_string_pretty(doc)?;

        let response = self
            .put_file(
                path,
                content.as_bytes(),
                format!("Update {}", path),
                sha,
                token,
            )
            .await?;

        app_log!(info, "Published document, commit {}", response.commit.sha);

        Ok(PublishReceipt {
            commit: response.commit.sha,
            revision: response.content.map(|c| c.sha),
            published_at: Utc::now(),
        })
    }

    async fn upload_asset(
        &self,
        file_name: &str,
        bytes: &[u8],
        credential: Option<&str>,
    ) -> Result<String, MirrorError> {
        let token = require_credential(credential)?;
        AssetValidator::validate_image(file_name, bytes)?;

        let stored_name = asset_file_name(Utc::now().timestamp_millis(), file_name);
        let path = format!("{}/{}", self.config.asset_dir.trim_matches('/'), stored_name);

        self.put_file(&path, bytes, format!("Add image: {}", stored_name), None, token)
            .await?;

        app_log!(info, "Uploaded asset {}", path);
        Ok(self.config.cdn_url(&path))
    }

    async fn verify_credential(&self, credential: &str) -> Result<CredentialStatus, MirrorError> {
        let token = require_credential(Some(credential))?;

        let response = self
            .authed(self.client.get(self.config.user_url()), token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_write_failure(status, &body));
        }
        let user: UserResponse = response.json().await?;

        let response = self
            .authed(self.client.get(self.config.repo_url()), token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_write_failure(status, &body));
        }
        let repo: RepoResponse = response.json().await?;
        let permissions = repo.permissions.unwrap_or_default();

        Ok(CredentialStatus {
            login: user.login,
            can_push: permissions.push,
            can_pull: permissions.pull,
        })
    }
}
