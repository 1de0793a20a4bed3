// src/types/response.rs
//! Wire types for the GitHub contents API used by the remote mirror

use serde::{Deserialize, Serialize};

// ===== Contents API =====

/// `GET /repos/{owner}/{repo}/contents/{path}` (JSON media type)
#[derive(Debug, Deserialize)]
pub struct ContentEntry {
    pub sha: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub struct PutContentRequest<'a> {
    pub message: String,
    /// Base64 encoded file body
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PutContentResponse {
    pub content: Option<ContentEntry>,
    pub commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

// ===== Credential checks =====

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    #[serde(default)]
    pub permissions: Option<RepoPermissions>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RepoPermissions {
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}
