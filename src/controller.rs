// src/controller.rs
//! Admin form controller: typed form submissions become upserts/deletes on the document,
//! followed by a local save and a detached publish to the remote mirror

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app_log;
use crate::core::remote_mirror::{MirrorError, PublishReceipt, RemoteMirror};
use crate::core::DocumentStore;
use crate::hydration::hydrate_front;
use crate::session::SessionGate;
use crate::types::{
    new_id, Credential, CredentialKind, DocumentStats, Experience, ExperienceKind, ProfileLink,
    Project, ResumeDocument, SkillGroup, SkillItem,
};
use crate::utils::{non_blank, trimmed};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{0} is required")]
    EmptySubmission(&'static str),

    #[error("Remote document is unavailable")]
    RemoteUnavailable,

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

impl ControllerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySubmission(_) => "EMPTY_SUBMISSION",
            Self::RemoteUnavailable => "REMOTE_UNAVAILABLE",
            Self::Mirror(e) => e.code(),
        }
    }
}

/// Last known outcome of a background publish
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Publishing,
    Published { commit: String, at: DateTime<Utc> },
    Skipped { reason: String },
    Failed { code: String, message: String },
}

impl SyncStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Publishing)
    }
}

/// What the admin view redraws after every mutation
#[derive(Debug, Clone, Serialize)]
pub struct AdminSnapshot {
    pub document: ResumeDocument,
    pub stats: DocumentStats,
}

/// A freshly uploaded image and how the publish that followed it went
#[derive(Debug, Clone, Serialize)]
pub struct UploadedAsset {
    pub url: String,
    pub sync: SyncStatus,
}

impl From<ResumeDocument> for AdminSnapshot {
    fn from(document: ResumeDocument) -> Self {
        let stats = document.stats();
        Self { document, stats }
    }
}

// ===== Forms =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub title: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub hero_description: String,
    pub about_description: String,
    /// Replaces the link list when present
    pub links: Option<Vec<ProfileLink>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillForm {
    pub id: Option<String>,
    pub name: String,
    /// `"name|level, name|level"`
    pub items: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExperienceForm {
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub kind: ExperienceKind,
    pub company: String,
    pub role: String,
    pub period: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialForm {
    pub id: Option<String>,
    pub name: String,
    pub issuer: String,
    pub year: String,
    pub link: String,
    pub desc: String,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectForm {
    pub id: Option<String>,
    pub name: String,
    pub tech: String,
    pub link: String,
    pub desc: String,
}

/// Parse the skill items field. A segment without `|` is a name with no level.
pub fn parse_skill_items(raw: &str) -> Vec<SkillItem> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| {
            let mut parts = segment.split('|').map(str::trim);
            let name = parts.next().filter(|n| !n.is_empty()).unwrap_or(segment);
            let level = parts.next().unwrap_or("");
            SkillItem {
                name: name.to_string(),
                level: level.to_string(),
            }
        })
        .collect()
}

/// Inverse of [`parse_skill_items`], used to prefill the edit form
pub fn format_skill_items(items: &[SkillItem]) -> String {
    items
        .iter()
        .map(|i| {
            if i.level.is_empty() {
                i.name.clone()
            } else {
                format!("{}|{}", i.name, i.level)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ===== Collection helpers =====

trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

keyed!(SkillGroup, Experience, Credential, Project);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Prepend,
    Append,
}

/// Replace the entry with the same id in place, or insert a new one
fn upsert<T: Keyed>(list: &mut Vec<T>, entry: T, placement: Placement) {
    match list.iter().position(|e| e.key() == entry.key()) {
        Some(index) => list[index] = entry,
        None if placement == Placement::Prepend => list.insert(0, entry),
        None => list.push(entry),
    }
}

fn remove_by_id<T: Keyed>(list: &mut Vec<T>, id: &str) -> bool {
    let before = list.len();
    list.retain(|e| e.key() != id);
    list.len() != before
}

fn resolve_id(id: Option<&str>) -> String {
    non_blank(id).unwrap_or_else(new_id)
}

fn require(value: &str, field: &'static str) -> Result<(), ControllerError> {
    if value.is_empty() {
        Err(ControllerError::EmptySubmission(field))
    } else {
        Ok(())
    }
}

// ===== Controller =====

#[derive(Clone)]
pub struct FormController {
    store: DocumentStore,
    remote: Arc<dyn RemoteMirror>,
    session: SessionGate,
    status: Arc<watch::Sender<SyncStatus>>,
}

impl FormController {
    pub fn new(store: DocumentStore, remote: Arc<dyn RemoteMirror>, session: SessionGate) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            store,
            remote,
            session,
            status: Arc::new(status),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn remote(&self) -> &Arc<dyn RemoteMirror> {
        &self.remote
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub async fn snapshot(&self) -> AdminSnapshot {
        self.store.load().await.into()
    }

    /// Document for the public view. An empty store tries the remote before seeding.
    pub async fn front_document(&self) -> ResumeDocument {
        let credential = self.session.credential().await;
        let outcome = hydrate_front(&self.store, &*self.remote, credential.as_deref()).await;
        app_log!(debug, "Front stage hydration: {:?}", outcome);
        self.store.load().await
    }

    pub async fn update_profile(&self, form: ProfileForm) -> Result<AdminSnapshot, ControllerError> {
        let name = trimmed(&form.name);
        require(&name, "Name")?;

        let mut doc = self.store.load().await;
        let profile = &mut doc.profile;
        profile.name = name;
        profile.title = trimmed(&form.title);
        profile.location = trimmed(&form.location);
        profile.email = trimmed(&form.email);
        profile.phone = trimmed(&form.phone);
        profile.hero_description = trimmed(&form.hero_description);
        profile.about_description = trimmed(&form.about_description);
        if let Some(links) = form.links {
            profile.links = links
                .into_iter()
                .map(|l| ProfileLink {
                    label: trimmed(&l.label),
                    href: trimmed(&l.href),
                    icon: trimmed(&l.icon),
                })
                .filter(|l| !l.href.is_empty())
                .collect();
        }

        Ok(self.commit(doc).await)
    }

    /// Skills append new groups at the end and also match an existing group by name
    pub async fn upsert_skill(&self, form: SkillForm) -> Result<AdminSnapshot, ControllerError> {
        let name = trimmed(&form.name);
        require(&name, "Skill group name")?;

        let mut doc = self.store.load().await;
        let requested = non_blank(form.id.as_deref());
        let existing = doc.skills.iter().position(|s| {
            requested.as_deref() == Some(s.id.as_str()) || s.name == name
        });

        let entry = SkillGroup {
            id: existing
                .map(|i| doc.skills[i].id.clone())
                .or(requested)
                .unwrap_or_else(new_id),
            name,
            items: parse_skill_items(&form.items),
        };

        match existing {
            Some(index) => doc.skills[index] = entry,
            None => upsert(&mut doc.skills, entry, Placement::Append),
        }

        Ok(self.commit(doc).await)
    }

    pub async fn delete_skill(&self, id: &str) -> AdminSnapshot {
        self.delete_with(|doc| remove_by_id(&mut doc.skills, id)).await
    }

    pub async fn upsert_experience(&self, form: ExperienceForm) -> Result<AdminSnapshot, ControllerError> {
        let company = trimmed(&form.company);
        require(&company, "Organization")?;

        let mut doc = self.store.load().await;
        let entry = Experience {
            id: resolve_id(form.id.as_deref()),
            kind: form.kind,
            company,
            role: trimmed(&form.role),
            period: trimmed(&form.period),
            summary: trimmed(&form.summary),
        };
        upsert(&mut doc.experience, entry, Placement::Prepend);

        Ok(self.commit(doc).await)
    }

    pub async fn delete_experience(&self, id: &str) -> AdminSnapshot {
        self.delete_with(|doc| remove_by_id(&mut doc.experience, id)).await
    }

    pub async fn upsert_credential(
        &self,
        kind: CredentialKind,
        form: CredentialForm,
    ) -> Result<AdminSnapshot, ControllerError> {
        let name = trimmed(&form.name);
        require(&name, "Name")?;

        let mut doc = self.store.load().await;
        let id = resolve_id(form.id.as_deref());
        let legacy_photo = doc
            .credentials(kind)
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.photo_base64.clone());

        let entry = Credential {
            id,
            name,
            issuer: trimmed(&form.issuer),
            year: trimmed(&form.year),
            link: trimmed(&form.link),
            desc: trimmed(&form.desc),
            photo_path: non_blank(form.photo_path.as_deref()),
            photo_base64: legacy_photo,
        };
        upsert(doc.credentials_mut(kind), entry, Placement::Prepend);

        Ok(self.commit(doc).await)
    }

    pub async fn delete_credential(&self, kind: CredentialKind, id: &str) -> AdminSnapshot {
        self.delete_with(|doc| remove_by_id(doc.credentials_mut(kind), id))
            .await
    }

    pub async fn upsert_project(&self, form: ProjectForm) -> Result<AdminSnapshot, ControllerError> {
        let name = trimmed(&form.name);
        require(&name, "Project name")?;

        let mut doc = self.store.load().await;
        let entry = Project {
            id: resolve_id(form.id.as_deref()),
            name,
            tech: trimmed(&form.tech),
            link: trimmed(&form.link),
            desc: trimmed(&form.desc),
        };
        upsert(&mut doc.projects, entry, Placement::Prepend);

        Ok(self.commit(doc).await)
    }

    pub async fn delete_project(&self, id: &str) -> AdminSnapshot {
        self.delete_with(|doc| remove_by_id(&mut doc.projects, id)).await
    }

    /// Upload a new avatar, point the profile at it and publish right away
    pub async fn upload_avatar(&self, file_name: &str, bytes: &[u8]) -> Result<AdminSnapshot, ControllerError> {
        let credential = self.session.credential().await;
        let url = self
            .remote
            .upload_asset(file_name, bytes, credential.as_deref())
            .await?;

        let mut doc = self.store.load().await;
        doc.profile.avatar_path = Some(url);
        doc.profile.avatar_base64 = None;
        self.store.save(&doc).await;

        self.publish_now().await?;
        Ok(doc.into())
    }

    /// Upload a credential photo. The URL goes into the form's `photo_path` and is
    /// returned even when the publish that follows fails.
    pub async fn upload_photo(&self, file_name: &str, bytes: &[u8]) -> Result<UploadedAsset, ControllerError> {
        let credential = self.session.credential().await;
        let url = self
            .remote
            .upload_asset(file_name, bytes, credential.as_deref())
            .await?;

        if let Err(e) = self.publish_now().await {
            app_log!(warn, "Photo {} uploaded but publish failed: {}", url, e);
        }
        Ok(UploadedAsset {
            url,
            sync: self.sync_status(),
        })
    }

    /// Publish the stored document and wait for the outcome
    pub async fn publish_now(&self) -> Result<PublishReceipt, ControllerError> {
        let doc = self.store.load().await;
        self.status.send_replace(SyncStatus::Publishing);
        let result = publish(&*self.remote, &self.session, &self.status, &doc).await;
        result.map_err(ControllerError::from)
    }

    /// Replace the local document with the remote one. Operator-initiated only.
    pub async fn pull_remote(&self) -> Result<AdminSnapshot, ControllerError> {
        let credential = self.session.credential().await;
        let doc = self
            .remote
            .fetch_document(credential.as_deref())
            .await
            .ok_or(ControllerError::RemoteUnavailable)?;

        self.store.save(&doc).await;
        app_log!(info, "Local document replaced with the remote copy");
        Ok(doc.into())
    }

    async fn delete_with<F>(&self, remove: F) -> AdminSnapshot
    where
        F: FnOnce(&mut ResumeDocument) -> bool,
    {
        let mut doc = self.store.load().await;
        if remove(&mut doc) {
            self.commit(doc).await
        } else {
            app_log!(debug, "Delete of unknown id ignored");
            doc.into()
        }
    }

    /// Save locally, then publish in the background
    async fn commit(&self, doc: ResumeDocument) -> AdminSnapshot {
        self.store.save(&doc).await;
        self.spawn_publish(doc.clone());
        doc.into()
    }

    fn spawn_publish(&self, doc: ResumeDocument) -> JoinHandle<()> {
        let remote = self.remote.clone();
        let session = self.session.clone();
        let status = self.status.clone();

        status.send_replace(SyncStatus::Publishing);
        tokio::spawn(async move {
            // Outcome lands in the status channel
            let _ = publish(&*remote, &session, &status, &doc).await;
        })
    }
}

async fn publish(
    remote: &dyn RemoteMirror,
    session: &SessionGate,
    status: &watch::Sender<SyncStatus>,
    doc: &ResumeDocument,
) -> Result<PublishReceipt, MirrorError> {
    let credential = session.credential().await;
    if credential.is_none() {
        app_log!(debug, "No remote credential, publish skipped");
        status.send_replace(SyncStatus::Skipped {
            reason: "No remote credential configured".to_string(),
        });
        return Err(MirrorError::MissingCredential);
    }

    match remote.publish_document(doc, credential.as_deref()).await {
        Ok(receipt) => {
            status.send_replace(SyncStatus::Published {
                commit: receipt.commit.clone(),
                at: receipt.published_at,
            });
            Ok(receipt)
        }
        Err(e) => {
            app_log!(error, "Remote publish failed (local copy is saved): {}", e);
            status.send_replace(SyncStatus::Failed {
                code: e.code().to_string(),
                message: e.to_string(),
            });
            Err(e)
        }
    }
}
