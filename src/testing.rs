// src/testing.rs
//! In-process stand-in for the remote mirror, tracking a revision marker the way the
//! contents API does

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::core::remote_mirror::{
    require_credential, CredentialStatus, MirrorError, PublishReceipt, RemoteMirror,
};
use crate::types::ResumeDocument;

#[derive(Default)]
struct FakeState {
    document: Option<ResumeDocument>,
    revision: u64,
    publishes: usize,
    uploads: Vec<String>,
    offline: bool,
    interleaved_writer: bool,
}

#[derive(Default)]
pub struct FakeMirror {
    state: Mutex<FakeState>,
}

impl FakeMirror {
    pub fn with_document(doc: ResumeDocument) -> Self {
        let mirror = Self::default();
        {
            let mut state = mirror.state.lock().unwrap();
            state.document = Some(doc);
            state.revision = 1;
        }
        mirror
    }

    pub fn offline() -> Self {
        let mirror = Self::default();
        mirror.state.lock().unwrap().offline = true;
        mirror
    }

    /// Make another writer land between the next publish's revision read and its write
    pub fn interleave_writer(&self) {
        self.state.lock().unwrap().interleaved_writer = true;
    }

    pub fn document(&self) -> Option<ResumeDocument> {
        self.state.lock().unwrap().document.clone()
    }

    pub fn publishes(&self) -> usize {
        self.state.lock().unwrap().publishes
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }
}

#[async_trait]
impl RemoteMirror for FakeMirror {
    async fn fetch_document(&self, _credential: Option<&str>) -> Option<ResumeDocument> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return None;
        }
        state.document.clone()
    }

    async fn publish_document(
        &self,
        doc: &ResumeDocument,
        credential: Option<&str>,
    ) -> Result<PublishReceipt, MirrorError> {
        require_credential(credential)?;
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(MirrorError::Api {
                status: 503,
                message: "offline".to_string(),
            });
        }

        let marker = state.revision;
        if state.interleaved_writer {
            state.interleaved_writer = false;
            state.revision += 1;
        }
        if marker != state.revision {
            return Err(MirrorError::Conflict {
                status: 409,
                message: format!("is at rev-{} but expected rev-{}", state.revision, marker),
            });
        }

        state.revision += 1;
        state.publishes += 1;
        state.document = Some(doc.clone());

        Ok(PublishReceipt {
            commit: format!("commit-{}", state.revision),
            revision: Some(format!("rev-{}", state.revision)),
            published_at: Utc::now(),
        })
    }

    async fn upload_asset(
        &self,
        file_name: &str,
        _bytes: &[u8],
        credential: Option<&str>,
    ) -> Result<String, MirrorError> {
        require_credential(credential)?;
        let url = format!("https://cdn.example/assets/images/{}", file_name);
        self.state.lock().unwrap().uploads.push(url.clone());
        Ok(url)
    }

    async fn verify_credential(&self, credential: &str) -> Result<CredentialStatus, MirrorError> {
        require_credential(Some(credential))?;
        Ok(CredentialStatus {
            login: "tester".to_string(),
            can_push: true,
            can_pull: true,
        })
    }
}

// ===== Local GitHub stand-in served over HTTP =====

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rocket::config::LogLevel;
use rocket::fairing::AdHoc;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::{json, Json, Value};
use rocket::{get, put, routes, State};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::core::config_manager::MirrorConfig;

#[derive(Default)]
pub struct StubRepo {
    /// Body served under the CDN prefix; `None` answers 404
    pub cdn: Option<String>,
    /// Body served under the raw prefix; `None` answers 404
    pub raw: Option<String>,
    /// Contents API files: path -> (sha, bytes)
    pub files: HashMap<String, (String, Vec<u8>)>,
    /// `METHOD /path` of every request, in arrival order
    pub requests: Vec<String>,
    /// Bodies of every contents PUT
    pub puts: Vec<Value>,
    /// Authorization and Accept headers of every request
    pub headers: Vec<(Option<String>, Option<String>)>,
    commits: u64,
}

type SharedRepo = Arc<Mutex<StubRepo>>;

struct StubHeaders {
    authorization: Option<String>,
    accept: Option<String>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StubHeaders {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, ()> {
        let headers = request.headers();
        Outcome::Success(StubHeaders {
            authorization: headers.get_one("Authorization").map(str::to_string),
            accept: headers.get_one("Accept").map(str::to_string),
        })
    }
}

fn record(repo: &SharedRepo, line: String, headers: &StubHeaders) {
    let mut repo = repo.lock().unwrap();
    repo.requests.push(line);
    repo.headers
        .push((headers.authorization.clone(), headers.accept.clone()));
}

fn text_or_404(body: Option<String>) -> (Status, String) {
    match body {
        Some(body) => (Status::Ok, body),
        None => (Status::NotFound, r#"{"message":"Not Found"}"#.to_string()),
    }
}

#[get("/cdn/<path..>")]
fn cdn(path: PathBuf, repo: &State<SharedRepo>, headers: StubHeaders) -> (Status, String) {
    record(repo, format!("GET /cdn/{}", path.display()), &headers);
    let body = repo.lock().unwrap().cdn.clone();
    text_or_404(body)
}

#[get("/raw/<path..>")]
fn raw(path: PathBuf, repo: &State<SharedRepo>, headers: StubHeaders) -> (Status, String) {
    record(repo, format!("GET /raw/{}", path.display()), &headers);
    let body = repo.lock().unwrap().raw.clone();
    text_or_404(body)
}

#[get("/api/user")]
fn user(repo: &State<SharedRepo>, headers: StubHeaders) -> (Status, String) {
    record(repo, "GET /api/user".to_string(), &headers);
    (Status::Ok, json!({ "login": "stub-user" }).to_string())
}

#[get("/api/repos/<owner>/<name>")]
fn repository(owner: &str, name: &str, repo: &State<SharedRepo>, headers: StubHeaders) -> (Status, String) {
    record(repo, format!("GET /api/repos/{}/{}", owner, name), &headers);
    let body = json!({ "permissions": { "push": true, "pull": true } });
    (Status::Ok, body.to_string())
}

#[get("/api/repos/<_owner>/<_name>/contents/<path..>")]
fn get_contents(
    _owner: &str,
    _name: &str,
    path: PathBuf,
    repo: &State<SharedRepo>,
    headers: StubHeaders,
) -> (Status, String) {
    let path = path.display().to_string();
    record(repo, format!("GET /contents/{}", path), &headers);
    let raw_wanted = headers.accept.as_deref() == Some("application/vnd.github.raw");

    let repo = repo.lock().unwrap();
    match repo.files.get(&path) {
        Some((_, bytes)) if raw_wanted => (Status::Ok, String::from_utf8_lossy(bytes).into_owned()),
        Some((sha, bytes)) => {
            let body = json!({ "sha": sha, "path": path, "size": bytes.len() });
            (Status::Ok, body.to_string())
        }
        None => text_or_404(None),
    }
}

#[put("/api/repos/<_owner>/<_name>/contents/<path..>", data = "<body>")]
fn put_contents(
    _owner: &str,
    _name: &str,
    path: PathBuf,
    body: Json<Value>,
    repo: &State<SharedRepo>,
    headers: StubHeaders,
) -> (Status, String) {
    let path = path.display().to_string();
    record(repo, format!("PUT /contents/{}", path), &headers);
    let body = body.into_inner();

    let mut repo = repo.lock().unwrap();
    repo.puts.push(body.clone());

    let sent_sha = body["sha"].as_str().map(str::to_string);
    if let Some((current, _)) = repo.files.get(&path) {
        match sent_sha {
            None => {
                let error = json!({ "message": "Invalid request.\n\n\"sha\" wasn't supplied." });
                return (Status::UnprocessableEntity, error.to_string());
            }
            Some(ref sha) if sha != current => {
                let error = json!({ "message": format!("{} does not match {}", path, sha) });
                return (Status::Conflict, error.to_string());
            }
            Some(_) => {}
        }
    }

    let Some(bytes) = body["content"].as_str().and_then(|c| STANDARD.decode(c).ok()) else {
        return (Status::BadRequest, json!({ "message": "bad content" }).to_string());
    };

    repo.commits += 1;
    let sha = format!("blob-{}", repo.commits);
    let commit = format!("commit-{}", repo.commits);
    repo.files.insert(path.clone(), (sha.clone(), bytes));

    let reply = json!({ "content": { "sha": sha, "path": path }, "commit": { "sha": commit } });
    (Status::Created, reply.to_string())
}

/// A throwaway HTTP server shaped like the GitHub contents API, CDN and raw hosts
pub struct GitHubStub {
    pub repo: SharedRepo,
    base: String,
    server: JoinHandle<()>,
}

impl GitHubStub {
    pub async fn start() -> Self {
        let repo: SharedRepo = Arc::new(Mutex::new(StubRepo::default()));
        let (port_tx, port_rx) = tokio::sync::oneshot::channel();

        let config = rocket::Config {
            address: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            log_level: LogLevel::Off,
            ..rocket::Config::debug_default()
        };
        let rocket = rocket::custom(config)
            .manage(repo.clone())
            .mount("/", routes![cdn, raw, user, repository, get_contents, put_contents])
            .attach(AdHoc::on_liftoff("stub port", move |rocket| {
                Box::pin(async move {
                    let _ = port_tx.send(rocket.config().port);
                })
            }));

        let server = tokio::spawn(async move {
            let _ = rocket.launch().await;
        });
        let port = port_rx.await.unwrap();

        Self {
            repo,
            base: format!("http://127.0.0.1:{}", port),
            server,
        }
    }

    /// Mirror settings pointing every host at this server
    pub fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            owner: "me".to_string(),
            repo: "cv".to_string(),
            branch: "main".to_string(),
            api_base: format!("{}/api", self.base),
            raw_base: format!("{}/raw", self.base),
            cdn_base: format!("{}/cdn", self.base),
            timeout_seconds: 5,
            ..MirrorConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.repo.lock().unwrap().requests.clone()
    }
}

impl Drop for GitHubStub {
    fn drop(&mut self) {
        self.server.abort();
    }
}
