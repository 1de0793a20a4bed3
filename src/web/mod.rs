// src/web/mod.rs - rocket server: public front stage plus the JSON admin API

pub mod handlers;
pub mod services;
pub mod types;

pub use handlers::*;
pub use services::Services;
pub use types::*;

use crate::app_log;
use crate::contact::{ContactBook, ContactMessage};
use crate::controller::{
    AdminSnapshot, CredentialForm, ExperienceForm, FormController, ProfileForm, ProjectForm,
    SkillForm, SyncStatus,
};
use crate::core::remote_mirror::{CredentialStatus, PublishReceipt};
use crate::core::ConfigManager;
use crate::hydration::hydrate_front;
use crate::render::RenderContext;
use crate::session::{AdminSession, SessionGate};
use crate::types::{CredentialKind, ResumeDocument};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

type ApiResult<T> = Result<Json<T>, Json<StandardErrorResponse>>;

// Front stage

#[get("/")]
pub async fn index(controller: &State<FormController>, render: &State<RenderContext>) -> RawHtml<String> {
    handlers::index_handler(controller, render).await
}

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    handlers::health_handler().await
}

#[get("/document")]
pub async fn document(controller: &State<FormController>) -> Json<DataResponse<ResumeDocument>> {
    handlers::document_handler(controller).await
}

#[post("/contact", data = "<request>")]
pub async fn contact(request: Json<ContactRequest>, contacts: &State<ContactBook>) -> ApiResult<ActionResponse> {
    handlers::contact_handler(request, contacts).await
}

// Session

#[post("/admin/login", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    session: &State<SessionGate>,
    cookies: &rocket::http::CookieJar<'_>,
) -> ApiResult<ActionResponse> {
    handlers::login_handler(request, session, cookies).await
}

#[post("/admin/logout")]
pub async fn logout(
    _admin: AdminSession,
    session: &State<SessionGate>,
    cookies: &rocket::http::CookieJar<'_>,
) -> ApiResult<ActionResponse> {
    handlers::logout_handler(session, cookies).await
}

#[post("/admin/password", data = "<request>")]
pub async fn change_password(
    request: Json<PasswordChangeRequest>,
    _admin: AdminSession,
    session: &State<SessionGate>,
) -> ApiResult<ActionResponse> {
    handlers::change_password_handler(request, session).await
}

// Document CRUD

#[get("/admin/snapshot")]
pub async fn snapshot(_admin: AdminSession, controller: &State<FormController>) -> Json<DataResponse<AdminSnapshot>> {
    handlers::snapshot_handler(controller).await
}

#[put("/admin/profile", data = "<form>")]
pub async fn update_profile(
    form: Json<ProfileForm>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::update_profile_handler(form, controller).await
}

#[post("/admin/skills", data = "<form>")]
pub async fn upsert_skill(
    form: Json<SkillForm>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::upsert_skill_handler(form, controller).await
}

#[delete("/admin/skills/<id>")]
pub async fn delete_skill(
    id: &str,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    handlers::delete_skill_handler(id, controller).await
}

#[post("/admin/experience", data = "<form>")]
pub async fn upsert_experience(
    form: Json<ExperienceForm>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::upsert_experience_handler(form, controller).await
}

#[delete("/admin/experience/<id>")]
pub async fn delete_experience(
    id: &str,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    handlers::delete_experience_handler(id, controller).await
}

#[post("/admin/credentials/<kind>", data = "<form>")]
pub async fn upsert_credential(
    kind: CredentialKind,
    form: Json<CredentialForm>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::upsert_credential_handler(kind, form, controller).await
}

#[delete("/admin/credentials/<kind>/<id>")]
pub async fn delete_credential(
    kind: CredentialKind,
    id: &str,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    handlers::delete_credential_handler(kind, id, controller).await
}

#[post("/admin/projects", data = "<form>")]
pub async fn upsert_project(
    form: Json<ProjectForm>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::upsert_project_handler(form, controller).await
}

#[delete("/admin/projects/<id>")]
pub async fn delete_project(
    id: &str,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    handlers::delete_project_handler(id, controller).await
}

// Assets

#[post("/admin/assets/avatar", data = "<request>")]
pub async fn upload_avatar(
    request: Json<AssetUploadRequest>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::upload_avatar_handler(request, controller).await
}

#[post("/admin/assets/photo", data = "<request>")]
pub async fn upload_photo(
    request: Json<AssetUploadRequest>,
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<UploadedAsset>> {
    handlers::upload_photo_handler(request, controller).await
}

// Remote

#[post("/admin/token", data = "<request>")]
pub async fn set_token(
    request: Json<TokenRequest>,
    _admin: AdminSession,
    session: &State<SessionGate>,
) -> ApiResult<ActionResponse> {
    handlers::set_token_handler(request, session).await
}

#[delete("/admin/token")]
pub async fn clear_token(_admin: AdminSession, session: &State<SessionGate>) -> ApiResult<ActionResponse> {
    handlers::clear_token_handler(session).await
}

#[get("/admin/token/check")]
pub async fn check_token(
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<CredentialStatus>> {
    handlers::check_token_handler(controller).await
}

#[get("/admin/sync")]
pub async fn sync_status(_admin: AdminSession, controller: &State<FormController>) -> Json<DataResponse<SyncStatus>> {
    handlers::sync_status_handler(controller).await
}

#[post("/admin/pull")]
pub async fn pull(_admin: AdminSession, controller: &State<FormController>) -> ApiResult<DataResponse<AdminSnapshot>> {
    handlers::pull_handler(controller).await
}

#[post("/admin/publish")]
pub async fn publish(
    _admin: AdminSession,
    controller: &State<FormController>,
) -> ApiResult<DataResponse<PublishReceipt>> {
    handlers::publish_handler(controller).await
}

#[get("/admin/messages")]
pub async fn messages(
    _admin: AdminSession,
    contacts: &State<ContactBook>,
) -> ApiResult<DataResponse<Vec<ContactMessage>>> {
    handlers::messages_handler(contacts).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Admin login required".to_string(),
        "AUTHORIZATION_ERROR".to_string(),
        vec!["Log in through /api/admin/login first".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Credential collections are courses, certificates and awards".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec!["Verify field names and types".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Check the server logs".to_string(),
        ],
    ))
}

/// Assemble the server around already-wired services
pub fn build_rocket(
    controller: FormController,
    contacts: ContactBook,
    render: RenderContext,
    port: u16,
) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", port));
    let session = controller.session().clone();

    rocket::custom(figment)
        .attach(Cors)
        .manage(session)
        .manage(controller)
        .manage(contacts)
        .manage(render)
        .mount("/", routes![index])
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                document,
                contact,
                login,
                logout,
                change_password,
                snapshot,
                update_profile,
                upsert_skill,
                delete_skill,
                upsert_experience,
                delete_experience,
                upsert_credential,
                delete_credential,
                upsert_project,
                delete_project,
                upload_avatar,
                upload_photo,
                set_token,
                clear_token,
                check_token,
                sync_status,
                pull,
                publish,
                messages,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: &ConfigManager, services: Services) -> Result<()> {
    let credential = services.session.credential().await;
    let outcome = hydrate_front(&services.store, services.remote.as_ref(), credential.as_deref()).await;
    app_log!(info, "Front stage hydration: {:?}", outcome);

    app_log!(info, "Starting cvfolio server ({} environment)", config.environment);
    app_log!(info, "Storage: {:?} at {}", config.storage.backend, config.storage.path.display());
    app_log!(info, "Mirror: {}/{}@{}", config.mirror.owner, config.mirror.repo, config.mirror.branch);

    let _rocket = build_rocket(
        services.controller,
        services.contacts,
        services.render,
        config.server.port,
    )
    .launch()
    .await
    .map_err(|e| anyhow::anyhow!("Server terminated with an error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_manager::{AdminConfig, MirrorConfig};
    use crate::core::slots::{keys, MemorySlots, SlotStore};
    use crate::core::DocumentStore;
    use crate::testing::FakeMirror;
    use std::sync::Arc;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    struct TestServer {
        client: Client,
        remote: Arc<FakeMirror>,
        slots: Arc<dyn SlotStore>,
    }

    async fn server_with(remote: FakeMirror, credential: Option<&str>) -> TestServer {
        let slots: Arc<dyn SlotStore> = Arc::new(MemorySlots::default());
        let remote = Arc::new(remote);
        let session = SessionGate::new(
            slots.clone(),
            AdminConfig {
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            credential.map(str::to_string),
        );
        let controller = FormController::new(DocumentStore::new(slots.clone()), remote.clone(), session);
        let rocket = build_rocket(
            controller,
            ContactBook::new(slots.clone()),
            RenderContext::new(MirrorConfig::default()),
            0,
        );

        TestServer {
            client: Client::tracked(rocket).await.unwrap(),
            remote,
            slots,
        }
    }

    async fn server() -> TestServer {
        server_with(FakeMirror::default(), None).await
    }

    async fn post_json(client: &Client, uri: &str, body: Value) -> Value {
        let response = client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        response.into_json::<Value>().await.unwrap()
    }

    async fn login(client: &Client) {
        let body = post_json(client, "/api/admin/login", json!({"username": "admin", "password": "secret"})).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_front_page_renders_document() {
        let server = server().await;
        let response = server.client.get("/").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));
        let html = response.into_string().await.unwrap();
        assert!(html.contains("id=\"hero-name\""));
        assert!(html.contains("Your Name"));
    }

    #[tokio::test]
    async fn test_front_page_hydrates_empty_store() {
        let mut remote_doc = ResumeDocument::seed();
        remote_doc.profile.name = "Remote Person".to_string();
        let server = server_with(FakeMirror::with_document(remote_doc), None).await;
        assert!(server.slots.get(keys::DOCUMENT).await.unwrap().is_none());

        let response = server.client.get("/").dispatch().await;
        let html = response.into_string().await.unwrap();
        assert!(html.contains("Remote Person"));
        assert!(!html.contains("Your Name"));
        assert!(server.slots.get(keys::DOCUMENT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_health_and_cors() {
        let server = server().await;
        let response = server.client.get("/api/health").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["message"], "OK");
    }

    #[tokio::test]
    async fn test_admin_routes_require_login() {
        let server = server().await;

        let response = server.client.get("/api/admin/snapshot").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["error_code"], "AUTHORIZATION_ERROR");

        let body = post_json(&server.client, "/api/admin/login", json!({"username": "admin", "password": "wrong"})).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "INVALID_CREDENTIALS");

        login(&server.client).await;
        let response = server.client.get("/api/admin/snapshot").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[tokio::test]
    async fn test_session_flag_alone_is_not_enough() {
        let server = server().await;
        server.slots.set(keys::ADMIN_SESSION, "true").await.unwrap();

        let response = server.client.get("/api/admin/snapshot").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[tokio::test]
    async fn test_project_crud_over_http() {
        let server = server().await;
        login(&server.client).await;

        let body = post_json(
            &server.client,
            "/api/admin/projects",
            json!({"name": "  Folio  ", "tech": "Rust/rocket", "link": "", "desc": "site"}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["stats"]["projects"], 1);
        let id = body["data"]["document"]["projects"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["document"]["projects"][0]["name"], "Folio");

        let response = server
            .client
            .delete(format!("/api/admin/projects/{}", id))
            .dispatch()
            .await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["data"]["stats"]["projects"], 0);

        let doc = server.client.get("/api/document").dispatch().await;
        let doc = doc.into_json::<Value>().await.unwrap();
        assert_eq!(doc["data"]["projects"], json!([]));
    }

    #[tokio::test]
    async fn test_credential_collection_path() {
        let server = server().await;
        login(&server.client).await;

        let body = post_json(
            &server.client,
            "/api/admin/credentials/awards",
            json!({"name": "Best Paper", "issuer": "Conf", "year": "2023"}),
        )
        .await;
        assert_eq!(body["data"]["document"]["awards"][0]["name"], "Best Paper");
        assert_eq!(body["data"]["stats"]["achievements"], 1);

        let response = server
            .client
            .post("/api/admin/credentials/badges")
            .header(ContentType::JSON)
            .body(json!({"name": "x"}).to_string())
            .dispatch()
            .await;
        assert_ne!(response.status(), Status::Ok);
    }

    #[tokio::test]
    async fn test_empty_submission_reports_error() {
        let server = server().await;
        login(&server.client).await;

        let body = post_json(&server.client, "/api/admin/experience", json!({"company": "   "})).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "EMPTY_SUBMISSION");
    }

    #[tokio::test]
    async fn test_contact_messages_flow() {
        let server = server().await;

        let body = post_json(&server.client, "/api/contact", json!({"name": "Ann", "email": "", "message": "Hi"})).await;
        assert_eq!(body["success"], false);

        let body = post_json(
            &server.client,
            "/api/contact",
            json!({"name": "Ann", "email": "ann@example.com", "message": "Hi"}),
        )
        .await;
        assert_eq!(body["success"], true);

        login(&server.client).await;
        let response = server.client.get("/api/admin/messages").dispatch().await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["data"][0]["email"], "ann@example.com");
    }

    #[tokio::test]
    async fn test_publish_and_conflict() {
        let server = server_with(FakeMirror::with_document(ResumeDocument::default()), Some("token")).await;
        login(&server.client).await;

        let body = post_json(&server.client, "/api/admin/publish", json!({})).await;
        assert_eq!(body["success"], true);
        assert_eq!(server.remote.publishes(), 1);

        server.remote.interleave_writer();
        let body = post_json(&server.client, "/api/admin/publish", json!({})).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "REMOTE_CONFLICT");

        let response = server.client.get("/api/admin/sync").dispatch().await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["data"]["state"], "failed");
    }

    #[tokio::test]
    async fn test_photo_upload_returns_url() {
        let server = server_with(FakeMirror::default(), Some("token")).await;
        login(&server.client).await;

        let body = post_json(
            &server.client,
            "/api/admin/assets/photo",
            json!({"file_name": "cert.png", "content_base64": "data:image/png;base64,iVBORw0KGgo="}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["url"], "https://cdn.example/assets/images/cert.png");
        assert_eq!(body["data"]["sync"]["state"], "published");

        let body = post_json(
            &server.client,
            "/api/admin/assets/photo",
            json!({"file_name": "cert.png", "content_base64": "not base64!"}),
        )
        .await;
        assert_eq!(body["error_code"], "INVALID_UPLOAD");
    }

    #[tokio::test]
    async fn test_photo_url_returned_when_publish_conflicts() {
        let server = server_with(FakeMirror::with_document(ResumeDocument::default()), Some("token")).await;
        login(&server.client).await;
        server.remote.interleave_writer();

        let body = post_json(
            &server.client,
            "/api/admin/assets/photo",
            json!({"file_name": "cert.png", "content_base64": "iVBORw0KGgo="}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["url"], "https://cdn.example/assets/images/cert.png");
        assert_eq!(body["data"]["sync"]["state"], "failed");
        assert_eq!(body["data"]["sync"]["code"], "REMOTE_CONFLICT");
    }

    #[tokio::test]
    async fn test_token_check_without_token() {
        let server = server().await;
        login(&server.client).await;

        let response = server.client.get("/api/admin/token/check").dispatch().await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["error_code"], "MISSING_CREDENTIAL");

        post_json(&server.client, "/api/admin/token", json!({"token": "ghp_test"})).await;
        let response = server.client.get("/api/admin/token/check").dispatch().await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["data"]["login"], "tester");
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let server = server().await;
        login(&server.client).await;

        let response = server.client.post("/api/admin/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = server.client.get("/api/admin/snapshot").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }
}
