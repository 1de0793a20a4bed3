// src/web/handlers/admin_handlers.rs - session, CRUD and sync endpoints behind AdminSession
use crate::app_log;
use crate::contact::{ContactBook, ContactMessage};
use crate::controller::{
    AdminSnapshot, ControllerError, CredentialForm, ExperienceForm, FormController, ProfileForm,
    ProjectForm, SkillForm, SyncStatus,
};
use crate::core::remote_mirror::{CredentialStatus, MirrorError, PublishReceipt};
use crate::session::{SessionGate, SESSION_COOKIE};
use crate::types::CredentialKind;
use crate::web::types::*;

use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::serde::json::Json;
use rocket::State;

use super::{controller_error, session_error, storage_error};

type SnapshotResult = Result<Json<DataResponse<AdminSnapshot>>, Json<StandardErrorResponse>>;

fn snapshot_response(message: &str, result: Result<AdminSnapshot, ControllerError>) -> SnapshotResult {
    result
        .map(|snapshot| Json(DataResponse::success(message.to_string(), snapshot)))
        .map_err(controller_error)
}

fn deleted_response(message: &str, snapshot: AdminSnapshot) -> Json<DataResponse<AdminSnapshot>> {
    Json(DataResponse::success(message.to_string(), snapshot))
}

// ===== Session =====

pub async fn login_handler(
    request: Json<LoginRequest>,
    session: &State<SessionGate>,
    cookies: &CookieJar<'_>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    session
        .login(&request.username, &request.password)
        .await
        .map_err(session_error)?;

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, "1"))
            .http_only(true)
            .same_site(SameSite::Lax),
    );

    Ok(Json(
        ActionResponse::success("Logged in".to_string(), "logged_in".to_string())
            .with_next_actions(vec![
                "Review the document snapshot".to_string(),
                "Store a GitHub token to enable publishing".to_string(),
            ]),
    ))
}

pub async fn logout_handler(
    session: &State<SessionGate>,
    cookies: &CookieJar<'_>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    cookies.remove_private(SESSION_COOKIE);
    session
        .logout()
        .await
        .map_err(|e| storage_error("Failed to clear the session", e))?;

    Ok(Json(ActionResponse::success(
        "Logged out".to_string(),
        "logged_out".to_string(),
    )))
}

pub async fn change_password_handler(
    request: Json<PasswordChangeRequest>,
    session: &State<SessionGate>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    session
        .change_password(&request.current, &request.new, &request.confirm)
        .await
        .map_err(session_error)?;

    Ok(Json(ActionResponse::success(
        "Password changed".to_string(),
        "password_changed".to_string(),
    )))
}

// ===== Document =====

pub async fn snapshot_handler(controller: &State<FormController>) -> Json<DataResponse<AdminSnapshot>> {
    let snapshot = controller.snapshot().await;
    Json(DataResponse::success("Current document".to_string(), snapshot))
}

pub async fn update_profile_handler(
    form: Json<ProfileForm>,
    controller: &State<FormController>,
) -> SnapshotResult {
    snapshot_response("Profile saved", controller.update_profile(form.into_inner()).await)
}

pub async fn upsert_skill_handler(form: Json<SkillForm>, controller: &State<FormController>) -> SnapshotResult {
    snapshot_response("Skill group saved", controller.upsert_skill(form.into_inner()).await)
}

pub async fn delete_skill_handler(id: &str, controller: &State<FormController>) -> Json<DataResponse<AdminSnapshot>> {
    deleted_response("Skill group deleted", controller.delete_skill(id).await)
}

pub async fn upsert_experience_handler(
    form: Json<ExperienceForm>,
    controller: &State<FormController>,
) -> SnapshotResult {
    snapshot_response("Experience saved", controller.upsert_experience(form.into_inner()).await)
}

pub async fn delete_experience_handler(
    id: &str,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    deleted_response("Experience deleted", controller.delete_experience(id).await)
}

pub async fn upsert_credential_handler(
    kind: CredentialKind,
    form: Json<CredentialForm>,
    controller: &State<FormController>,
) -> SnapshotResult {
    let result = controller.upsert_credential(kind, form.into_inner()).await;
    snapshot_response(&format!("Entry saved to {}", kind), result)
}

pub async fn delete_credential_handler(
    kind: CredentialKind,
    id: &str,
    controller: &State<FormController>,
) -> Json<DataResponse<AdminSnapshot>> {
    let snapshot = controller.delete_credential(kind, id).await;
    deleted_response(&format!("Entry deleted from {}", kind), snapshot)
}

pub async fn upsert_project_handler(form: Json<ProjectForm>, controller: &State<FormController>) -> SnapshotResult {
    snapshot_response("Project saved", controller.upsert_project(form.into_inner()).await)
}

pub async fn delete_project_handler(id: &str, controller: &State<FormController>) -> Json<DataResponse<AdminSnapshot>> {
    deleted_response("Project deleted", controller.delete_project(id).await)
}

// ===== Remote =====

pub async fn set_token_handler(
    request: Json<TokenRequest>,
    session: &State<SessionGate>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    if request.token.trim().is_empty() {
        return Err(Json(StandardErrorResponse::new(
            "Token must not be empty".to_string(),
            "EMPTY_SUBMISSION".to_string(),
            vec!["Paste a GitHub token with contents write access".to_string()],
        )));
    }

    session
        .set_credential(&request.token)
        .await
        .map_err(|e| storage_error("Failed to store the token", e))?;

    Ok(Json(
        ActionResponse::success("Token stored".to_string(), "token_stored".to_string())
            .with_next_actions(vec!["Check the token permissions".to_string()]),
    ))
}

pub async fn clear_token_handler(
    session: &State<SessionGate>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    session
        .clear_credential()
        .await
        .map_err(|e| storage_error("Failed to clear the token", e))?;

    Ok(Json(ActionResponse::success(
        "Token removed".to_string(),
        "token_cleared".to_string(),
    )))
}

pub async fn check_token_handler(
    controller: &State<FormController>,
) -> Result<Json<DataResponse<CredentialStatus>>, Json<StandardErrorResponse>> {
    let Some(token) = controller.session().credential().await else {
        return Err(controller_error(MirrorError::MissingCredential.into()));
    };

    let status = controller
        .remote()
        .verify_credential(&token)
        .await
        .map_err(|e| controller_error(e.into()))?;

    app_log!(info, "Token belongs to {} (push: {})", status.login, status.can_push);
    Ok(Json(DataResponse::success("Token is valid".to_string(), status)))
}

pub async fn sync_status_handler(controller: &State<FormController>) -> Json<DataResponse<SyncStatus>> {
    Json(DataResponse::success(
        "Last publish outcome".to_string(),
        controller.sync_status(),
    ))
}

pub async fn pull_handler(controller: &State<FormController>) -> SnapshotResult {
    snapshot_response("Local document replaced with the remote copy", controller.pull_remote().await)
}

pub async fn publish_handler(
    controller: &State<FormController>,
) -> Result<Json<DataResponse<PublishReceipt>>, Json<StandardErrorResponse>> {
    let receipt = controller.publish_now().await.map_err(controller_error)?;
    Ok(Json(DataResponse::success("Document published".to_string(), receipt)))
}

pub async fn messages_handler(
    contacts: &State<ContactBook>,
) -> Result<Json<DataResponse<Vec<ContactMessage>>>, Json<StandardErrorResponse>> {
    let messages = contacts
        .list()
        .await
        .map_err(|e| storage_error("Failed to read contact messages", e))?;

    Ok(Json(DataResponse::success(
        format!("{} message(s)", messages.len()),
        messages,
    )))
}
