pub mod admin_handlers;
pub mod asset_handlers;
pub mod site_handlers;

pub use admin_handlers::*;
pub use asset_handlers::*;
pub use site_handlers::*;

use rocket::serde::json::Json;

use crate::app_log;
use crate::controller::ControllerError;
use crate::core::remote_mirror::MirrorError;
use crate::session::SessionError;
use crate::web::types::StandardErrorResponse;

pub(crate) fn controller_error(e: ControllerError) -> Json<StandardErrorResponse> {
    let suggestions = match &e {
        ControllerError::EmptySubmission(field) => vec![format!("Fill in the {} field", field)],
        ControllerError::RemoteUnavailable => vec![
            "Check the mirror repository settings".to_string(),
            "Publish the document at least once before pulling".to_string(),
        ],
        ControllerError::Mirror(MirrorError::MissingCredential) => vec![
            "Store a GitHub token in the admin settings".to_string(),
            "Or start the server with CV_GITHUB_TOKEN set".to_string(),
        ],
        ControllerError::Mirror(MirrorError::Conflict { .. }) => vec![
            "The remote copy changed since it was last read".to_string(),
            "Pull the remote document and apply your change again".to_string(),
        ],
        ControllerError::Mirror(MirrorError::InvalidAsset(asset)) => vec![asset.suggestion.clone()],
        ControllerError::Mirror(_) => vec![
            "Your change is saved locally".to_string(),
            "Try publishing again in a few moments".to_string(),
        ],
    };

    Json(StandardErrorResponse::new(
        e.to_string(),
        e.code().to_string(),
        suggestions,
    ))
}

pub(crate) fn session_error(e: SessionError) -> Json<StandardErrorResponse> {
    let suggestions = match &e {
        SessionError::InvalidCredentials => vec!["Check the username and password".to_string()],
        SessionError::IncompleteForm
        | SessionError::WrongPassword
        | SessionError::ConfirmationMismatch => {
            vec!["Enter the current password and the new password twice".to_string()]
        }
        SessionError::Storage(_) => vec!["Try again in a few moments".to_string()],
    };

    Json(StandardErrorResponse::new(
        e.to_string(),
        e.code().to_string(),
        suggestions,
    ))
}

pub(crate) fn storage_error(context: &str, e: anyhow::Error) -> Json<StandardErrorResponse> {
    app_log!(error, "{}: {:#}", context, e);
    Json(StandardErrorResponse::new(
        context.to_string(),
        "STORAGE_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    ))
}
