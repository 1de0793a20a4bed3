// src/web/handlers/site_handlers.rs - public front stage
use crate::app_log;
use crate::contact::ContactBook;
use crate::controller::FormController;
use crate::render::{render_page, RenderContext};
use crate::types::ResumeDocument;
use crate::web::types::*;

use chrono::Utc;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;

use super::storage_error;

pub async fn index_handler(
    controller: &State<FormController>,
    render: &State<RenderContext>,
) -> RawHtml<String> {
    let doc = controller.front_document().await;
    let ctx = render
        .inner()
        .clone()
        .with_cache_bust(Utc::now().timestamp_millis());
    RawHtml(render_page(&doc, &ctx))
}

pub async fn health_handler() -> Json<TextResponse> {
    app_log!(debug, "Health check");
    Json(TextResponse::success("OK".to_string()))
}

pub async fn document_handler(controller: &State<FormController>) -> Json<DataResponse<ResumeDocument>> {
    let doc = controller.front_document().await;
    Json(DataResponse::success("Current document".to_string(), doc))
}

pub async fn contact_handler(
    request: Json<ContactRequest>,
    contacts: &State<ContactBook>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    match contacts
        .submit(&request.name, &request.email, &request.message)
        .await
    {
        Ok(Some(_)) => Ok(Json(ActionResponse::success(
            "Thanks, your message has been received".to_string(),
            "submitted".to_string(),
        ))),
        Ok(None) => Err(Json(StandardErrorResponse::new(
            "Name, email and message are required".to_string(),
            "INCOMPLETE_FORM".to_string(),
            vec!["Fill in every field before sending".to_string()],
        ))),
        Err(e) => Err(storage_error("Failed to store contact message", e)),
    }
}
