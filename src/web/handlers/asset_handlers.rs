// src/web/handlers/asset_handlers.rs - avatar and credential photo uploads
use crate::app_log;
use crate::controller::{AdminSnapshot, FormController, SyncStatus};
use crate::web::types::*;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rocket::serde::json::Json;
use rocket::State;

use super::controller_error;

/// Decode an upload body, accepting both bare base64 and `data:` URLs
pub fn decode_upload(content: &str) -> Result<Vec<u8>, Json<StandardErrorResponse>> {
    let payload = match content.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => content,
    };

    STANDARD.decode(payload.trim()).map_err(|e| {
        app_log!(warn, "Rejected upload with invalid base64: {}", e);
        Json(StandardErrorResponse::new(
            "Upload content is not valid base64".to_string(),
            "INVALID_UPLOAD".to_string(),
            vec!["Send the file content base64-encoded in content_base64".to_string()],
        ))
    })
}

fn require_file_name(request: &AssetUploadRequest) -> Result<(), Json<StandardErrorResponse>> {
    if request.file_name.trim().is_empty() {
        return Err(Json(StandardErrorResponse::new(
            "File name is required".to_string(),
            "INVALID_UPLOAD".to_string(),
            vec!["Include the original file name with its extension".to_string()],
        )));
    }
    Ok(())
}

pub async fn upload_avatar_handler(
    request: Json<AssetUploadRequest>,
    controller: &State<FormController>,
) -> Result<Json<DataResponse<AdminSnapshot>>, Json<StandardErrorResponse>> {
    require_file_name(&request)?;
    let bytes = decode_upload(&request.content_base64)?;

    app_log!(info, "Uploading avatar {} ({} bytes)", request.file_name, bytes.len());
    let snapshot = controller
        .upload_avatar(request.file_name.trim(), &bytes)
        .await
        .map_err(controller_error)?;

    Ok(Json(DataResponse::success(
        "Avatar uploaded and published".to_string(),
        snapshot,
    )))
}

pub async fn upload_photo_handler(
    request: Json<AssetUploadRequest>,
    controller: &State<FormController>,
) -> Result<Json<DataResponse<UploadedAsset>>, Json<StandardErrorResponse>> {
    require_file_name(&request)?;
    let bytes = decode_upload(&request.content_base64)?;

    app_log!(info, "Uploading photo {} ({} bytes)", request.file_name, bytes.len());
    let uploaded = controller
        .upload_photo(request.file_name.trim(), &bytes)
        .await
        .map_err(controller_error)?;

    let message = match uploaded.sync {
        SyncStatus::Published { .. } => "Photo uploaded, use the URL as the entry's photo path",
        _ => "Photo uploaded but the document was not published, use the URL and save again",
    };
    Ok(Json(DataResponse::success(message.to_string(), uploaded)))
}
