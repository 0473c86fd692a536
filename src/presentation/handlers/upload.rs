use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::services::UploadError;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub blob_key: String,
    pub file_name: String,
    pub file_size: u64,
    pub identifier: String,
    pub letter_date: Option<String>,
    pub letter_body: Option<String>,
    pub num_pages: u32,
    pub uploaded_at: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn error_body(kind: &str, message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: kind.to_string(),
        message: message.into(),
    })
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            tracing::warn!("Upload request with no file");
            return (
                StatusCode::BAD_REQUEST,
                error_body("validation_error", "No file uploaded"),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read multipart");
            return (
                StatusCode::BAD_REQUEST,
                error_body("validation_error", format!("Failed to read multipart: {}", e)),
            )
                .into_response();
        }
    };

    let filename = field.file_name().unwrap_or("unknown").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    tracing::debug!(filename = %filename, content_type = %content_type, "Processing letter upload");

    let data = match field.bytes().await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read file bytes");
            return (
                StatusCode::BAD_REQUEST,
                error_body("validation_error", format!("Failed to read file: {}", e)),
            )
                .into_response();
        }
    };

    match state
        .ingest_service
        .ingest(data, &content_type, &filename)
        .await
    {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "Letter uploaded".to_string(),
                blob_key: receipt.blob_key.to_string(),
                file_name: receipt.file_name,
                file_size: receipt.file_size,
                identifier: receipt.identifier,
                letter_date: receipt.letter_date,
                letter_body: receipt.letter_body,
                num_pages: receipt.num_pages,
                uploaded_at: receipt.uploaded_at.to_rfc3339(),
            }),
        )
            .into_response(),
        Err(e) => upload_error_response(e),
    }
}

fn upload_error_response(error: UploadError) -> axum::response::Response {
    match &error {
        UploadError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            error_body("validation_error", error.to_string()),
        )
            .into_response(),
        UploadError::Duplicate { .. } => (
            StatusCode::CONFLICT,
            error_body("duplicate", error.to_string()),
        )
            .into_response(),
        UploadError::Extraction(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_body("corrupted_file", error.to_string()),
        )
            .into_response(),
        UploadError::BlobStore(_) | UploadError::RecordStore(_) => {
            tracing::error!(error = %error, "Upload failed on persistence");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("persistence_error", error.to_string()),
            )
                .into_response()
        }
    }
}
