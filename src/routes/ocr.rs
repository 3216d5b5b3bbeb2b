//! Prescription image upload and OCR

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{NewPrescription, PrescriptionRepository};
use crate::error::{AppError, Result};
use crate::ocr::{ImageInput, OcrMethod};
use crate::state::AppState;

/// Room for multipart framing on top of the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/ocr", post(recognize_prescription))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    pub method: OcrMethod,
    pub confidence: f64,
    pub prescription_id: i64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Accept an image under field `image` (or `file`), recognize it and record
/// the attempt as a prescription
async fn recognize_prescription(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrResponse>> {
    let max_bytes = state.ocr().max_image_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "image" && name != "file" {
            tracing::debug!("Skipping multipart field '{}'", name);
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .or_else(|| {
                filename
                    .as_deref()
                    .and_then(|f| mime_guess::from_path(f).first_raw())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;

        tracing::debug!("Received {} bytes of {}", data.len(), mime_type);

        return process_upload(&state, &data, &mime_type, filename.as_deref())
            .await
            .map(Json);
    }

    Err(AppError::InvalidInput(
        "No image file provided. Use field name 'image'".to_string(),
    ))
}

async fn process_upload(
    state: &AppState,
    data: &[u8],
    mime_type: &str,
    original_name: Option<&str>,
) -> Result<OcrResponse> {
    // Reject bad uploads before anything touches disk
    let image = ImageInput::validate(data, mime_type, state.ocr().max_image_bytes())?;

    let stored_name = format!(
        "prescription-{}.{}",
        Uuid::new_v4(),
        file_extension(mime_type, original_name)
    );
    let uploads = &state.config().uploads.dir;
    let stored_path = uploads.join(&stored_name);
    tokio::fs::create_dir_all(uploads).await?;
    tokio::fs::write(&stored_path, data).await?;

    let recorded = async {
        let result = state.ocr().extract_text(data, mime_type).await?;
        let prescription = PrescriptionRepository::new(state.db())
            .insert(&NewPrescription::from_ocr(&result, Some(stored_name.clone())))
            .await?;
        Ok::<_, AppError>((result, prescription))
    }
    .await;

    // No prescription row means nothing references the stored file
    let (result, prescription) = match recorded {
        Ok(recorded) => recorded,
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!("Failed to remove {}: {}", stored_path.display(), remove_err);
            }
            return Err(e);
        }
    };

    tracing::info!(
        prescription_id = prescription.id,
        method = %result.method,
        "Prescription recorded"
    );

    let image_url = format!("/uploads/{}", stored_name);

    if result.is_client_side() {
        Ok(OcrResponse {
            success: true,
            text: None,
            image_data: Some(image.data_url()),
            method: result.method,
            confidence: result.confidence,
            prescription_id: prescription.id,
            image_url,
            message: Some("Using client-side OCR processing".to_string()),
        })
    } else {
        Ok(OcrResponse {
            success: true,
            text: Some(result.text),
            image_data: None,
            method: result.method,
            confidence: result.confidence,
            prescription_id: prescription.id,
            image_url,
            message: None,
        })
    }
}

/// Extension for the stored file: the upload's own, else one implied by the MIME type
fn file_extension(mime_type: &str, original_name: Option<&str>) -> String {
    let from_name = original_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "img".to_string())
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The body limit trips before the full size is known
        AppError::PayloadTooLarge {
            size: max_bytes + 1,
            max: max_bytes,
        }
    } else {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::InvalidInput(format!("Failed to read upload: {}", e.body_text()))
    }
}
