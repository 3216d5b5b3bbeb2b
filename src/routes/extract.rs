//! Field extraction preview: parse text without creating an order

use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::error::Result;
use crate::extract::{extract_fields, DraftFields};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/extract", post(extract))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
struct ExtractResponse {
    success: bool,
    fields: DraftFields,
}

async fn extract(
    payload: std::result::Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>> {
    let request = json_body(payload)?;
    Ok(Json(ExtractResponse {
        success: true,
        fields: extract_fields(&request.text),
    }))
}
