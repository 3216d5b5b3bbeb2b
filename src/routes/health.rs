//! Health check endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::{self, DashboardStats};
use crate::ocr::OcrMethod;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub ocr: OcrAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DashboardStats>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrAvailability {
    pub ocr_space: bool,
    pub azure_vision: bool,
}

/// Liveness plus a summary of dependencies; always 200
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = db::ping(state.db()).await;

    let stats = if connected {
        match state.orders().dashboard_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("Health check could not load stats: {}", e);
                None
            }
        }
    } else {
        None
    };

    let methods = state.ocr().configured_methods();

    Json(HealthResponse {
        status: "healthy",
        service: "pharmacy-assistant-server",
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "unavailable" },
        ocr: OcrAvailability {
            ocr_space: methods.contains(&OcrMethod::OcrSpace),
            azure_vision: methods.contains(&OcrMethod::AzureVision),
        },
        stats,
    })
}
