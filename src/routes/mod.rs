//! Route modules for the Pharmacy Assistant server

pub mod dashboard;
pub mod extract;
pub mod health;
pub mod medications;
pub mod ocr;
pub mod orders;

use axum::{extract::rejection::JsonRejection, routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(&state.config().uploads.dir);
    let max_upload_bytes = state.config().uploads.max_bytes;

    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(ocr::router(max_upload_bytes))
        .merge(extract::router())
        .nest("/orders", orders::router())
        .nest("/dashboard", dashboard::router())
        .nest("/medications", medications::router());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Unwrap a JSON body, reporting malformed input in the usual error shape
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}
