//! Medication formulary search

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::Medication;
use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search_medications))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    medications: Vec<Medication>,
}

async fn search_medications(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let term = query.q.unwrap_or_default();
    let medications = state.orders().search_medications(&term).await?;
    Ok(Json(SearchResponse {
        success: true,
        medications,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::routes::test_support::{body_json, get, TestApp};

    #[tokio::test]
    async fn test_search() {
        let app = TestApp::new(Vec::new()).await;

        let response = app
            .router()
            .oneshot(get("/api/medications/search?q=lisin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["medications"][0]["name"], "Lisinopril");
        assert_eq!(body["medications"][0]["genericName"], "Lisinopril");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = TestApp::new(Vec::new()).await;

        for uri in ["/api/medications/search", "/api/medications/search?q=%20"] {
            let response = app.router().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
