//! Dashboard statistics

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::DashboardStats;
use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard_stats))
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    stats: DashboardStats,
}

async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.orders().dashboard_stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::routes::test_support::{body_json, get, TestApp};

    #[tokio::test]
    async fn test_stats() {
        let app = TestApp::new(Vec::new()).await;
        app.state
            .orders()
            .create_order("Patient: Jane Roe\nRx: Lisinopril 10mg", None)
            .await
            .unwrap();

        let response = app.router().oneshot(get("/api/dashboard/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["stats"]["totalOrders"], 1);
        assert_eq!(body["stats"]["pendingOrders"], 1);
        assert_eq!(body["stats"]["completedOrders"], 0);
        assert_eq!(body["stats"]["todayOrders"], 1);
    }
}
