//! Orders API routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::db::Order;
use crate::error::Result;
use crate::orders::OrderStatus;
use crate::state::AppState;

/// Create the orders router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:order_id", get(get_order))
        .route("/:order_id/status", put(update_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub prescription_text: String,
    pub prescription_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Serialize)]
struct OrderCreatedResponse {
    success: bool,
    #[serde(flatten)]
    order: Order,
}

#[derive(Serialize)]
struct OrderListResponse {
    success: bool,
    orders: Vec<Order>,
}

#[derive(Serialize)]
struct OrderResponse {
    success: bool,
    order: Order,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdatedResponse {
    success: bool,
    message: String,
    order_id: String,
    status: OrderStatus,
    order: Order,
}

async fn create_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>)> {
    let request = json_body(payload)?;
    let order = state
        .orders()
        .create_order(&request.prescription_text, request.prescription_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            success: true,
            order,
        }),
    ))
}

async fn list_orders(State(state): State<AppState>) -> Result<Json<OrderListResponse>> {
    let orders = state.orders().list_orders().await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>> {
    let order = state.orders().get_order(&order_id).await?;
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    payload: std::result::Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<StatusUpdatedResponse>> {
    let request = json_body(payload)?;
    let order = state
        .orders()
        .update_status(&order_id, &request.status)
        .await?;

    Ok(Json(StatusUpdatedResponse {
        success: true,
        message: format!("Order status updated to {}", order.status),
        order_id: order.order_id.clone(),
        status: order.status,
        order,
    }))
}
