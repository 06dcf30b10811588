use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, Result},
    extract,
};

use super::model::{Order, OrderRequest};

fn validated(req: &OrderRequest) -> Result<()> {
    match req.validate() {
        Some(msg) => Err(AppError::Validation(msg)),
        None => Ok(()),
    }
}

fn not_found(order_id: i32) -> AppError {
    AppError::NotFound(format!("Order {}", order_id))
}

#[axum::debug_handler]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(Order::list(&state.pool).await?))
}

#[axum::debug_handler]
pub async fn get_order(
    State(state): State<AppState>,
    extract::Path(order_id): extract::Path<i32>,
) -> Result<Json<Order>> {
    Order::find_by_id(&state.pool, order_id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(order_id))
}

#[axum::debug_handler]
pub async fn create_order(
    State(state): State<AppState>,
    extract::Json(req): extract::Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    validated(&req)?;

    let order = Order::create(&state.pool, &req).await?;
    tracing::info!("Created order {}", order.order_id);

    Ok((StatusCode::CREATED, Json(order)))
}

#[axum::debug_handler]
pub async fn update_order(
    State(state): State<AppState>,
    extract::Path(order_id): extract::Path<i32>,
    extract::Json(req): extract::Json<OrderRequest>,
) -> Result<Json<Order>> {
    validated(&req)?;

    Order::update(&state.pool, order_id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(order_id))
}

#[axum::debug_handler]
pub async fn delete_order(
    State(state): State<AppState>,
    extract::Path(order_id): extract::Path<i32>,
) -> Result<Json<Value>> {
    if Order::delete(&state.pool, order_id).await? {
        tracing::info!("Deleted order {}", order_id);
        Ok(Json(json!({ "deleted": order_id })))
    } else {
        Err(not_found(order_id))
    }
}
