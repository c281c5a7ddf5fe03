//! Order administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::Dashboard;
use serde::{Deserialize, Serialize};
use store::{Order, Store};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub order: Order,
    pub message: String,
}

/// GET /admin/orders — every order, newest first, with the in-flight
/// status counts.
#[tracing::instrument(skip(state))]
pub async fn dashboard<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.orders.dashboard().await?))
}

/// POST /admin/orders/:order_id/status — move an order along its
/// lifecycle. Unknown statuses are a 400, illegal transitions a 409.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order = state
        .orders
        .update_status(OrderId::from_uuid(order_id), &req.status)
        .await?;

    let message = format!("Order status updated to {}.", order.status);
    Ok(Json(StatusResponse { order, message }))
}
