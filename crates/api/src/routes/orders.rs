//! Checkout, payment, and order-success endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::OrderSummary;
use serde::Serialize;
use store::{Order, ShippingDetails, Store};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub message: String,
    pub redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub order: Order,
    pub items: Vec<store::OrderItem>,
    pub message: String,
}

/// POST /checkout — materialize the caller's cart into an order.
///
/// The cart and stock are left untouched; the response points the
/// client at the payment page.
#[tracing::instrument(skip(state, caller, shipping))]
pub async fn checkout<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
    Json(shipping): Json<ShippingDetails>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let order = state
        .orders
        .place_order(&caller.identity, shipping)
        .await?;

    let redirect = format!("/payment/{}", order.id);
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order,
            message: "Order placed. Proceed to payment.".to_string(),
            redirect,
            session_key: caller.session_key(),
        }),
    ))
}

/// GET /payment/:order_id — the order summary shown on the payment
/// page. Payment itself is handled by an external provider.
#[tracing::instrument(skip(state))]
pub async fn payment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderSummary>, ApiError> {
    let summary = state.orders.summary(OrderId::from_uuid(order_id)).await?;
    Ok(Json(summary))
}

/// GET /orders/:order_id/success — the landing page after payment.
///
/// First visit decrements stock for every line and clears the caller's
/// cart; refreshes change nothing further.
#[tracing::instrument(skip(state, caller))]
pub async fn success<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
    Path(order_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let summary = state
        .orders
        .finalize(&caller.identity, OrderId::from_uuid(order_id))
        .await?;

    Ok(Json(SuccessResponse {
        order: summary.order,
        items: summary.items,
        message: "Your order has been placed successfully!".to_string(),
    }))
}
