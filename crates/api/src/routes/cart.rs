//! Cart endpoints.
//!
//! Mutations respond with a `message`/`redirect` pair, mirroring the
//! flash-and-redirect flow of a storefront UI. Out-of-stock adds are a
//! 200 with a warning message, not an error: the cart is simply left
//! as it was.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{BookId, CartItemId, Money};
use domain::{AddOutcome, QuantityOutcome};
use serde::{Deserialize, Serialize};
use store::{CartLine, Store};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::ClientIdentity;

/// A flash message plus where the UI should go next.
#[derive(Serialize)]
pub struct FlashResponse {
    pub message: String,
    pub redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub total_price: Money,
    pub total_items: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
}

#[derive(Deserialize)]
pub struct QuantityRequest {
    pub quantity: u32,
}

/// GET /cart — the caller's cart with live-priced totals.
#[tracing::instrument(skip(state, caller))]
pub async fn view<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.carts.view(&caller.identity).await?;
    Ok(Json(CartResponse {
        lines: view.lines,
        total_price: view.total_price,
        total_items: view.total_items,
        session_key: caller.session_key(),
    }))
}

/// POST /cart/add/:book_id — add one copy of a book to the cart.
#[tracing::instrument(skip(state, caller))]
pub async fn add<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
    Path(book_id): Path<Uuid>,
) -> Result<Json<FlashResponse>, ApiError> {
    let outcome = state
        .carts
        .add_book(&caller.identity, BookId::from_uuid(book_id))
        .await?;

    let (message, redirect) = match outcome {
        AddOutcome::Added { title } => (format!("Added {title} to your cart."), "/cart"),
        AddOutcome::Incremented { title, quantity } => {
            (format!("Updated {title} quantity to {quantity}."), "/cart")
        }
        AddOutcome::OutOfStock { title } => {
            (format!("Sorry, {title} is out of stock."), "/books")
        }
        AddOutcome::StockLimited { title, available } => (
            format!("Sorry, only {available} copies of {title} available."),
            "/cart",
        ),
    };

    Ok(Json(FlashResponse {
        message,
        redirect: redirect.to_string(),
        session_key: caller.session_key(),
    }))
}

/// POST /cart/items/:item_id — set a line to an exact quantity;
/// zero removes it.
#[tracing::instrument(skip(state, caller, req))]
pub async fn update_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
    Path(item_id): Path<Uuid>,
    Json(req): Json<QuantityRequest>,
) -> Result<Json<FlashResponse>, ApiError> {
    let outcome = state
        .carts
        .set_quantity(CartItemId::from_uuid(item_id), req.quantity)
        .await?;

    let message = match outcome {
        QuantityOutcome::Updated { title, quantity } => {
            format!("Updated {title} quantity to {quantity}.")
        }
        QuantityOutcome::Removed { title } => format!("Removed {title} from your cart."),
    };

    Ok(Json(FlashResponse {
        message,
        redirect: "/cart".to_string(),
        session_key: caller.session_key(),
    }))
}

/// POST /cart/items/:item_id/remove — delete a line outright.
#[tracing::instrument(skip(state, caller))]
pub async fn remove_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: ClientIdentity,
    Path(item_id): Path<Uuid>,
) -> Result<Json<FlashResponse>, ApiError> {
    let title = state.carts.remove(CartItemId::from_uuid(item_id)).await?;

    Ok(Json(FlashResponse {
        message: format!("Removed {title} from your cart."),
        redirect: "/cart".to_string(),
        session_key: caller.session_key(),
    }))
}
