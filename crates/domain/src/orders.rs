//! Checkout, fulfillment, and order administration.
//!
//! Checkout materializes a cart into an immutable order with
//! price-snapshotted line items. Stock is deliberately NOT decremented
//! at checkout: the decrement happens when the customer reaches the
//! order-success page, idempotently, in [`OrderService::finalize`].

use common::{Identity, OrderId, OrderStatus};
use serde::Serialize;
use store::{Order, OrderItem, ShippingDetails, StatusCounts, Store};

use crate::error::{DomainError, OrderError};

/// An order with its snapshotted line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Data behind the admin order dashboard: all orders newest-first plus
/// the in-flight status counts.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub orders: Vec<Order>,
    pub counts: StatusCounts,
}

/// Materializes, finalizes, and administers orders.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service on top of the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the identity's cart into an order.
    ///
    /// The store re-checks stock and snapshots prices under row locks
    /// in a single transaction; an empty (or missing) cart aborts
    /// before any write. The cart itself is left intact until
    /// [`OrderService::finalize`].
    #[tracing::instrument(skip(self, shipping))]
    pub async fn place_order(
        &self,
        owner: &Identity,
        shipping: ShippingDetails,
    ) -> Result<Order, DomainError> {
        let Some(cart) = self.store.find_cart(owner).await? else {
            return Err(OrderError::EmptyCart.into());
        };
        let lines = self.store.cart_lines(cart.id).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        let wanted: Vec<_> = lines
            .iter()
            .map(|line| (line.item.book_id, line.item.quantity))
            .collect();
        let order = self.store.create_order(owner, shipping, &wanted).await?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_total_cents").record(order.total_amount.cents() as f64);
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
        Ok(order)
    }

    /// Loads an order with its items, for the payment and success
    /// pages.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, order_id: OrderId) -> Result<OrderSummary, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let items = self.store.order_items(order_id).await?;
        Ok(OrderSummary { order, items })
    }

    /// Order-success side effect: decrement stock for every line
    /// (once) and clear the caller's cart.
    #[tracing::instrument(skip(self))]
    pub async fn finalize(
        &self,
        owner: &Identity,
        order_id: OrderId,
    ) -> Result<OrderSummary, DomainError> {
        if self.store.get_order(order_id).await?.is_none() {
            return Err(DomainError::OrderNotFound(order_id));
        }

        if self.store.fulfill_order(order_id).await? {
            metrics::counter!("orders_fulfilled_total").increment(1);
            tracing::info!(%order_id, "order fulfilled, stock decremented");
        }

        if let Some(cart) = self.store.find_cart(owner).await? {
            self.store.clear_cart(cart.id).await?;
        }

        self.summary(order_id).await
    }

    /// Admin dashboard: every order plus status counts.
    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, DomainError> {
        Ok(Dashboard {
            orders: self.store.list_orders().await?,
            counts: self.store.status_counts().await?,
        })
    }

    /// Applies an administrator's status change.
    ///
    /// Unknown values and illegal transitions are rejected instead of
    /// being silently dropped. Setting the current status again is
    /// treated as a no-op rather than an illegal self-transition.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order, DomainError> {
        let next: OrderStatus = status
            .parse()
            .map_err(|_| OrderError::InvalidStatus(status.to_string()))?;

        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        if next == order.status {
            return Ok(order);
        }
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            }
            .into());
        }

        self.store.update_order_status(order_id, next).await?;
        metrics::counter!("order_status_changes_total").increment(1);
        tracing::info!(%order_id, from = %order.status, to = %next, "order status updated");

        order.status = next;
        Ok(order)
    }
}
