//! Domain error types.

use common::{AuthorId, BookId, CartItemId, CategoryId, OrderId, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// Errors raised by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A quantity update asked for more copies than are in stock. The
    /// line item is left unchanged.
    #[error("only {available} of {title:?} in stock")]
    QuantityExceedsStock { title: String, available: u32 },
}

/// Errors raised by checkout and order administration.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout was submitted with an empty cart; nothing was written.
    #[error("cart is empty")]
    EmptyCart,

    /// An administrator submitted a status value outside the five
    /// known states.
    #[error("unknown order status {0:?}")]
    InvalidStatus(String),

    /// The requested status change is not a legal transition.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the persistence layer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A cart mutation was rejected.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// A checkout or order administration step was rejected.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// The referenced book does not exist.
    #[error("book {0} not found")]
    BookNotFound(BookId),

    /// The referenced author does not exist.
    #[error("author {0} not found")]
    AuthorNotFound(AuthorId),

    /// The referenced category does not exist.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// The referenced cart line does not exist.
    #[error("cart item {0} not found")]
    CartItemNotFound(CartItemId),

    /// The referenced order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
}
