//! Workflow services for the bookstore.
//!
//! This crate holds the behavior between HTTP and storage:
//! - [`CartService`] — resolves identities to carts and applies
//!   stock-bound line mutations
//! - [`OrderService`] — materializes carts into orders, runs the
//!   order-success fulfillment side effect, and administers the
//!   status machine
//! - [`CatalogService`] — browse/filter/search queries

pub mod cart;
pub mod catalog;
pub mod error;
pub mod orders;

pub use cart::{AddOutcome, CartService, CartView, QuantityOutcome};
pub use catalog::{AuthorDetail, BookDetail, CatalogService, CategoryDetail};
pub use error::{CartError, DomainError, OrderError};
pub use orders::{Dashboard, OrderService, OrderSummary};
