//! Persistence layer for the bookstore service.
//!
//! Defines the entity models, the [`Store`] trait, and two
//! implementations: [`PostgresStore`] for production and
//! [`InMemoryStore`] for tests and database-less demo runs. The two
//! multi-row workflows — order materialization and order fulfillment —
//! are atomic operations of the store, so callers never see a
//! half-written order or a partial stock decrement.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use models::{
    Author, Book, BookFilter, Cart, CartItem, CartLine, Category, NewAuthor, NewBook, NewCategory,
    Order, OrderItem, ShippingDetails, StatusCounts,
};
pub use postgres::PostgresStore;
pub use store::Store;
