//! Shared value types for the bookstore service.
//!
//! Everything here is plain data used across the store, domain, and API
//! layers: entity identifiers, the owner [`Identity`] of carts and
//! orders, fixed-point [`Money`], and the [`OrderStatus`] state machine.

pub mod identity;
pub mod ids;
pub mod money;
pub mod status;

pub use identity::{Identity, SessionKey, UserId};
pub use ids::{AuthorId, BookId, CartId, CartItemId, CategoryId, OrderId};
pub use money::Money;
pub use status::OrderStatus;
