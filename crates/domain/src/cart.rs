//! Cart resolution and mutation.
//!
//! A cart is resolved lazily: the first access for a given identity
//! creates it. Mutations check live stock at call time; there is no
//! reservation, so the usual check-then-commit window applies between
//! a cart mutation and the eventual checkout (which re-checks under a
//! row lock).

use common::{BookId, CartItemId, Identity, Money};
use serde::Serialize;
use store::{Cart, CartLine, Store};

use crate::error::{CartError, DomainError};

/// A cart joined with its lines and live-priced totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    pub total_price: Money,
    pub total_items: u32,
}

/// Result of adding a book to a cart.
///
/// `OutOfStock` and `StockLimited` are warnings rather than errors:
/// the request succeeds, the caller surfaces the message, and the cart
/// is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line with quantity 1 was created.
    Added { title: String },
    /// The existing line's quantity was incremented by 1.
    Incremented { title: String, quantity: u32 },
    /// The book has no stock at all; nothing was changed.
    OutOfStock { title: String },
    /// Another copy would exceed current stock; the line keeps its
    /// quantity.
    StockLimited { title: String, available: u32 },
}

/// Result of a quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// The line now has exactly the requested quantity.
    Updated { title: String, quantity: u32 },
    /// The requested quantity was zero, so the line was deleted.
    Removed { title: String },
}

/// Resolves identities to carts and mutates cart lines.
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service on top of the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the single cart for an identity, creating it on first
    /// access.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, owner: &Identity) -> Result<Cart, DomainError> {
        if let Some(cart) = self.store.find_cart(owner).await? {
            return Ok(cart);
        }
        let cart = self.store.create_cart(owner).await?;
        metrics::counter!("carts_created_total").increment(1);
        tracing::debug!(cart_id = %cart.id, %owner, "created cart");
        Ok(cart)
    }

    /// Returns the cart with its lines and live totals.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self, owner: &Identity) -> Result<CartView, DomainError> {
        let cart = self.resolve(owner).await?;
        let lines = self.store.cart_lines(cart.id).await?;
        let total_price = lines.iter().map(CartLine::subtotal).sum();
        let total_items = lines.iter().map(|line| line.item.quantity).sum();
        Ok(CartView {
            cart,
            lines,
            total_price,
            total_items,
        })
    }

    /// Adds one copy of a book to the identity's cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_book(
        &self,
        owner: &Identity,
        book_id: BookId,
    ) -> Result<AddOutcome, DomainError> {
        let book = self
            .store
            .get_book(book_id)
            .await?
            .ok_or(DomainError::BookNotFound(book_id))?;

        if book.stock_quantity == 0 {
            metrics::counter!("cart_add_rejections_total").increment(1);
            return Ok(AddOutcome::OutOfStock { title: book.title });
        }

        let cart = self.resolve(owner).await?;

        match self.store.find_cart_item_by_book(cart.id, book_id).await? {
            None => {
                self.store.insert_cart_item(cart.id, book_id, 1).await?;
                metrics::counter!("cart_adds_total").increment(1);
                Ok(AddOutcome::Added { title: book.title })
            }
            Some(item) => {
                let wanted = item.quantity + 1;
                if wanted > book.stock_quantity {
                    metrics::counter!("cart_add_rejections_total").increment(1);
                    return Ok(AddOutcome::StockLimited {
                        title: book.title,
                        available: book.stock_quantity,
                    });
                }
                self.store.set_cart_item_quantity(item.id, wanted).await?;
                metrics::counter!("cart_adds_total").increment(1);
                Ok(AddOutcome::Incremented {
                    title: book.title,
                    quantity: wanted,
                })
            }
        }
    }

    /// Sets a cart line to an exact quantity; zero deletes the line.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<QuantityOutcome, DomainError> {
        let line = self
            .store
            .find_cart_item(item_id)
            .await?
            .ok_or(DomainError::CartItemNotFound(item_id))?;

        if quantity == 0 {
            self.store.delete_cart_item(item_id).await?;
            return Ok(QuantityOutcome::Removed {
                title: line.book.title,
            });
        }

        if quantity > line.book.stock_quantity {
            return Err(CartError::QuantityExceedsStock {
                title: line.book.title,
                available: line.book.stock_quantity,
            }
            .into());
        }

        self.store.set_cart_item_quantity(item_id, quantity).await?;
        Ok(QuantityOutcome::Updated {
            title: line.book.title,
            quantity,
        })
    }

    /// Deletes a cart line unconditionally. Returns the book title for
    /// the caller's flash message.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, item_id: CartItemId) -> Result<String, DomainError> {
        let line = self
            .store
            .find_cart_item(item_id)
            .await?
            .ok_or(DomainError::CartItemNotFound(item_id))?;

        self.store.delete_cart_item(item_id).await?;
        Ok(line.book.title)
    }
}
