use async_trait::async_trait;
use common::{AuthorId, BookId, CartId, CartItemId, CategoryId, Identity, OrderId, OrderStatus};

use crate::Result;
use crate::models::{
    Author, Book, BookFilter, Cart, CartItem, CartLine, Category, NewAuthor, NewBook, NewCategory,
    Order, OrderItem, ShippingDetails, StatusCounts,
};

/// Core trait for bookstore persistence backends.
///
/// All implementations must be thread-safe (`Send + Sync`). Operations
/// that touch multiple rows ([`Store::create_order`],
/// [`Store::fulfill_order`]) are atomic: either every write lands or
/// none do.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Catalog --

    /// Inserts an author.
    async fn insert_author(&self, new: NewAuthor) -> Result<Author>;

    /// Inserts a category.
    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    /// Inserts a book along with its category memberships.
    async fn insert_book(&self, new: NewBook) -> Result<Book>;

    /// Lists books matching the filter, ordered by title.
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>>;

    /// Fetches a single book.
    async fn get_book(&self, id: BookId) -> Result<Option<Book>>;

    /// Lists all authors, ordered by name.
    async fn list_authors(&self) -> Result<Vec<Author>>;

    /// Fetches a single author.
    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>>;

    /// Lists all categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Fetches a single category.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists the categories a book belongs to, ordered by name.
    async fn categories_of_book(&self, id: BookId) -> Result<Vec<Category>>;

    // -- Carts --

    /// Finds the cart owned by an identity, if one exists.
    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>>;

    /// Creates a cart for an identity.
    ///
    /// Callers are expected to have checked [`Store::find_cart`] first;
    /// the schema rejects a second cart for the same identity.
    async fn create_cart(&self, owner: &Identity) -> Result<Cart>;

    /// Returns the cart's lines joined with their books, oldest first.
    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>>;

    /// Fetches a single cart line with its book.
    async fn find_cart_item(&self, item_id: CartItemId) -> Result<Option<CartLine>>;

    /// Finds the line for a given book within a cart.
    async fn find_cart_item_by_book(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<Option<CartItem>>;

    /// Inserts a new cart line.
    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartItem>;

    /// Sets a cart line's quantity. A no-op when the line is gone.
    async fn set_cart_item_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<()>;

    /// Deletes a cart line. A no-op when the line is gone.
    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<()>;

    /// Deletes every line in a cart.
    async fn clear_cart(&self, cart_id: CartId) -> Result<()>;

    // -- Orders --

    /// Materializes an order in one transaction.
    ///
    /// Locks the referenced book rows, re-checks each requested
    /// quantity against live stock, snapshots the current unit prices
    /// into order items, and computes `total_amount` as the sum of the
    /// item subtotals. Fails with
    /// [`StoreError::InsufficientStock`](crate::StoreError::InsufficientStock)
    /// without writing anything if any line exceeds stock. Stock is
    /// not decremented here; that happens in [`Store::fulfill_order`].
    async fn create_order(
        &self,
        owner: &Identity,
        shipping: ShippingDetails,
        lines: &[(BookId, u32)],
    ) -> Result<Order>;

    /// Fetches a single order.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the order's snapshotted line items.
    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists all orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Counts orders in the states the admin dashboard surfaces.
    async fn status_counts(&self) -> Result<StatusCounts>;

    /// Sets an order's status.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Decrements stock for every line of the order and stamps
    /// `fulfilled_at`, atomically.
    ///
    /// Returns `false` without touching stock when the order was
    /// already fulfilled, making the order-success side effect
    /// idempotent.
    async fn fulfill_order(&self, id: OrderId) -> Result<bool>;
}
