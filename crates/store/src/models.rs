//! Persisted entities and the input/filter types that feed them.

use chrono::{DateTime, NaiveDate, Utc};
use common::{
    AuthorId, BookId, CartId, CartItemId, CategoryId, Identity, Money, OrderId, OrderStatus,
};
use serde::{Deserialize, Serialize};

/// An author in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an author.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub bio: String,
}

/// A book category. Names are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

/// A book in the catalog.
///
/// `stock_quantity` is the live inventory count; it is only ever
/// mutated by the stock decrement when an order is fulfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub price: Money,
    pub author_id: AuthorId,
    pub isbn: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a book, including its category memberships.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub price: Money,
    pub author_id: AuthorId,
    pub isbn: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub stock_quantity: u32,
    pub categories: Vec<CategoryId>,
}

/// Catalog listing filter. All criteria are optional and combine with
/// AND; `search` matches book titles and author names
/// (case-insensitive substring).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub author: Option<AuthorId>,
}

impl BookFilter {
    /// Returns true when no criteria are set.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.author.is_none()
    }
}

/// A shopping cart. Owned by exactly one identity; at most one cart
/// exists per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub owner: Identity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart: one (cart, book) pair with a quantity of at
/// least 1. Subtotals are live-priced from the current book price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub book_id: BookId,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined with its book, as needed by the cart view and
/// the checkout total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub book: Book,
}

impl CartLine {
    /// Live-priced subtotal: current book price × quantity.
    pub fn subtotal(&self) -> Money {
        self.book.price.times(self.item.quantity)
    }
}

/// Shipping details collected at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_string()
}

/// An immutable record of a completed checkout.
///
/// `total_amount` always equals the sum of the order's item subtotals:
/// both are computed from the same locked book rows in the transaction
/// that creates them. `fulfilled_at` records the one-shot stock
/// decrement so repeat visits to the success page change nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: Identity,
    pub shipping: ShippingDetails,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order with the unit price snapshotted at checkout
/// time, decoupled from later changes to the book's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Snapshot-priced subtotal: unit price at purchase × quantity.
    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Per-status order counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub shipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book(price_cents: i64) -> Book {
        Book {
            id: BookId::new(),
            title: "1984".to_string(),
            price: Money::from_cents(price_cents),
            author_id: AuthorId::new(),
            isbn: Some("9780451524935".to_string()),
            publication_date: None,
            stock_quantity: 50,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cart_line_subtotal_is_live_priced() {
        let book = sample_book(1599);
        let line = CartLine {
            item: CartItem {
                id: CartItemId::new(),
                cart_id: CartId::new(),
                book_id: book.id,
                quantity: 3,
                added_at: Utc::now(),
            },
            book,
        };
        assert_eq!(line.subtotal().cents(), 4797);
    }

    #[test]
    fn order_item_subtotal_uses_snapshot_price() {
        let item = OrderItem {
            order_id: OrderId::new(),
            book_id: BookId::new(),
            quantity: 2,
            unit_price: Money::from_cents(1000),
        };
        assert_eq!(item.subtotal().cents(), 2000);
    }

    #[test]
    fn empty_filter_reports_empty() {
        assert!(BookFilter::default().is_empty());
        let filter = BookFilter {
            search: Some("orwell".to_string()),
            ..BookFilter::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn shipping_country_defaults_on_deserialize() {
        let json = r#"{
            "email": "a@b.c",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "phone": "555-0100",
            "address": "1 Main St",
            "city": "Pune",
            "postal_code": "411001"
        }"#;
        let shipping: ShippingDetails = serde_json::from_str(json).unwrap();
        assert_eq!(shipping.country, "India");
    }
}
