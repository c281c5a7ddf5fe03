use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{AuthorId, BookId, CartId, CartItemId, CategoryId, Identity, OrderId, OrderStatus};
use tokio::sync::RwLock;

use crate::store::Store;
use crate::{Result, StoreError};
use crate::models::{
    Author, Book, BookFilter, Cart, CartItem, CartLine, Category, NewAuthor, NewBook, NewCategory,
    Order, OrderItem, ShippingDetails, StatusCounts,
};

#[derive(Default)]
struct Inner {
    authors: HashMap<AuthorId, Author>,
    categories: HashMap<CategoryId, Category>,
    books: HashMap<BookId, Book>,
    book_categories: HashMap<BookId, Vec<CategoryId>>,
    carts: HashMap<CartId, Cart>,
    cart_items: HashMap<CartItemId, CartItem>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderId, Vec<OrderItem>>,
}

impl Inner {
    fn matches(&self, book: &Book, filter: &BookFilter) -> bool {
        if let Some(author) = filter.author
            && book.author_id != author
        {
            return false;
        }
        if let Some(category) = filter.category
            && !self
                .book_categories
                .get(&book.id)
                .is_some_and(|cats| cats.contains(&category))
        {
            return false;
        }
        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            let title_hit = book.title.to_lowercase().contains(&needle);
            let author_hit = self
                .authors
                .get(&book.author_id)
                .is_some_and(|a| a.name.to_lowercase().contains(&needle));
            if !title_hit && !author_hit {
                return false;
            }
        }
        true
    }
}

/// In-memory store implementation.
///
/// Backs tests and the no-database demo run with the same interface as
/// the PostgreSQL implementation. A single lock over all tables makes
/// the multi-row order operations trivially atomic.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_author(&self, new: NewAuthor) -> Result<Author> {
        let now = Utc::now();
        let author = Author {
            id: AuthorId::new(),
            name: new.name,
            bio: new.bio,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .authors
            .insert(author.id, author.clone());
        Ok(author)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
        };
        self.inner
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn insert_book(&self, new: NewBook) -> Result<Book> {
        let now = Utc::now();
        let book = Book {
            id: BookId::new(),
            title: new.title,
            price: new.price,
            author_id: new.author_id,
            isbn: new.isbn,
            publication_date: new.publication_date,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().await;
        inner.book_categories.insert(book.id, new.categories);
        inner.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let inner = self.inner.read().await;
        let mut books: Vec<_> = inner
            .books
            .values()
            .filter(|b| inner.matches(b, filter))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let inner = self.inner.read().await;
        let mut authors: Vec<_> = inner.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>> {
        Ok(self.inner.read().await.authors.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<_> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn categories_of_book(&self, id: BookId) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<_> = inner
            .book_categories
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|cid| inner.categories.get(cid).cloned())
                    .collect()
            })
            .unwrap_or_default();
        categories.sort_by(|a: &Category, b: &Category| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.values().find(|c| &c.owner == owner).cloned())
    }

    async fn create_cart(&self, owner: &Identity) -> Result<Cart> {
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(),
            owner: owner.clone(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let inner = self.inner.read().await;
        let mut lines: Vec<CartLine> = inner
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .filter_map(|item| {
                inner.books.get(&item.book_id).map(|book| CartLine {
                    item: item.clone(),
                    book: book.clone(),
                })
            })
            .collect();
        lines.sort_by_key(|line| line.item.added_at);
        Ok(lines)
    }

    async fn find_cart_item(&self, item_id: CartItemId) -> Result<Option<CartLine>> {
        let inner = self.inner.read().await;
        Ok(inner.cart_items.get(&item_id).and_then(|item| {
            inner.books.get(&item.book_id).map(|book| CartLine {
                item: item.clone(),
                book: book.clone(),
            })
        }))
    }

    async fn find_cart_item_by_book(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<Option<CartItem>> {
        let inner = self.inner.read().await;
        Ok(inner
            .cart_items
            .values()
            .find(|item| item.cart_id == cart_id && item.book_id == book_id)
            .cloned())
    }

    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartItem> {
        let item = CartItem {
            id: CartItemId::new(),
            cart_id,
            book_id,
            quantity,
            added_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .cart_items
            .insert(item.id, item.clone());
        Ok(item)
    }

    async fn set_cart_item_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(item) = inner.cart_items.get_mut(&item_id) {
            item.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<()> {
        self.inner.write().await.cart_items.remove(&item_id);
        Ok(())
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<()> {
        self.inner
            .write()
            .await
            .cart_items
            .retain(|_, item| item.cart_id != cart_id);
        Ok(())
    }

    async fn create_order(
        &self,
        owner: &Identity,
        shipping: ShippingDetails,
        lines: &[(BookId, u32)],
    ) -> Result<Order> {
        let mut inner = self.inner.write().await;

        // Validate every line against live stock before writing anything.
        let mut items = Vec::with_capacity(lines.len());
        for &(book_id, quantity) in lines {
            let book = inner
                .books
                .get(&book_id)
                .ok_or(StoreError::BookMissing(book_id))?;
            if quantity > book.stock_quantity {
                return Err(StoreError::InsufficientStock {
                    title: book.title.clone(),
                    requested: quantity,
                    available: book.stock_quantity,
                });
            }
            items.push((book_id, quantity, book.price));
        }

        let now = Utc::now();
        let order_id = OrderId::new();
        let order_items: Vec<OrderItem> = items
            .into_iter()
            .map(|(book_id, quantity, unit_price)| OrderItem {
                order_id,
                book_id,
                quantity,
                unit_price,
            })
            .collect();
        let total_amount = order_items.iter().map(OrderItem::subtotal).sum();

        let order = Order {
            id: order_id,
            owner: owner.clone(),
            shipping,
            total_amount,
            status: OrderStatus::Pending,
            fulfilled_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order_id, order.clone());
        inner.order_items.insert(order_id, order_items);
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .inner
            .read()
            .await
            .order_items
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let inner = self.inner.read().await;
        let mut counts = StatusCounts::default();
        for order in inner.orders.values() {
            match order.status {
                OrderStatus::Pending => counts.pending += 1,
                OrderStatus::Processing => counts.processing += 1,
                OrderStatus::Shipped => counts.shipped += 1,
                OrderStatus::Delivered | OrderStatus::Cancelled => {}
            }
        }
        Ok(counts)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(order) = inner.orders.get_mut(&id) {
            order.status = status;
            order.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn fulfill_order(&self, id: OrderId) -> Result<bool> {
        let mut inner = self.inner.write().await;

        match inner.orders.get(&id) {
            Some(order) if order.fulfilled_at.is_none() => {}
            _ => return Ok(false),
        }

        let items = inner.order_items.get(&id).cloned().unwrap_or_default();
        for item in &items {
            if let Some(book) = inner.books.get_mut(&item.book_id) {
                book.stock_quantity = book.stock_quantity.saturating_sub(item.quantity);
                book.updated_at = Utc::now();
            }
        }
        if let Some(order) = inner.orders.get_mut(&id) {
            order.fulfilled_at = Some(Utc::now());
            order.updated_at = Utc::now();
        }
        Ok(true)
    }
}
