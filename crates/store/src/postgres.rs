use async_trait::async_trait;
use chrono::Utc;
use common::{
    AuthorId, BookId, CartId, CartItemId, CategoryId, Identity, Money, OrderId, OrderStatus,
    SessionKey, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::store::Store;
use crate::{Result, StoreError};
use crate::models::{
    Author, Book, BookFilter, Cart, CartItem, CartLine, Category, NewAuthor, NewBook, NewCategory,
    Order, OrderItem, ShippingDetails, StatusCounts,
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_author(row: &PgRow) -> Result<Author> {
        Ok(Author {
            id: AuthorId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            bio: row.try_get("bio")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_book(row: &PgRow) -> Result<Book> {
        Ok(Book {
            id: BookId::from_uuid(row.try_get("id")?),
            title: row.try_get("title")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            author_id: AuthorId::from_uuid(row.try_get("author_id")?),
            isbn: row.try_get("isbn")?,
            publication_date: row.try_get("publication_date")?,
            stock_quantity: row.try_get::<i32, _>("stock_quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_item(row: &PgRow) -> Result<CartItem> {
        Ok(CartItem {
            id: CartItemId::from_uuid(row.try_get("item_id")?),
            cart_id: CartId::from_uuid(row.try_get("cart_id")?),
            book_id: BookId::from_uuid(row.try_get("book_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            added_at: row.try_get("added_at")?,
        })
    }

    fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
        Ok(CartLine {
            item: Self::row_to_cart_item(row)?,
            book: Self::row_to_book(row)?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|_| StoreError::Inconsistent("unrecognized value in orders.status"))?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id")?),
            owner: owner_from_columns(row.try_get("user_id")?, row.try_get("session_key")?)?,
            shipping: ShippingDetails {
                email: row.try_get("email")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                phone: row.try_get("phone")?,
                address: row.try_get("address")?,
                city: row.try_get("city")?,
                postal_code: row.try_get("postal_code")?,
                country: row.try_get("country")?,
            },
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status,
            fulfilled_at: row.try_get("fulfilled_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            order_id: OrderId::from_uuid(row.try_get("order_id")?),
            book_id: BookId::from_uuid(row.try_get("book_id")?),
            quantity: row.try_get::<i32, _>("quantity")? as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }
}

/// Splits an identity into the nullable `user_id` / `session_key`
/// column pair (exactly one is Some).
fn owner_to_columns(owner: &Identity) -> (Option<Uuid>, Option<&str>) {
    match owner {
        Identity::User(id) => (Some(id.as_uuid()), None),
        Identity::Session(key) => (None, Some(key.as_str())),
    }
}

fn owner_from_columns(user_id: Option<Uuid>, session_key: Option<String>) -> Result<Identity> {
    match (user_id, session_key) {
        (Some(id), None) => Ok(Identity::User(UserId::from_uuid(id))),
        (None, Some(key)) => Ok(Identity::Session(SessionKey::new(key))),
        _ => Err(StoreError::Inconsistent(
            "owner must be exactly one of user_id / session_key",
        )),
    }
}

const BOOK_COLUMNS: &str =
    "id, title, price_cents, author_id, isbn, publication_date, stock_quantity, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, session_key, email, first_name, last_name, phone, \
     address, city, postal_code, country, total_amount_cents, status, fulfilled_at, \
     created_at, updated_at";

const CART_LINE_COLUMNS: &str = "ci.id AS item_id, ci.cart_id, ci.book_id, ci.quantity, ci.added_at, \
     b.id, b.title, b.price_cents, b.author_id, b.isbn, b.publication_date, b.stock_quantity, \
     b.created_at, b.updated_at";

#[async_trait]
impl Store for PostgresStore {
    async fn insert_author(&self, new: NewAuthor) -> Result<Author> {
        let row = sqlx::query(
            r#"
            INSERT INTO authors (id, name, bio)
            VALUES ($1, $2, $3)
            RETURNING id, name, bio, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.bio)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_author(&row)
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_category(&row)
    }

    async fn insert_book(&self, new: NewBook) -> Result<Book> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (id, title, price_cents, author_id, isbn, publication_date, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOK_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(new.price.cents())
        .bind(new.author_id.as_uuid())
        .bind(&new.isbn)
        .bind(new.publication_date)
        .bind(new.stock_quantity as i32)
        .fetch_one(&mut *tx)
        .await?;

        let book = Self::row_to_book(&row)?;

        for category_id in &new.categories {
            sqlx::query("INSERT INTO book_categories (book_id, category_id) VALUES ($1, $2)")
                .bind(book.id.as_uuid())
                .bind(category_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(book)
    }

    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut sql = format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id WHERE 1=1",
            BOOK_COLUMNS
                .split(", ")
                .map(|c| format!("b.{c}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        let mut param_count = 0;

        if filter.search.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND (b.title ILIKE ${param_count} OR a.name ILIKE ${param_count})"
            ));
        }
        if filter.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM book_categories bc \
                 WHERE bc.book_id = b.id AND bc.category_id = ${param_count})"
            ));
        }
        if filter.author.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND b.author_id = ${param_count}"));
        }

        sql.push_str(" ORDER BY b.title ASC");

        let mut query = sqlx::query(&sql);
        if let Some(ref search) = filter.search {
            query = query.bind(format!("%{search}%"));
        }
        if let Some(category) = filter.category {
            query = query.bind(category.as_uuid());
        }
        if let Some(author) = filter.author {
            query = query.bind(author.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_book).collect()
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_book).transpose()
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query(
            "SELECT id, name, bio, created_at, updated_at FROM authors ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_author).collect()
    }

    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>> {
        let row =
            sqlx::query("SELECT id, name, bio, created_at, updated_at FROM authors WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(Self::row_to_author).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn categories_of_book(&self, id: BookId) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.description
            FROM categories c
            JOIN book_categories bc ON bc.category_id = c.id
            WHERE bc.book_id = $1
            ORDER BY c.name ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn find_cart(&self, owner: &Identity) -> Result<Option<Cart>> {
        let (user_id, session_key) = owner_to_columns(owner);
        let row = sqlx::query(
            r#"
            SELECT id, user_id, session_key, created_at, updated_at
            FROM carts
            WHERE ($1::uuid IS NOT NULL AND user_id = $1)
               OR ($2::varchar IS NOT NULL AND session_key = $2)
            "#,
        )
        .bind(user_id)
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Cart {
                id: CartId::from_uuid(row.try_get("id")?),
                owner: owner_from_columns(row.try_get("user_id")?, row.try_get("session_key")?)?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn create_cart(&self, owner: &Identity) -> Result<Cart> {
        let (user_id, session_key) = owner_to_columns(owner);
        let row = sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, session_key)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(session_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(Cart {
            id: CartId::from_uuid(row.try_get("id")?),
            owner: owner.clone(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CART_LINE_COLUMNS}
            FROM cart_items ci
            JOIN books b ON b.id = ci.book_id
            WHERE ci.cart_id = $1
            ORDER BY ci.added_at ASC
            "#,
        ))
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_cart_line).collect()
    }

    async fn find_cart_item(&self, item_id: CartItemId) -> Result<Option<CartLine>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {CART_LINE_COLUMNS}
            FROM cart_items ci
            JOIN books b ON b.id = ci.book_id
            WHERE ci.id = $1
            "#,
        ))
        .bind(item_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_cart_line).transpose()
    }

    async fn find_cart_item_by_book(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<Option<CartItem>> {
        let row = sqlx::query(
            r#"
            SELECT id AS item_id, cart_id, book_id, quantity, added_at
            FROM cart_items
            WHERE cart_id = $1 AND book_id = $2
            "#,
        )
        .bind(cart_id.as_uuid())
        .bind(book_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_cart_item).transpose()
    }

    async fn insert_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, book_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id AS item_id, cart_id, book_id, quantity, added_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cart_id.as_uuid())
        .bind(book_id.as_uuid())
        .bind(quantity as i32)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_cart_item(&row)
    }

    async fn set_cart_item_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<()> {
        sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
            .bind(quantity as i32)
            .bind(item_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_order(
        &self,
        owner: &Identity,
        shipping: ShippingDetails,
        lines: &[(BookId, u32)],
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Lock each book row and snapshot its price while re-checking
        // stock; any shortfall rolls the whole order back.
        let mut items: Vec<(BookId, u32, Money)> = Vec::with_capacity(lines.len());
        for &(book_id, quantity) in lines {
            let row = sqlx::query(
                "SELECT title, price_cents, stock_quantity FROM books WHERE id = $1 FOR UPDATE",
            )
            .bind(book_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::BookMissing(book_id))?;

            let available = row.try_get::<i32, _>("stock_quantity")? as u32;
            if quantity > available {
                return Err(StoreError::InsufficientStock {
                    title: row.try_get("title")?,
                    requested: quantity,
                    available,
                });
            }
            items.push((
                book_id,
                quantity,
                Money::from_cents(row.try_get("price_cents")?),
            ));
        }

        let order_id = OrderId::new();
        let total_amount: Money = items
            .iter()
            .map(|&(_, quantity, unit_price)| unit_price.times(quantity))
            .sum();
        let now = Utc::now();
        let (user_id, session_key) = owner_to_columns(owner);

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, session_key, email, first_name, last_name, phone,
                                address, city, postal_code, country, total_amount_cents, status,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(user_id)
        .bind(session_key)
        .bind(&shipping.email)
        .bind(&shipping.first_name)
        .bind(&shipping.last_name)
        .bind(&shipping.phone)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.postal_code)
        .bind(&shipping.country)
        .bind(total_amount.cents())
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for &(book_id, quantity, unit_price) in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, book_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(book_id.as_uuid())
            .bind(quantity as i32)
            .bind(unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            owner: owner.clone(),
            shipping,
            total_amount,
            status: OrderStatus::Pending,
            fulfilled_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, book_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order_item).collect()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn status_counts(&self) -> Result<StatusCounts> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM orders GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.try_get("status")?;
            let count = row.try_get::<i64, _>("count")? as u64;
            match status.as_str() {
                "pending" => counts.pending = count,
                "processing" => counts.processing = count,
                "shipped" => counts.shipped = count,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $1, updated_at = now() WHERE id = $2")
            .bind(status.as_str())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fulfill_order(&self, id: OrderId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT fulfilled_at FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let already_fulfilled = match row {
            Some(row) => row
                .try_get::<Option<chrono::DateTime<Utc>>, _>("fulfilled_at")?
                .is_some(),
            None => return Ok(false),
        };
        if already_fulfilled {
            return Ok(false);
        }

        let items = sqlx::query("SELECT book_id, quantity FROM order_items WHERE order_id = $1")
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                UPDATE books
                SET stock_quantity = stock_quantity - $1, updated_at = now()
                WHERE id = $2
                "#,
            )
            .bind(item.try_get::<i32, _>("quantity")?)
            .bind(item.try_get::<Uuid, _>("book_id")?)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE orders SET fulfilled_at = now(), updated_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
