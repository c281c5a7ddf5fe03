//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and run serially because
//! each one truncates the tables. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored
//! ```

use std::sync::Arc;

use common::{BookId, Identity, Money, OrderStatus, SessionKey, UserId};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    BookFilter, NewAuthor, NewBook, NewCategory, PostgresStore, ShippingDetails, Store, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_items, carts, \
         book_categories, books, categories, authors",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

async fn seed_book(store: &PostgresStore, title: &str, price_cents: i64, stock: u32) -> BookId {
    let author = store
        .insert_author(NewAuthor {
            name: format!("{title} Author"),
            bio: String::new(),
        })
        .await
        .unwrap();
    let category = store
        .insert_category(NewCategory {
            name: format!("{title} Category"),
            description: String::new(),
        })
        .await
        .unwrap();
    store
        .insert_book(NewBook {
            title: title.to_string(),
            price: Money::from_cents(price_cents),
            author_id: author.id,
            isbn: None,
            publication_date: None,
            stock_quantity: stock,
            categories: vec![category.id],
        })
        .await
        .unwrap()
        .id
}

fn shipping() -> ShippingDetails {
    ShippingDetails {
        email: "reader@example.com".to_string(),
        first_name: "Avid".to_string(),
        last_name: "Reader".to_string(),
        phone: "555-0100".to_string(),
        address: "1 Main St".to_string(),
        city: "Pune".to_string(),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn insert_and_filter_books() {
    let store = get_test_store().await;
    seed_book(&store, "1984", 1599, 50).await;
    seed_book(&store, "Dune", 1799, 20).await;

    let all = store.list_books(&BookFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "1984");

    let search = store
        .list_books(&BookFilter {
            search: Some("dune author".to_string()),
            ..BookFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].title, "Dune");

    let categories = store.categories_of_book(all[0].id).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "1984 Category");
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn cart_per_identity_round_trip() {
    let store = get_test_store().await;
    let book = seed_book(&store, "1984", 1599, 50).await;

    let user = Identity::User(UserId::new());
    let guest = Identity::Session(SessionKey::generate());

    assert!(store.find_cart(&user).await.unwrap().is_none());
    let cart = store.create_cart(&user).await.unwrap();
    assert_eq!(store.find_cart(&user).await.unwrap().unwrap().id, cart.id);
    // A different identity does not see this cart.
    assert!(store.find_cart(&guest).await.unwrap().is_none());

    let item = store.insert_cart_item(cart.id, book, 2).await.unwrap();
    let lines = store.cart_lines(cart.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item.quantity, 2);
    assert_eq!(lines[0].subtotal().cents(), 3198);

    store.set_cart_item_quantity(item.id, 5).await.unwrap();
    let line = store.find_cart_item(item.id).await.unwrap().unwrap();
    assert_eq!(line.item.quantity, 5);

    store.delete_cart_item(item.id).await.unwrap();
    assert!(store.cart_lines(cart.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn order_snapshots_prices_and_sums_totals() {
    let store = get_test_store().await;
    let a = seed_book(&store, "Book A", 1000, 5).await;
    let b = seed_book(&store, "Book B", 500, 1).await;

    let owner = Identity::Session(SessionKey::generate());
    let order = store
        .create_order(&owner, shipping(), &[(a, 2), (b, 1)])
        .await
        .unwrap();
    assert_eq!(order.total_amount.cents(), 2500);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.fulfilled_at.is_none());

    let items = store.order_items(order.id).await.unwrap();
    assert_eq!(items.len(), 2);
    let total: Money = items.iter().map(|i| i.subtotal()).sum();
    assert_eq!(total, order.total_amount);

    // Stock untouched until fulfillment.
    assert_eq!(store.get_book(a).await.unwrap().unwrap().stock_quantity, 5);
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn create_order_rejects_excess_quantity_without_writing() {
    let store = get_test_store().await;
    let a = seed_book(&store, "Book A", 1000, 5).await;
    let b = seed_book(&store, "Book B", 500, 1).await;

    let owner = Identity::User(UserId::new());
    let err = store
        .create_order(&owner, shipping(), &[(a, 2), (b, 3)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            requested: 3,
            available: 1,
            ..
        }
    ));
    assert!(store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn fulfillment_decrements_stock_exactly_once() {
    let store = get_test_store().await;
    let a = seed_book(&store, "Book A", 1000, 5).await;

    let owner = Identity::Session(SessionKey::generate());
    let order = store
        .create_order(&owner, shipping(), &[(a, 2)])
        .await
        .unwrap();

    assert!(store.fulfill_order(order.id).await.unwrap());
    assert_eq!(store.get_book(a).await.unwrap().unwrap().stock_quantity, 3);
    let order = store.get_order(order.id).await.unwrap().unwrap();
    assert!(order.fulfilled_at.is_some());

    // Second visit is a no-op.
    assert!(!store.fulfill_order(order.id).await.unwrap());
    assert_eq!(store.get_book(a).await.unwrap().unwrap().stock_quantity, 3);
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn status_updates_and_counts() {
    let store = get_test_store().await;
    let a = seed_book(&store, "Book A", 1000, 50).await;

    let owner = Identity::User(UserId::new());
    let first = store
        .create_order(&owner, shipping(), &[(a, 1)])
        .await
        .unwrap();
    let owner = Identity::Session(SessionKey::generate());
    let second = store
        .create_order(&owner, shipping(), &[(a, 1)])
        .await
        .unwrap();

    store
        .update_order_status(first.id, OrderStatus::Processing)
        .await
        .unwrap();

    let counts = store.status_counts().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.processing, 1);
    assert_eq!(counts.shipped, 0);

    let orders = store.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    // Newest first.
    assert_eq!(orders[0].id, second.id);
}
