//! End-to-end workflow tests over the in-memory store: browse → cart →
//! checkout → payment → success → admin status progression.

use common::{Identity, Money, OrderStatus, SessionKey, UserId};
use domain::{AddOutcome, CartService, CatalogService, OrderService};
use store::{BookFilter, InMemoryStore, NewAuthor, NewBook, NewCategory, ShippingDetails, Store};

struct Fixture {
    store: InMemoryStore,
    catalog: CatalogService<InMemoryStore>,
    carts: CartService<InMemoryStore>,
    orders: OrderService<InMemoryStore>,
}

impl Fixture {
    async fn new() -> Self {
        let store = InMemoryStore::new();

        let orwell = store
            .insert_author(NewAuthor {
                name: "George Orwell".to_string(),
                bio: "English novelist and essayist.".to_string(),
            })
            .await
            .unwrap();
        let king = store
            .insert_author(NewAuthor {
                name: "Stephen King".to_string(),
                bio: "American author of horror fiction.".to_string(),
            })
            .await
            .unwrap();
        let fiction = store
            .insert_category(NewCategory {
                name: "Fiction".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        store
            .insert_book(NewBook {
                title: "1984".to_string(),
                price: Money::from_cents(1599),
                author_id: orwell.id,
                isbn: Some("9780451524935".to_string()),
                publication_date: None,
                stock_quantity: 50,
                categories: vec![fiction.id],
            })
            .await
            .unwrap();
        store
            .insert_book(NewBook {
                title: "The Shining".to_string(),
                price: Money::from_cents(1899),
                author_id: king.id,
                isbn: Some("9780307743657".to_string()),
                publication_date: None,
                stock_quantity: 25,
                categories: vec![fiction.id],
            })
            .await
            .unwrap();

        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }
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
async fn full_purchase_lifecycle() {
    let fx = Fixture::new().await;
    let shopper = Identity::Session(SessionKey::generate());

    // Browse and pick the two books.
    let books = fx.catalog.list_books(&BookFilter::default()).await.unwrap();
    assert_eq!(books.len(), 2);
    let nineteen_eighty_four = books.iter().find(|b| b.title == "1984").unwrap().clone();
    let the_shining = books
        .iter()
        .find(|b| b.title == "The Shining")
        .unwrap()
        .clone();

    // 2 x 1984 + 1 x The Shining.
    fx.carts
        .add_book(&shopper, nineteen_eighty_four.id)
        .await
        .unwrap();
    fx.carts
        .add_book(&shopper, nineteen_eighty_four.id)
        .await
        .unwrap();
    fx.carts.add_book(&shopper, the_shining.id).await.unwrap();

    let view = fx.carts.view(&shopper).await.unwrap();
    assert_eq!(view.total_items, 3);
    assert_eq!(view.total_price.cents(), 2 * 1599 + 1899);

    // Checkout: order materialized, cart and stock untouched.
    let order = fx.orders.place_order(&shopper, shipping()).await.unwrap();
    assert_eq!(order.total_amount.cents(), 2 * 1599 + 1899);
    assert_eq!(fx.carts.view(&shopper).await.unwrap().total_items, 3);

    // Payment page shows the snapshotted summary.
    let summary = fx.orders.summary(order.id).await.unwrap();
    let item_total: Money = summary.items.iter().map(|i| i.subtotal()).sum();
    assert_eq!(item_total, order.total_amount);

    // Success page: stock drops by the ordered quantities, cart empties.
    fx.orders.finalize(&shopper, order.id).await.unwrap();
    let after = fx
        .store
        .get_book(nineteen_eighty_four.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 48);
    let after = fx.store.get_book(the_shining.id).await.unwrap().unwrap();
    assert_eq!(after.stock_quantity, 24);
    assert!(fx.carts.view(&shopper).await.unwrap().lines.is_empty());

    // Admin walks the order to delivered.
    for status in ["processing", "shipped", "delivered"] {
        fx.orders.update_status(order.id, status).await.unwrap();
    }
    let summary = fx.orders.summary(order.id).await.unwrap();
    assert_eq!(summary.order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn orders_outlive_cleared_carts() {
    let fx = Fixture::new().await;
    let shopper = Identity::User(UserId::new());

    let books = fx.catalog.list_books(&BookFilter::default()).await.unwrap();
    fx.carts.add_book(&shopper, books[0].id).await.unwrap();

    let order = fx.orders.place_order(&shopper, shipping()).await.unwrap();
    fx.orders.finalize(&shopper, order.id).await.unwrap();

    // The cart is ephemeral, the order is not.
    assert!(fx.carts.view(&shopper).await.unwrap().lines.is_empty());
    let dashboard = fx.orders.dashboard().await.unwrap();
    assert_eq!(dashboard.orders.len(), 1);
    assert_eq!(dashboard.orders[0].id, order.id);
    assert_eq!(dashboard.orders[0].owner, shopper);
}

#[tokio::test]
async fn stock_limited_shopper_keeps_single_copy() {
    let fx = Fixture::new().await;
    let shopper = Identity::Session(SessionKey::generate());

    // Drain The Shining down to one copy.
    let books = fx.catalog.list_books(&BookFilter::default()).await.unwrap();
    let the_shining = books.iter().find(|b| b.title == "The Shining").unwrap();
    let bulk_buyer = Identity::Session(SessionKey::generate());
    fx.carts.add_book(&bulk_buyer, the_shining.id).await.unwrap();
    let item = fx.carts.view(&bulk_buyer).await.unwrap().lines[0].item.id;
    fx.carts.set_quantity(item, 24).await.unwrap();
    let order = fx.orders.place_order(&bulk_buyer, shipping()).await.unwrap();
    fx.orders.finalize(&bulk_buyer, order.id).await.unwrap();

    // First add takes the last copy; the second is turned away.
    assert!(matches!(
        fx.carts.add_book(&shopper, the_shining.id).await.unwrap(),
        AddOutcome::Added { .. }
    ));
    assert!(matches!(
        fx.carts.add_book(&shopper, the_shining.id).await.unwrap(),
        AddOutcome::StockLimited { available: 1, .. }
    ));
    assert_eq!(fx.carts.view(&shopper).await.unwrap().total_items, 1);
}
