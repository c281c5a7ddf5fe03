//! HTTP server for the bookstore.
//!
//! Exposes the catalog, cart, checkout, and order administration over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{CartService, CatalogService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
}

impl<S: Store + Clone> AppState<S> {
    /// Builds the three services over one shared store.
    pub fn new(store: S) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/books", get(routes::catalog::list_books::<S>))
        .route("/books/{id}", get(routes::catalog::get_book::<S>))
        .route("/authors", get(routes::catalog::list_authors::<S>))
        .route("/authors/{id}", get(routes::catalog::get_author::<S>))
        .route("/categories", get(routes::catalog::list_categories::<S>))
        .route("/categories/{id}", get(routes::catalog::get_category::<S>))
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart/add/{book_id}", post(routes::cart::add::<S>))
        .route("/cart/items/{item_id}", post(routes::cart::update_item::<S>))
        .route(
            "/cart/items/{item_id}/remove",
            post(routes::cart::remove_item::<S>),
        )
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route("/payment/{order_id}", get(routes::orders::payment::<S>))
        .route(
            "/orders/{order_id}/success",
            get(routes::orders::success::<S>),
        )
        .route("/admin/orders", get(routes::admin::dashboard::<S>))
        .route(
            "/admin/orders/{order_id}/status",
            post(routes::admin::update_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
