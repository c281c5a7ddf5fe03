//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{AuthorId, BookId, CategoryId};
use domain::{AuthorDetail, BookDetail, CategoryDetail};
use serde::Deserialize;
use store::{Author, Book, BookFilter, Category, Store};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// Query parameters for GET /books. All criteria are optional and
/// combine with AND.
#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub search: Option<String>,
    pub category: Option<Uuid>,
    pub author: Option<Uuid>,
}

impl BookListQuery {
    fn into_filter(self) -> BookFilter {
        BookFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            category: self.category.map(CategoryId::from_uuid),
            author: self.author.map(AuthorId::from_uuid),
        }
    }
}

/// GET /books — list books, optionally filtered by search term,
/// category, or author.
#[tracing::instrument(skip(state))]
pub async fn list_books<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.catalog.list_books(&query.into_filter()).await?;
    Ok(Json(books))
}

/// GET /books/:id — a book with its author and categories.
#[tracing::instrument(skip(state))]
pub async fn get_book<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookDetail>, ApiError> {
    let detail = state.catalog.book_detail(BookId::from_uuid(id)).await?;
    Ok(Json(detail))
}

/// GET /authors — all authors.
#[tracing::instrument(skip(state))]
pub async fn list_authors<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Author>>, ApiError> {
    Ok(Json(state.catalog.list_authors().await?))
}

/// GET /authors/:id — an author with their books.
#[tracing::instrument(skip(state))]
pub async fn get_author<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorDetail>, ApiError> {
    let detail = state.catalog.author_detail(AuthorId::from_uuid(id)).await?;
    Ok(Json(detail))
}

/// GET /categories — all categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.catalog.list_categories().await?))
}

/// GET /categories/:id — a category with its books.
#[tracing::instrument(skip(state))]
pub async fn get_category<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDetail>, ApiError> {
    let detail = state
        .catalog
        .category_detail(CategoryId::from_uuid(id))
        .await?;
    Ok(Json(detail))
}
