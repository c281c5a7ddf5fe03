//! Catalog browsing: listing, filtering, and detail lookups.
//!
//! Thin pass-throughs over the store; the interesting behavior (cart
//! and checkout) lives in the other services.

use common::{AuthorId, BookId, CategoryId};
use serde::Serialize;
use store::{Author, Book, BookFilter, Category, Store};

use crate::error::DomainError;

/// A book joined with its author and categories.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub author: Author,
    pub categories: Vec<Category>,
}

/// An author with their books.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

/// A category with its books.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub books: Vec<Book>,
}

/// Read-only catalog queries.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service on top of the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists books matching the filter, ordered by title.
    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, DomainError> {
        Ok(self.store.list_books(filter).await?)
    }

    /// Loads a book with its author and categories.
    #[tracing::instrument(skip(self))]
    pub async fn book_detail(&self, id: BookId) -> Result<BookDetail, DomainError> {
        let book = self
            .store
            .get_book(id)
            .await?
            .ok_or(DomainError::BookNotFound(id))?;
        let author = self
            .store
            .get_author(book.author_id)
            .await?
            .ok_or(DomainError::AuthorNotFound(book.author_id))?;
        let categories = self.store.categories_of_book(id).await?;
        Ok(BookDetail {
            book,
            author,
            categories,
        })
    }

    /// Lists all authors, ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn list_authors(&self) -> Result<Vec<Author>, DomainError> {
        Ok(self.store.list_authors().await?)
    }

    /// Loads an author with their books.
    #[tracing::instrument(skip(self))]
    pub async fn author_detail(&self, id: AuthorId) -> Result<AuthorDetail, DomainError> {
        let author = self
            .store
            .get_author(id)
            .await?
            .ok_or(DomainError::AuthorNotFound(id))?;
        let books = self
            .store
            .list_books(&BookFilter {
                author: Some(id),
                ..BookFilter::default()
            })
            .await?;
        Ok(AuthorDetail { author, books })
    }

    /// Lists all categories, ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.store.list_categories().await?)
    }

    /// Loads a category with its books.
    #[tracing::instrument(skip(self))]
    pub async fn category_detail(&self, id: CategoryId) -> Result<CategoryDetail, DomainError> {
        let category = self
            .store
            .get_category(id)
            .await?
            .ok_or(DomainError::CategoryNotFound(id))?;
        let books = self
            .store
            .list_books(&BookFilter {
                category: Some(id),
                ..BookFilter::default()
            })
            .await?;
        Ok(CategoryDetail { category, books })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use store::{InMemoryStore, NewAuthor, NewBook, NewCategory};

    async fn seeded() -> (CatalogService<InMemoryStore>, AuthorId, CategoryId) {
        let store = InMemoryStore::new();
        let orwell = store
            .insert_author(NewAuthor {
                name: "George Orwell".to_string(),
                bio: "English novelist and essayist.".to_string(),
            })
            .await
            .unwrap();
        let austen = store
            .insert_author(NewAuthor {
                name: "Jane Austen".to_string(),
                bio: "English novelist.".to_string(),
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
        let romance = store
            .insert_category(NewCategory {
                name: "Romance".to_string(),
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
                title: "Pride and Prejudice".to_string(),
                price: Money::from_cents(1299),
                author_id: austen.id,
                isbn: Some("9780141439518".to_string()),
                publication_date: None,
                stock_quantity: 30,
                categories: vec![fiction.id, romance.id],
            })
            .await
            .unwrap();
        (CatalogService::new(store), orwell.id, romance.id)
    }

    #[tokio::test]
    async fn unfiltered_list_is_ordered_by_title() {
        let (catalog, _, _) = seeded().await;
        let books = catalog.list_books(&BookFilter::default()).await.unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["1984", "Pride and Prejudice"]);
    }

    #[tokio::test]
    async fn filters_combine_with_and() {
        let (catalog, orwell, romance) = seeded().await;

        let by_author = catalog
            .list_books(&BookFilter {
                author: Some(orwell),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].title, "1984");

        let none = catalog
            .list_books(&BookFilter {
                author: Some(orwell),
                category: Some(romance),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_and_author() {
        let (catalog, _, _) = seeded().await;

        let by_title = catalog
            .list_books(&BookFilter {
                search: Some("pride".to_string()),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_title.len(), 1);

        let by_author = catalog
            .list_books(&BookFilter {
                search: Some("ORWELL".to_string()),
                ..BookFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].title, "1984");
    }

    #[tokio::test]
    async fn detail_lookups_join_related_rows() {
        let (catalog, orwell, romance) = seeded().await;

        let author = catalog.author_detail(orwell).await.unwrap();
        assert_eq!(author.books.len(), 1);

        let category = catalog.category_detail(romance).await.unwrap();
        assert_eq!(category.books.len(), 1);
        assert_eq!(category.books[0].title, "Pride and Prejudice");

        let book = catalog.book_detail(category.books[0].id).await.unwrap();
        assert_eq!(book.author.name, "Jane Austen");
        assert_eq!(book.categories.len(), 2);
    }

    #[tokio::test]
    async fn missing_rows_surface_not_found() {
        let (catalog, _, _) = seeded().await;
        assert!(matches!(
            catalog.book_detail(BookId::new()).await.unwrap_err(),
            DomainError::BookNotFound(_)
        ));
        assert!(matches!(
            catalog.author_detail(AuthorId::new()).await.unwrap_err(),
            DomainError::AuthorNotFound(_)
        ));
        assert!(matches!(
            catalog.category_detail(CategoryId::new()).await.unwrap_err(),
            DomainError::CategoryNotFound(_)
        ));
    }
}
