//! Demo catalog seeding for the in-memory development mode.

use chrono::NaiveDate;
use common::Money;
use store::{NewAuthor, NewBook, NewCategory, Store};

/// Populates a store with a small demo catalog: three authors, the
/// standard category set, and three books.
pub async fn seed_demo_catalog<S: Store>(store: &S) -> store::Result<()> {
    let orwell = store
        .insert_author(NewAuthor {
            name: "George Orwell".to_string(),
            bio: "English novelist, essayist, and critic famous for his novels \
                  Animal Farm and Nineteen Eighty-Four."
                .to_string(),
        })
        .await?;
    let austen = store
        .insert_author(NewAuthor {
            name: "Jane Austen".to_string(),
            bio: "English novelist known primarily for her six major novels \
                  including Pride and Prejudice."
                .to_string(),
        })
        .await?;
    let king = store
        .insert_author(NewAuthor {
            name: "Stephen King".to_string(),
            bio: "American author of horror, supernatural fiction, suspense, \
                  and fantasy novels."
                .to_string(),
        })
        .await?;

    let names = [
        "Fiction",
        "Non-Fiction",
        "Science Fiction",
        "Fantasy",
        "Mystery",
        "Romance",
        "Thriller",
        "Biography",
    ];
    let mut categories = Vec::with_capacity(names.len());
    for name in names {
        categories.push(
            store
                .insert_category(NewCategory {
                    name: name.to_string(),
                    description: format!("{name} books"),
                })
                .await?,
        );
    }
    let category = |name: &str| {
        categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .into_iter()
            .collect::<Vec<_>>()
    };

    let mut fiction_scifi = category("Fiction");
    fiction_scifi.extend(category("Science Fiction"));
    store
        .insert_book(NewBook {
            title: "1984".to_string(),
            price: Money::from_cents(1599),
            author_id: orwell.id,
            isbn: Some("9780451524935".to_string()),
            publication_date: NaiveDate::from_ymd_opt(1949, 6, 8),
            stock_quantity: 50,
            categories: fiction_scifi,
        })
        .await?;

    let mut fiction_romance = category("Fiction");
    fiction_romance.extend(category("Romance"));
    store
        .insert_book(NewBook {
            title: "Pride and Prejudice".to_string(),
            price: Money::from_cents(1299),
            author_id: austen.id,
            isbn: Some("9780141439518".to_string()),
            publication_date: NaiveDate::from_ymd_opt(1813, 1, 28),
            stock_quantity: 30,
            categories: fiction_romance,
        })
        .await?;

    let mut fiction_thriller = category("Fiction");
    fiction_thriller.extend(category("Thriller"));
    store
        .insert_book(NewBook {
            title: "The Shining".to_string(),
            price: Money::from_cents(1899),
            author_id: king.id,
            isbn: Some("9780307743657".to_string()),
            publication_date: NaiveDate::from_ymd_opt(1977, 1, 28),
            stock_quantity: 25,
            categories: fiction_thriller,
        })
        .await?;

    tracing::info!("seeded demo catalog");
    Ok(())
}
