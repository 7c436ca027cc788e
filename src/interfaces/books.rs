// Input document: the book list YAML
use crate::domain::error::BookmapError;
use crate::domain::model::{Book, BookQuery};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Deserialize)]
struct BookDocument {
    books: Vec<serde_yaml::Value>,
}

/// Load the book list. The document itself must parse and carry a `books`
/// sequence; individual entries are tolerated per-book, so one malformed
/// record costs a warning, not the build. Books without a title are dropped
/// here since nothing downstream can use them.
pub fn load_books(path: &Path) -> Result<Vec<Book>, BookmapError> {
    let content = fs::read_to_string(path)
        .map_err(|e| BookmapError::Input(format!("cannot read {}: {}", path.display(), e)))?;

    let document: BookDocument = serde_yaml::from_str(&content)
        .map_err(|e| BookmapError::Input(format!("{}: {}", path.display(), e)))?;

    let mut books = Vec::with_capacity(document.books.len());
    for (index, value) in document.books.into_iter().enumerate() {
        match serde_yaml::from_value::<Book>(value) {
            Ok(book) if book.title.trim().is_empty() => {
                warn!("Skipping book #{}: no title", index + 1);
            }
            Ok(book) => books.push(book),
            Err(e) => {
                warn!("Skipping book #{}: {}", index + 1, e);
            }
        }
    }

    Ok(books)
}

/// Flatten books into the resolver's work list, applying the record rules:
/// a book without locations is skipped; a location with a complete
/// coordinate pair is an explicit override; a half pair is ignored and the
/// name resolves normally; an entry with neither name nor complete pair is
/// dropped. Output order follows the document.
pub fn collect_queries(books: &[Book]) -> Vec<BookQuery> {
    let mut queries = Vec::new();

    for (book_index, book) in books.iter().enumerate() {
        if book.locations.is_empty() {
            warn!("Skipping {:?}: no locations specified", book.title);
            continue;
        }

        for location in &book.locations {
            let named = !location.name.trim().is_empty();
            let explicit = location.explicit_coordinate().is_some();
            let half_pair = !explicit && (location.lat.is_some() || location.lng.is_some());

            if !named && !explicit {
                warn!(
                    "Dropping a location of {:?}: neither a name nor a full coordinate pair",
                    book.title
                );
                continue;
            }
            if half_pair {
                warn!(
                    "{:?} location {:?} has only one of lat/lng; ignoring the half pair",
                    book.title, location.name
                );
            }

            queries.push(BookQuery {
                book_index,
                book_title: book.title.clone(),
                query: location.clone(),
            });
        }
    }

    queries
}
