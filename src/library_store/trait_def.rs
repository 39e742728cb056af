//! LibraryStore trait definition and error taxonomy.

use super::columns::SearchColumn;
use super::models::{Author, Book, BookWithAuthor, RecordCreated, RecordKind, RecordSet};
use thiserror::Error;

/// Errors surfaced by library store operations.
///
/// Invalid-argument variants fail before anything is persisted. Date parse
/// failures and cover lookup failures are deliberately NOT here; those are
/// non-fatal and travel as warnings on [`RecordCreated`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unrecognized column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{column}' cannot be used to sort {kind} records")]
    ColumnMismatch {
        column: &'static str,
        kind: &'static str,
    },

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Wrong ISBN value '{0}', expected exactly 13 digits")]
    InvalidIsbn(String),

    #[error("Wrong publication year '{0}', expected exactly 4 digits")]
    InvalidPublicationYear(String),

    #[error("No matching record")]
    NotFound,

    #[error("Query matched more than one record")]
    Ambiguous,

    #[error("Author {0} does not exist")]
    UnknownAuthor(i64),

    #[error("A book with ISBN '{0}' already exists")]
    DuplicateIsbn(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Single point of access to persisted author/book data.
///
/// Implementations own query construction and the business rules around
/// validation and cascading deletes; callers hand in primitives and get back
/// typed rows or a structured outcome.
pub trait LibraryStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// All rows of one kind, unfiltered and in storage order.
    fn fetch(&self, kind: RecordKind) -> Result<RecordSet, StoreError>;

    /// All rows of one kind, ordered by `column`. The column must belong to
    /// the kind's own table.
    fn fetch_sorted(
        &self,
        kind: RecordKind,
        column: SearchColumn,
        ascending: bool,
    ) -> Result<RecordSet, StoreError>;

    /// Every (book, author) pair from the inner join on `author_id`.
    fn fetch_catalog(&self) -> Result<Vec<BookWithAuthor>, StoreError>;

    /// The joined catalog ordered by `column`. Tie order is whatever SQLite
    /// decides.
    fn fetch_catalog_sorted(
        &self,
        column: SearchColumn,
        ascending: bool,
    ) -> Result<Vec<BookWithAuthor>, StoreError>;

    /// Joined pairs whose `column` value contains `query` as a substring
    /// (store default collation). `limit` caps the result; `None` returns
    /// every match.
    fn fetch_filtered(
        &self,
        column: SearchColumn,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<BookWithAuthor>, StoreError>;

    /// The single pair matching `query` on `column`. Zero matches is
    /// [`StoreError::NotFound`], two or more is [`StoreError::Ambiguous`].
    fn fetch_single(
        &self,
        column: SearchColumn,
        query: &str,
    ) -> Result<BookWithAuthor, StoreError>;

    /// One author by primary key.
    fn get_author(&self, id: i64) -> Result<Option<Author>, StoreError>;

    /// Every book referencing `author_id`, by exact key equality.
    fn books_of_author(&self, author_id: i64) -> Result<Vec<Book>, StoreError>;

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an author. Malformed date strings are dropped with a warning on
    /// the outcome; the add itself still succeeds.
    fn add_author(
        &self,
        name: &str,
        birth_date: &str,
        date_of_death: &str,
    ) -> Result<RecordCreated, StoreError>;

    /// Create a book. ISBN and publication year are validated before any
    /// persistence or external call; the cover lookup runs after validation
    /// and degrades to a placeholder on failure.
    fn add_book(
        &self,
        title: &str,
        isbn: &str,
        publication_year: &str,
        author_id: i64,
    ) -> Result<RecordCreated, StoreError>;

    /// Delete one record. Deleting an author also deletes every book that
    /// references it, all within a single transaction. Returns the total
    /// number of rows removed; zero means no such record existed.
    fn delete(&self, kind: RecordKind, id: i64) -> Result<usize, StoreError>;
}
