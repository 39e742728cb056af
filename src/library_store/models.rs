//! Data models for the library database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An author row. Both life dates are optional and independent of each other;
/// an unknown birth date does not imply an unknown death date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// A book row. `author_id` references exactly one author; the reference is
/// enforced by the schema's foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub publication_year: i32,
    pub cover_url: Option<String>,
    pub author_id: i64,
}

/// One row of the books/authors inner join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

/// Outcome of an add operation: the new row id plus any non-fatal warnings
/// accumulated along the way (date parse failures, cover lookup fallback).
/// The presentation layer decides how to word these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCreated {
    pub id: i64,
    pub warnings: Vec<String>,
}

/// The two record kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Author,
    Book,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Author => "author",
            RecordKind::Book => "book",
        }
    }
}

/// Rows of a single-kind fetch. Serializes as a plain array of either kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RecordSet {
    Authors(Vec<Author>),
    Books(Vec<Book>),
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Authors(rows) => rows.len(),
            RecordSet::Books(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
