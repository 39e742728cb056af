//! The closed set of columns accepted as sort and filter targets.

use super::models::RecordKind;
use super::trait_def::StoreError;
use std::str::FromStr;

/// Columns a caller may sort or filter by. Anything outside this set is an
/// invalid-argument error, never a fallback; user-supplied strings resolve
/// through [`FromStr`] and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchColumn {
    /// Book title.
    Title,
    /// Author name.
    Name,
    /// Author id.
    AuthorId,
    /// Book id.
    BookId,
}

impl SearchColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchColumn::Title => "title",
            SearchColumn::Name => "name",
            SearchColumn::AuthorId => "author_id",
            SearchColumn::BookId => "book_id",
        }
    }

    /// Column reference inside the books/authors join.
    pub(crate) fn joined_sql(&self) -> &'static str {
        match self {
            SearchColumn::Title => "books.title",
            SearchColumn::Name => "authors.name",
            SearchColumn::AuthorId => "authors.id",
            SearchColumn::BookId => "books.id",
        }
    }

    /// Column reference inside a single-table query, if the column belongs
    /// to that table at all.
    pub(crate) fn table_sql(&self, kind: RecordKind) -> Option<&'static str> {
        match (self, kind) {
            (SearchColumn::Title, RecordKind::Book) => Some("title"),
            (SearchColumn::BookId, RecordKind::Book) => Some("id"),
            (SearchColumn::AuthorId, RecordKind::Book) => Some("author_id"),
            (SearchColumn::Name, RecordKind::Author) => Some("name"),
            (SearchColumn::AuthorId, RecordKind::Author) => Some("id"),
            _ => None,
        }
    }
}

impl FromStr for SearchColumn {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SearchColumn::Title),
            "name" => Ok(SearchColumn::Name),
            "author_id" => Ok(SearchColumn::AuthorId),
            "book_id" => Ok(SearchColumn::BookId),
            other => Err(StoreError::UnknownColumn(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_column() {
        for (name, expected) in [
            ("title", SearchColumn::Title),
            ("name", SearchColumn::Name),
            ("author_id", SearchColumn::AuthorId),
            ("book_id", SearchColumn::BookId),
        ] {
            assert_eq!(name.parse::<SearchColumn>().unwrap(), expected);
            assert_eq!(expected.as_str(), name);
        }
    }

    #[test]
    fn rejects_unknown_column_names() {
        for name in ["", "isbn", "cover_url", "TITLE", "books.title", "id; DROP TABLE books"] {
            assert!(matches!(
                name.parse::<SearchColumn>(),
                Err(StoreError::UnknownColumn(_))
            ));
        }
    }

    #[test]
    fn table_mapping_rejects_foreign_columns() {
        assert!(SearchColumn::Title.table_sql(RecordKind::Author).is_none());
        assert!(SearchColumn::Name.table_sql(RecordKind::Book).is_none());
        assert_eq!(
            SearchColumn::AuthorId.table_sql(RecordKind::Author),
            Some("id")
        );
        assert_eq!(
            SearchColumn::AuthorId.table_sql(RecordKind::Book),
            Some("author_id")
        );
    }
}
