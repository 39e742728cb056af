//! SQLite-backed library store implementation.

use super::columns::SearchColumn;
use super::models::{Author, Book, BookWithAuthor, RecordCreated, RecordKind, RecordSet};
use super::schema::{BASE_DB_VERSION, VERSIONED_SCHEMAS};
use super::trait_def::{LibraryStore, StoreError};
use super::validate::{date_from_sql, date_to_sql, is_digits_of_len, parse_optional_date};
use crate::covers::CoverLookup;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const AUTHOR_COLUMNS: &str = "id, name, birth_date, date_of_death";
const BOOK_COLUMNS: &str = "id, isbn, title, publication_year, cover_url, author_id";
const JOINED_COLUMNS: &str = "books.id, books.isbn, books.title, books.publication_year, \
     books.cover_url, books.author_id, \
     authors.id, authors.name, authors.birth_date, authors.date_of_death";
const JOINED_FROM: &str = "FROM books INNER JOIN authors ON books.author_id = authors.id";

pub struct SqliteLibraryStore {
    conn: Mutex<Connection>,
    covers: Arc<dyn CoverLookup>,
}

impl std::fmt::Debug for SqliteLibraryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLibraryStore")
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(db_path: P, covers: Arc<dyn CoverLookup>) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            Self::create_schema(&conn)?;
            conn
        };

        // The schema's foreign key only bites with the pragma on; it is
        // per-connection state, not part of the database file.
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let version: i32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .context("Failed to read database version")?;

        match version - BASE_DB_VERSION {
            0 => Self::validate_schema_0(&conn)?,
            _ => bail!("Unknown database version {}", version),
        }

        let (authors, books) = Self::count_rows(&conn)?;
        info!("Library store ready: {} authors, {} books", authors, books);

        Ok(SqliteLibraryStore {
            conn: Mutex::new(conn),
            covers,
        })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let latest = &VERSIONED_SCHEMAS[VERSIONED_SCHEMAS.len() - 1];
        for table in latest.tables {
            conn.execute(table.schema, [])?;
            for index in table.indices {
                conn.execute(index, [])?;
            }
        }
        conn.execute(
            &format!(
                "PRAGMA user_version = {}",
                BASE_DB_VERSION + latest.version as i32
            ),
            [],
        )?;

        Ok(())
    }

    fn validate_schema_0(conn: &Connection) -> Result<()> {
        for table in VERSIONED_SCHEMAS[0].tables {
            let expected: &[&str] = match table.name {
                "authors" => &["id", "name", "birth_date", "date_of_death"],
                "books" => &["id", "isbn", "title", "publication_year", "cover_url", "author_id"],
                other => bail!("Unexpected table '{}' in schema", other),
            };
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let columns: Vec<String> = stmt
                .query_map([], |row| row.get(1))?
                .collect::<Result<_, _>>()?;
            if columns != expected {
                bail!(
                    "Schema validation failed for {} table, found {:?}",
                    table.name,
                    columns
                );
            }
        }

        Ok(())
    }

    fn count_rows(conn: &Connection) -> Result<(usize, usize)> {
        let authors: usize = conn.query_row("SELECT COUNT(*) FROM authors", [], |r| r.get(0))?;
        let books: usize = conn.query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))?;
        Ok((authors, books))
    }

    fn query_pairs(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<BookWithAuthor>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, pair_from_row)?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }
}

fn author_from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        birth_date: date_from_sql(row.get(offset + 2)?),
        date_of_death: date_from_sql(row.get(offset + 3)?),
    })
}

fn book_from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(offset)?,
        isbn: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        publication_year: row.get(offset + 3)?,
        cover_url: row.get(offset + 4)?,
        author_id: row.get(offset + 5)?,
    })
}

fn pair_from_row(row: &rusqlite::Row) -> rusqlite::Result<BookWithAuthor> {
    Ok(BookWithAuthor {
        book: book_from_row(row, 0)?,
        author: author_from_row(row, 6)?,
    })
}

// Map SQLite constraint failures on book insertion to typed errors. The
// foreign key covers author_id, the unique index covers isbn.
fn map_book_insert_error(err: rusqlite::Error, isbn: &str, author_id: i64) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        match e.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StoreError::UnknownAuthor(author_id)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return StoreError::DuplicateIsbn(isbn.to_string())
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

impl LibraryStore for SqliteLibraryStore {
    fn fetch(&self, kind: RecordKind) -> Result<RecordSet, StoreError> {
        let conn = self.conn.lock().unwrap();
        match kind {
            RecordKind::Author => {
                let mut stmt =
                    conn.prepare_cached(&format!("SELECT {} FROM authors", AUTHOR_COLUMNS))?;
                let rows = stmt
                    .query_map([], |row| author_from_row(row, 0))?
                    .collect::<Result<_, _>>()?;
                Ok(RecordSet::Authors(rows))
            }
            RecordKind::Book => {
                let mut stmt =
                    conn.prepare_cached(&format!("SELECT {} FROM books", BOOK_COLUMNS))?;
                let rows = stmt
                    .query_map([], |row| book_from_row(row, 0))?
                    .collect::<Result<_, _>>()?;
                Ok(RecordSet::Books(rows))
            }
        }
    }

    fn fetch_sorted(
        &self,
        kind: RecordKind,
        column: SearchColumn,
        ascending: bool,
    ) -> Result<RecordSet, StoreError> {
        let order_column = column.table_sql(kind).ok_or(StoreError::ColumnMismatch {
            column: column.as_str(),
            kind: kind.as_str(),
        })?;
        let direction = if ascending { "ASC" } else { "DESC" };

        let conn = self.conn.lock().unwrap();
        match kind {
            RecordKind::Author => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {} FROM authors ORDER BY {} {}",
                    AUTHOR_COLUMNS, order_column, direction
                ))?;
                let rows = stmt
                    .query_map([], |row| author_from_row(row, 0))?
                    .collect::<Result<_, _>>()?;
                Ok(RecordSet::Authors(rows))
            }
            RecordKind::Book => {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {} FROM books ORDER BY {} {}",
                    BOOK_COLUMNS, order_column, direction
                ))?;
                let rows = stmt
                    .query_map([], |row| book_from_row(row, 0))?
                    .collect::<Result<_, _>>()?;
                Ok(RecordSet::Books(rows))
            }
        }
    }

    fn fetch_catalog(&self) -> Result<Vec<BookWithAuthor>, StoreError> {
        self.query_pairs(&format!("SELECT {} {}", JOINED_COLUMNS, JOINED_FROM), &[])
    }

    fn fetch_catalog_sorted(
        &self,
        column: SearchColumn,
        ascending: bool,
    ) -> Result<Vec<BookWithAuthor>, StoreError> {
        let direction = if ascending { "ASC" } else { "DESC" };
        self.query_pairs(
            &format!(
                "SELECT {} {} ORDER BY {} {}",
                JOINED_COLUMNS,
                JOINED_FROM,
                column.joined_sql(),
                direction
            ),
            &[],
        )
    }

    fn fetch_filtered(
        &self,
        column: SearchColumn,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<BookWithAuthor>, StoreError> {
        let mut sql = format!(
            "SELECT {} {} WHERE {} LIKE ?1",
            JOINED_COLUMNS,
            JOINED_FROM,
            column.joined_sql()
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let pattern = format!("%{}%", query);
        self.query_pairs(&sql, &[&pattern])
    }

    fn fetch_single(
        &self,
        column: SearchColumn,
        query: &str,
    ) -> Result<BookWithAuthor, StoreError> {
        // Fetch up to two rows so a second match is detectable.
        let mut rows = self.fetch_filtered(column, query, Some(2))?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(StoreError::NotFound),
            _ => Err(StoreError::Ambiguous),
        }
    }

    fn get_author(&self, id: i64) -> Result<Option<Author>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM authors WHERE id = ?1",
            AUTHOR_COLUMNS
        ))?;
        let author = stmt
            .query_row(params![id], |row| author_from_row(row, 0))
            .optional()?;
        Ok(author)
    }

    fn books_of_author(&self, author_id: i64) -> Result<Vec<Book>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM books WHERE author_id = ?1",
            BOOK_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![author_id], |row| book_from_row(row, 0))?
            .collect::<Result<_, _>>()?;
        Ok(rows)
    }

    fn add_author(
        &self,
        name: &str,
        birth_date: &str,
        date_of_death: &str,
    ) -> Result<RecordCreated, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyField("name"));
        }

        let mut warnings = Vec::new();
        let birth = parse_optional_date("birth_date", birth_date, &mut warnings);
        let death = parse_optional_date("date_of_death", date_of_death, &mut warnings);

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO authors (name, birth_date, date_of_death) VALUES (?1, ?2, ?3)",
            params![name, date_to_sql(&birth), date_to_sql(&death)],
        )?;

        Ok(RecordCreated {
            id: conn.last_insert_rowid(),
            warnings,
        })
    }

    fn add_book(
        &self,
        title: &str,
        isbn: &str,
        publication_year: &str,
        author_id: i64,
    ) -> Result<RecordCreated, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::EmptyField("title"));
        }
        if !is_digits_of_len(isbn, 13) {
            return Err(StoreError::InvalidIsbn(isbn.to_string()));
        }
        if !is_digits_of_len(publication_year, 4) {
            return Err(StoreError::InvalidPublicationYear(publication_year.to_string()));
        }
        let year: i32 = publication_year
            .parse()
            .map_err(|_| StoreError::InvalidPublicationYear(publication_year.to_string()))?;

        // Validation is done; the external lookup runs before taking the
        // connection lock so a slow service never holds up other callers.
        let mut warnings = Vec::new();
        let cover = self.covers.cover_url(isbn);
        if let Some(warning) = cover.warning {
            warnings.push(warning);
        }

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO books (isbn, title, publication_year, cover_url, author_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![isbn, title, year, cover.url, author_id],
        )
        .map_err(|err| map_book_insert_error(err, isbn, author_id))?;

        Ok(RecordCreated {
            id: conn.last_insert_rowid(),
            warnings,
        })
    }

    fn delete(&self, kind: RecordKind, id: i64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        match kind {
            RecordKind::Book => {
                Ok(conn.execute("DELETE FROM books WHERE id = ?1", params![id])?)
            }
            RecordKind::Author => {
                // The whole cascade commits or rolls back as one transaction;
                // a failure mid-loop leaves the author and their books intact.
                let tx = conn.unchecked_transaction()?;
                let book_ids: Vec<i64> = {
                    let mut stmt =
                        tx.prepare_cached("SELECT id FROM books WHERE author_id = ?1")?;
                    let ids = stmt
                        .query_map(params![id], |row| row.get(0))?
                        .collect::<Result<_, _>>()?;
                    ids
                };
                let mut removed = 0;
                for book_id in book_ids {
                    removed += tx.execute("DELETE FROM books WHERE id = ?1", params![book_id])?;
                }
                removed += tx.execute("DELETE FROM authors WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(removed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covers::{CoverOutcome, DEFAULT_COVER_PATH};
    use tempfile::TempDir;

    struct StaticCovers;

    impl CoverLookup for StaticCovers {
        fn cover_url(&self, isbn: &str) -> CoverOutcome {
            CoverOutcome {
                url: format!("https://covers.test/{}.jpg", isbn),
                warning: None,
            }
        }
    }

    struct FailingCovers;

    impl CoverLookup for FailingCovers {
        fn cover_url(&self, _isbn: &str) -> CoverOutcome {
            CoverOutcome {
                url: DEFAULT_COVER_PATH.to_string(),
                warning: Some("Cover lookup failed (Request timeout), using placeholder image".to_string()),
            }
        }
    }

    struct PanickingCovers;

    impl CoverLookup for PanickingCovers {
        fn cover_url(&self, _isbn: &str) -> CoverOutcome {
            panic!("cover lookup must not run for invalid input");
        }
    }

    fn create_tmp_store_with(covers: Arc<dyn CoverLookup>) -> (SqliteLibraryStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        let store = SqliteLibraryStore::new(&db_path, covers).unwrap();
        (store, temp_dir)
    }

    fn create_tmp_store() -> (SqliteLibraryStore, TempDir) {
        create_tmp_store_with(Arc::new(StaticCovers))
    }

    fn add_author(store: &SqliteLibraryStore, name: &str) -> i64 {
        store.add_author(name, "", "").unwrap().id
    }

    fn add_book(store: &SqliteLibraryStore, title: &str, isbn: &str, author_id: i64) -> i64 {
        store.add_book(title, isbn, "2001", author_id).unwrap().id
    }

    #[test]
    fn adds_and_fetches_author_with_dates() {
        let (store, _tmp) = create_tmp_store();

        let created = store
            .add_author("Frank Herbert", "1920-10-08", "1986-02-11")
            .unwrap();
        assert!(created.warnings.is_empty());

        let rows = match store.fetch(RecordKind::Author).unwrap() {
            RecordSet::Authors(rows) => rows,
            _ => unreachable!(),
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, created.id);
        assert_eq!(rows[0].name, "Frank Herbert");
        assert_eq!(
            rows[0].birth_date,
            chrono::NaiveDate::from_ymd_opt(1920, 10, 8)
        );
        assert_eq!(
            rows[0].date_of_death,
            chrono::NaiveDate::from_ymd_opt(1986, 2, 11)
        );
    }

    #[test]
    fn malformed_date_is_dropped_but_author_is_added() {
        let (store, _tmp) = create_tmp_store();

        let created = store
            .add_author("Jane Doe", "08/10/1920", "")
            .unwrap();
        assert_eq!(created.warnings.len(), 1);
        assert!(created.warnings[0].contains("08/10/1920"));

        let author = store.get_author(created.id).unwrap().unwrap();
        assert_eq!(author.name, "Jane Doe");
        assert!(author.birth_date.is_none());
        assert!(author.date_of_death.is_none());
    }

    #[test]
    fn rejects_empty_author_name() {
        let (store, _tmp) = create_tmp_store();

        assert!(matches!(
            store.add_author("", "", ""),
            Err(StoreError::EmptyField("name"))
        ));
        assert!(matches!(
            store.add_author("   ", "", ""),
            Err(StoreError::EmptyField("name"))
        ));
        assert!(store.fetch(RecordKind::Author).unwrap().is_empty());
    }

    #[test]
    fn adds_book_with_cover_and_fetches_it() {
        let (store, _tmp) = create_tmp_store();
        let author_id = add_author(&store, "Frank Herbert");

        let created = store
            .add_book("Dune", "1234567890123", "1965", author_id)
            .unwrap();
        assert!(created.warnings.is_empty());

        let books = match store.fetch(RecordKind::Book).unwrap() {
            RecordSet::Books(rows) => rows,
            _ => unreachable!(),
        };
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn, "1234567890123");
        assert_eq!(books[0].publication_year, 1965);
        assert_eq!(
            books[0].cover_url.as_deref(),
            Some("https://covers.test/1234567890123.jpg")
        );

        let pair = store
            .fetch_single(SearchColumn::BookId, &created.id.to_string())
            .unwrap();
        assert_eq!(pair.book.title, "Dune");
        assert_eq!(pair.author.name, "Frank Herbert");
    }

    #[test]
    fn rejects_bad_isbn_before_any_side_effect() {
        // A panicking cover lookup proves validation happens before the
        // external call.
        let (store, _tmp) = create_tmp_store_with(Arc::new(PanickingCovers));
        let author_id = {
            let created = store.add_author("A. Writer", "", "").unwrap();
            created.id
        };

        for isbn in ["123456789012", "12345678901234", "123456789012X", "", "12-4567890123"] {
            assert!(matches!(
                store.add_book("Foo", isbn, "2001", author_id),
                Err(StoreError::InvalidIsbn(_))
            ));
        }
        assert!(store.fetch(RecordKind::Book).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_publication_year() {
        let (store, _tmp) = create_tmp_store_with(Arc::new(PanickingCovers));
        let author_id = store.add_author("A. Writer", "", "").unwrap().id;

        for year in ["200", "20011", "20x1", ""] {
            assert!(matches!(
                store.add_book("Foo", "1234567890123", year, author_id),
                Err(StoreError::InvalidPublicationYear(_))
            ));
        }
        assert!(store.fetch(RecordKind::Book).unwrap().is_empty());
    }

    #[test]
    fn rejects_book_for_unknown_author() {
        let (store, _tmp) = create_tmp_store();

        assert!(matches!(
            store.add_book("Ghost", "1234567890123", "2001", 42),
            Err(StoreError::UnknownAuthor(42))
        ));
        assert!(store.fetch(RecordKind::Book).unwrap().is_empty());
    }

    #[test]
    fn rejects_duplicate_isbn() {
        let (store, _tmp) = create_tmp_store();
        let author_id = add_author(&store, "A. Writer");
        add_book(&store, "First", "1234567890123", author_id);

        assert!(matches!(
            store.add_book("Second", "1234567890123", "2002", author_id),
            Err(StoreError::DuplicateIsbn(_))
        ));
        assert_eq!(store.fetch(RecordKind::Book).unwrap().len(), 1);
    }

    #[test]
    fn cover_failure_degrades_to_placeholder_but_book_is_added() {
        let (store, _tmp) = create_tmp_store_with(Arc::new(FailingCovers));
        let author_id = add_author(&store, "A. Writer");

        let created = store
            .add_book("Foo", "1234567890123", "2001", author_id)
            .unwrap();
        assert_eq!(created.warnings.len(), 1);
        assert!(created.warnings[0].contains("placeholder"));

        let pair = store
            .fetch_single(SearchColumn::BookId, &created.id.to_string())
            .unwrap();
        assert_eq!(pair.book.cover_url.as_deref(), Some(DEFAULT_COVER_PATH));
    }

    #[test]
    fn sorts_catalog_by_title_both_directions() {
        let (store, _tmp) = create_tmp_store();
        let herbert = add_author(&store, "Frank Herbert");
        let lem = add_author(&store, "Stanislaw Lem");
        add_book(&store, "Solaris", "1111111111111", lem);
        add_book(&store, "Dune", "2222222222222", herbert);

        let ascending = store
            .fetch_catalog_sorted(SearchColumn::Title, true)
            .unwrap();
        let titles: Vec<&str> = ascending.iter().map(|p| p.book.title.as_str()).collect();
        assert_eq!(titles, ["Dune", "Solaris"]);

        let descending = store
            .fetch_catalog_sorted(SearchColumn::Title, false)
            .unwrap();
        let titles: Vec<&str> = descending.iter().map(|p| p.book.title.as_str()).collect();
        assert_eq!(titles, ["Solaris", "Dune"]);
    }

    #[test]
    fn sorts_catalog_by_author_name() {
        let (store, _tmp) = create_tmp_store();
        let lem = add_author(&store, "Stanislaw Lem");
        let herbert = add_author(&store, "Frank Herbert");
        add_book(&store, "Solaris", "1111111111111", lem);
        add_book(&store, "Dune", "2222222222222", herbert);

        let rows = store.fetch_catalog_sorted(SearchColumn::Name, true).unwrap();
        let names: Vec<&str> = rows.iter().map(|p| p.author.name.as_str()).collect();
        assert_eq!(names, ["Frank Herbert", "Stanislaw Lem"]);
    }

    #[test]
    fn sorts_single_kind_and_rejects_foreign_column() {
        let (store, _tmp) = create_tmp_store();
        add_author(&store, "Stanislaw Lem");
        add_author(&store, "Frank Herbert");

        let sorted = store
            .fetch_sorted(RecordKind::Author, SearchColumn::Name, true)
            .unwrap();
        let names: Vec<String> = match sorted {
            RecordSet::Authors(rows) => rows.into_iter().map(|a| a.name).collect(),
            _ => unreachable!(),
        };
        assert_eq!(names, ["Frank Herbert", "Stanislaw Lem"]);

        assert!(matches!(
            store.fetch_sorted(RecordKind::Author, SearchColumn::Title, true),
            Err(StoreError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn filters_by_substring_and_honors_limit() {
        let (store, _tmp) = create_tmp_store();
        let herbert = add_author(&store, "Frank Herbert");
        add_book(&store, "Dune", "1111111111111", herbert);
        add_book(&store, "Dune Messiah", "2222222222222", herbert);
        add_book(&store, "Solaris", "3333333333333", herbert);

        let matches = store
            .fetch_filtered(SearchColumn::Title, "Dune", None)
            .unwrap();
        assert_eq!(matches.len(), 2);

        let limited = store
            .fetch_filtered(SearchColumn::Title, "Dune", Some(1))
            .unwrap();
        assert_eq!(limited.len(), 1);

        let none = store
            .fetch_filtered(SearchColumn::Title, "Foundation", None)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn single_fetch_enforces_cardinality() {
        let (store, _tmp) = create_tmp_store();
        let herbert = add_author(&store, "Frank Herbert");
        add_book(&store, "Dune", "1111111111111", herbert);
        add_book(&store, "Dune Messiah", "2222222222222", herbert);

        assert!(matches!(
            store.fetch_single(SearchColumn::Title, "Solaris"),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.fetch_single(SearchColumn::Title, "Dune"),
            Err(StoreError::Ambiguous)
        ));

        let pair = store
            .fetch_single(SearchColumn::Title, "Messiah")
            .unwrap();
        assert_eq!(pair.book.title, "Dune Messiah");
    }

    #[test]
    fn deletes_a_single_book() {
        let (store, _tmp) = create_tmp_store();
        let author_id = add_author(&store, "A. Writer");
        let book_id = add_book(&store, "Foo", "1234567890123", author_id);

        assert_eq!(store.delete(RecordKind::Book, book_id).unwrap(), 1);
        assert!(store.fetch(RecordKind::Book).unwrap().is_empty());
        // The author stays.
        assert_eq!(store.fetch(RecordKind::Author).unwrap().len(), 1);
    }

    #[test]
    fn deleting_author_cascades_to_all_their_books() {
        let (store, _tmp) = create_tmp_store();
        let herbert = add_author(&store, "Frank Herbert");
        let lem = add_author(&store, "Stanislaw Lem");
        add_book(&store, "Dune", "1111111111111", herbert);
        add_book(&store, "Dune Messiah", "2222222222222", herbert);
        add_book(&store, "Children of Dune", "3333333333333", herbert);
        add_book(&store, "Solaris", "4444444444444", lem);

        let removed = store.delete(RecordKind::Author, herbert).unwrap();
        assert_eq!(removed, 4); // 3 books + the author row

        assert!(store.get_author(herbert).unwrap().is_none());
        assert!(store.books_of_author(herbert).unwrap().is_empty());

        // No surviving book references a missing author.
        let books = match store.fetch(RecordKind::Book).unwrap() {
            RecordSet::Books(rows) => rows,
            _ => unreachable!(),
        };
        assert_eq!(books.len(), 1);
        assert!(books.iter().all(|b| b.author_id == lem));
    }

    #[test]
    fn deleting_missing_records_removes_nothing() {
        let (store, _tmp) = create_tmp_store();

        assert_eq!(store.delete(RecordKind::Book, 42).unwrap(), 0);
        assert_eq!(store.delete(RecordKind::Author, 42).unwrap(), 0);
    }

    #[test]
    fn books_of_author_matches_exact_key_only() {
        // Author id 1 must not pull in books of author 11; the lookup is
        // equality, not substring.
        let (store, _tmp) = create_tmp_store();
        let first = add_author(&store, "First");
        let mut last = first;
        while last < 11 {
            last = add_author(&store, &format!("Author {}", last + 1));
        }
        add_book(&store, "Of First", "1111111111111", first);
        add_book(&store, "Of Eleventh", "2222222222222", last);

        let books = store.books_of_author(first).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Of First");
    }

    #[test]
    fn reopens_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");

        let author_id = {
            let store = SqliteLibraryStore::new(&db_path, Arc::new(StaticCovers)).unwrap();
            let id = add_author(&store, "Frank Herbert");
            add_book(&store, "Dune", "1234567890123", id);
            id
        };

        let store = SqliteLibraryStore::new(&db_path, Arc::new(StaticCovers)).unwrap();
        assert_eq!(store.fetch(RecordKind::Author).unwrap().len(), 1);
        assert_eq!(store.books_of_author(author_id).unwrap().len(), 1);
    }

    #[test]
    fn rejects_database_with_mismatched_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");

        // Right version stamp, wrong columns: every declared table gets
        // checked by name on reopen.
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT);", [])
            .unwrap();
        conn.execute("CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT);", [])
            .unwrap();
        conn.execute(&format!("PRAGMA user_version = {}", BASE_DB_VERSION), [])
            .unwrap();
        drop(conn);

        let result = SqliteLibraryStore::new(&db_path, Arc::new(StaticCovers));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Schema validation failed for authors"));
    }
}
