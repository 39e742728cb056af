//! SQLite schema definitions for the library database.

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

const AUTHORS_TABLE_V_0: Table = Table {
    name: "authors",
    schema: "CREATE TABLE authors (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, birth_date TEXT, date_of_death TEXT);",
    indices: &[],
};

const BOOKS_TABLE_V_0: Table = Table {
    name: "books",
    schema: "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, isbn TEXT NOT NULL UNIQUE, title TEXT NOT NULL, publication_year INTEGER NOT NULL, cover_url TEXT, author_id INTEGER NOT NULL, FOREIGN KEY (author_id) REFERENCES authors (id));",
    indices: &["CREATE INDEX books_author_id_index ON books (author_id);"],
};

pub struct VersionedSchema {
    pub version: u32,
    pub tables: &'static [Table],
}

// Offset added to the schema version stored in PRAGMA user_version, to tell
// our databases apart from files some other application happened to create.
pub const BASE_DB_VERSION: i32 = 199;

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[AUTHORS_TABLE_V_0, BOOKS_TABLE_V_0],
}];
