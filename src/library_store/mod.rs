mod columns;
mod models;
mod schema;
mod store;
mod trait_def;
mod validate;

pub use columns::SearchColumn;
pub use models::{Author, Book, BookWithAuthor, RecordCreated, RecordKind, RecordSet};
pub use store::SqliteLibraryStore;
pub use trait_def::{LibraryStore, StoreError};
pub use validate::{is_digits_of_len, parse_optional_date};
