use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use super::state::{ServerState, SharedStore};
use crate::library_store::{RecordKind, SearchColumn, StoreError};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

// Translate store failures into status codes; hard errors become JSON
// `{"error": ...}` bodies for the frontend to display.
fn store_error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::UnknownColumn(_)
        | StoreError::ColumnMismatch { .. }
        | StoreError::EmptyField(_)
        | StoreError::InvalidIsbn(_)
        | StoreError::InvalidPublicationYear(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Ambiguous | StoreError::DuplicateIsbn(_) => StatusCode::CONFLICT,
        StoreError::UnknownAuthor(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Database(_) => {
            error!("Library store failure: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
    };
    Json(stats)
}

#[derive(Deserialize)]
struct CatalogQuery {
    sort: Option<String>,
    dir: Option<String>,
}

async fn list_books(
    State(store): State<SharedStore>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let result = match query.sort {
        Some(column_str) => {
            let column: SearchColumn = match column_str.parse() {
                Ok(column) => column,
                Err(err) => return store_error_response(err),
            };
            let ascending = query.dir.as_deref() != Some("desc");
            store.fetch_catalog_sorted(column, ascending)
        }
        None => store.fetch_catalog(),
    };
    match result {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn get_book(State(store): State<SharedStore>, Path(id): Path<i64>) -> Response {
    match store.fetch_single(SearchColumn::BookId, &id.to_string()) {
        Ok(pair) => Json(pair).into_response(),
        Err(err) => store_error_response(err),
    }
}

#[derive(Deserialize)]
struct AddBookBody {
    pub title: String,
    pub isbn: String,
    pub publication_year: String,
    pub author_id: i64,
}

async fn add_book(State(store): State<SharedStore>, Json(body): Json<AddBookBody>) -> Response {
    // The cover lookup inside add_book blocks on network I/O; keep it off
    // the async workers.
    let result = tokio::task::spawn_blocking(move || {
        store.add_book(&body.title, &body.isbn, &body.publication_year, body.author_id)
    })
    .await;

    match result {
        Ok(Ok(created)) => (StatusCode::CREATED, Json(created)).into_response(),
        Ok(Err(err)) => store_error_response(err),
        Err(err) => {
            error!("add_book task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_book(State(store): State<SharedStore>, Path(id): Path<i64>) -> Response {
    match store.delete(RecordKind::Book, id) {
        Ok(0) => StatusCode::NOT_FOUND.into_response(),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    column: String,
    q: String,
    limit: Option<usize>,
}

async fn search(State(store): State<SharedStore>, Query(query): Query<SearchQuery>) -> Response {
    let column: SearchColumn = match query.column.parse() {
        Ok(column) => column,
        Err(err) => return store_error_response(err),
    };
    match store.fetch_filtered(column, &query.q, query.limit) {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn list_authors(State(store): State<SharedStore>) -> Response {
    match store.fetch(RecordKind::Author) {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => store_error_response(err),
    }
}

#[derive(Serialize)]
struct AuthorDetail {
    author: crate::library_store::Author,
    books: Vec<crate::library_store::Book>,
}

async fn get_author(State(store): State<SharedStore>, Path(id): Path<i64>) -> Response {
    let author = match store.get_author(id) {
        Ok(Some(author)) => author,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => return store_error_response(err),
    };
    match store.books_of_author(id) {
        Ok(books) => Json(AuthorDetail { author, books }).into_response(),
        Err(err) => store_error_response(err),
    }
}

#[derive(Deserialize)]
struct AddAuthorBody {
    pub name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub date_of_death: String,
}

async fn add_author(
    State(store): State<SharedStore>,
    Json(body): Json<AddAuthorBody>,
) -> Response {
    match store.add_author(&body.name, &body.birth_date, &body.date_of_death) {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn delete_author(State(store): State<SharedStore>, Path(id): Path<i64>) -> Response {
    match store.delete(RecordKind::Author, id) {
        Ok(0) => StatusCode::NOT_FOUND.into_response(),
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(err),
    }
}

pub fn make_app(store: SharedStore, static_dir: Option<PathBuf>) -> Router {
    let state = ServerState {
        start_time: Instant::now(),
        store,
    };

    let catalog_routes: Router = Router::new()
        .route("/books", get(list_books))
        .route("/books", post(add_book))
        .route("/books/{id}", get(get_book))
        .route("/books/{id}", delete(delete_book))
        .route("/search", get(search))
        .route("/authors", get(list_authors))
        .route("/authors", post(add_author))
        .route("/authors/{id}", get(get_author))
        .route("/authors/{id}", delete(delete_author))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .with_state(state)
        .nest("/v1", catalog_routes);

    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app
}

pub async fn run_server(store: SharedStore, static_dir: Option<PathBuf>, port: u16) -> Result<()> {
    let app = make_app(store, static_dir);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
