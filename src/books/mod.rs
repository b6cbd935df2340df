//! The books resource: model, store and HTTP handlers.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | `/books` | `200`, JSON array (`[]` when empty) |
//! | GET | `/books/{id}` | `200`, JSON book |
//! | POST | `/books` | `201`, `{"resourceId": n}` |
//! | DELETE | `/books/{id}` | `204`, empty body |
//! | PATCH | `/books/{id}` | `200`, empty body |
//!
//! Paths are relative to the group [`routes`] is called on. Every failure
//! answers with the `{status, message}` envelope of [`ApiError`].

mod error;
mod handler;
mod model;
mod store;

use std::sync::Arc;

use crate::group::Routes;
use crate::handler::bind;

pub use error::{ApiError, ErrorKind, StoreError};
pub use handler::BooksApi;
pub use model::{ActionResponse, Book, BookPatch, NewBook};
pub use store::{BookStore, MemoryStore, PgBookStore};

/// Registers the books endpoints on `routes`.
pub fn routes<R: Routes>(routes: R, api: &Arc<BooksApi>) -> R {
    routes
        .get("/books", bind(api, BooksApi::get_books))
        .get("/books/{id}", bind(api, BooksApi::get_book))
        .post("/books", bind(api, BooksApi::add_book))
        .delete("/books/{id}", bind(api, BooksApi::remove_book))
        .patch("/books/{id}", bind(api, BooksApi::update_book))
}
