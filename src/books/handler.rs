use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;

use super::error::{ApiError, StoreError};
use super::model::{ActionResponse, Book, BookPatch, NewBook};
use super::store::BookStore;
use crate::request::Request;
use crate::response::Json;

/// HTTP handlers for the books resource.
pub struct BooksApi {
    store: Arc<dyn BookStore>,
}

impl BooksApi {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// `GET /books`
    pub async fn get_books(self: Arc<Self>, _req: Request) -> Result<Json<Vec<Book>>, ApiError> {
        Ok(Json(self.store.get_books().await?))
    }

    /// `GET /books/{id}`
    pub async fn get_book(self: Arc<Self>, req: Request) -> Result<Json<Book>, ApiError> {
        let id = stored_id(path_id(&req)?)?;
        Ok(Json(self.store.get_book_by_id(id).await?))
    }

    /// `POST /books`, answers `201` with the new id.
    pub async fn add_book(
        self: Arc<Self>,
        req: Request,
    ) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
        let book: NewBook = json_body(&req)?;
        book.validate()?;
        let resource_id = self.store.add_book(book).await?;
        Ok((StatusCode::CREATED, Json(ActionResponse { resource_id })))
    }

    /// `DELETE /books/{id}`, answers `204`.
    pub async fn remove_book(self: Arc<Self>, req: Request) -> Result<StatusCode, ApiError> {
        let id = stored_id(path_id(&req)?)?;
        self.store.remove_book(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// `PATCH /books/{id}`, answers `200` with no body.
    pub async fn update_book(self: Arc<Self>, req: Request) -> Result<StatusCode, ApiError> {
        let id = path_id(&req)?;
        let patch: BookPatch = json_body(&req)?;
        self.store.update_book(stored_id(id)?, patch).await?;
        Ok(StatusCode::OK)
    }
}

/// Any integer is a well-formed id, even one no stored book can have.
fn path_id(req: &Request) -> Result<i64, ApiError> {
    req.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| ApiError::bad_request("only accept integer values as {id} path parameter"))
}

// stored ids are `INTEGER`, so a wider id names a book that cannot exist
fn stored_id(id: i64) -> Result<i32, ApiError> {
    i32::try_from(id).map_err(|_| StoreError::not_found(id).into())
}

fn json_body<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(req.body()).map_err(|_| ApiError::bad_request("invalid request model"))
}
