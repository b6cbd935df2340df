//! The service's HTTP surface.
//!
//! ```text
//! global:         ContentTypeJson
//! /api/system/    GET /health, GET /about
//! /api/           SetRequestId, AuditLog
//!                 GET /books, GET /books/{id}, POST /books,
//!                 DELETE /books/{id}, PATCH /books/{id}
//! ```

use std::sync::Arc;

use crate::books::{self, BookStore, BooksApi};
use crate::group::Routes;
use crate::middleware::{AuditLog, ContentTypeJson, SetRequestId};
use crate::router::Router;
use crate::system::{self, About, Dependency, SystemApi};

/// Everything the handlers need.
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub about: About,
    pub dependencies: Vec<Arc<dyn Dependency>>,
}

impl AppState {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books, about: About::default(), dependencies: Vec::new() }
    }

    pub fn with_dependency(mut self, dependency: Arc<dyn Dependency>) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

pub fn app(state: AppState) -> Router {
    let books_api = Arc::new(BooksApi::new(state.books));
    let system_api = Arc::new(SystemApi::new(state.about, state.dependencies));

    Router::new(move |mux| {
        mux.with(ContentTypeJson)
            .group("/api/system/", move |g| system::routes(g, &system_api))
            .group("/api/", move |g| books::routes(g.with(SetRequestId).with(AuditLog), &books_api))
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use tracing_test::traced_test;

    use super::*;
    use crate::books::{Book, BookPatch, MemoryStore, NewBook, StoreError};
    use crate::middleware::X_REQUEST_ID;

    /// Yields before every call, so requests running together interleave.
    #[derive(Default)]
    struct Interleaving(MemoryStore);

    #[async_trait]
    impl BookStore for Interleaving {
        async fn get_books(&self) -> Result<Vec<Book>, StoreError> {
            tokio::task::yield_now().await;
            self.0.get_books().await
        }
        async fn get_book_by_id(&self, id: i32) -> Result<Book, StoreError> {
            tokio::task::yield_now().await;
            self.0.get_book_by_id(id).await
        }
        async fn add_book(&self, book: NewBook) -> Result<i32, StoreError> {
            tokio::task::yield_now().await;
            self.0.add_book(book).await
        }
        async fn remove_book(&self, id: i32) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.remove_book(id).await
        }
        async fn update_book(&self, id: i32, patch: BookPatch) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.update_book(id, patch).await
        }
    }

    fn request(method: Method, uri: &str, body: &'static str) -> http::Request<Bytes> {
        http::Request::builder().method(method).uri(uri).body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn overlapping_requests_keep_their_own_request_id() {
        let router = app(AppState::new(Arc::new(Interleaving::default())));

        let (created, missing) = tokio::join!(
            router.handle(request(Method::POST, "/api/books", r#"{"title":"Dune","author":"Frank Herbert"}"#)),
            router.handle(request(Method::PATCH, "/api/books/42", r#"{"price":9}"#)),
        );
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let created_id = created.headers()[X_REQUEST_ID].to_str().unwrap().to_owned();
        let missing_id = missing.headers()[X_REQUEST_ID].to_str().unwrap().to_owned();
        assert_ne!(created_id, missing_id);

        logs_assert(|lines: &[&str]| {
            let expectations = [
                (&created_id, &missing_id, "route=/api/books ", r#"request_body={"title":"Dune","author":"Frank Herbert"}"#),
                (&missing_id, &created_id, "route=/api/books/42", r#"request_body={"price":9}"#),
            ];
            for (id, other, route, body) in expectations {
                let events: Vec<&&str> = lines
                    .iter()
                    .filter(|line| line.contains("request handled") && line.contains(id.as_str()))
                    .collect();
                if events.len() != 1 {
                    return Err(format!("expected one audit event for {id}, got {}", events.len()));
                }
                let event = events[0];
                if !event.contains(route) || !event.contains(body) || event.contains(other.as_str()) {
                    return Err(format!("audit event for {id} mixes requests: {event}"));
                }
            }
            Ok(())
        });
    }
}
