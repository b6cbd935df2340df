//! End-to-end tests of the service router, without a socket or a database.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use http_body_util::BodyExt;

use booksapi::books::{Book, BookPatch, BookStore, MemoryStore, NewBook, StoreError};
use booksapi::middleware::X_REQUEST_ID;
use booksapi::system::Dependency;
use booksapi::{app, AppState, Router};

struct Reply {
    status: StatusCode,
    headers: http::HeaderMap,
    body: String,
}

async fn send(router: &Router, method: Method, uri: &str, body: &str) -> Reply {
    let req = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::from(body.to_owned()))
        .unwrap();
    let res = router.handle(req).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    Reply { status, headers, body: String::from_utf8(body.to_vec()).unwrap() }
}

fn memory_app() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())))
}

/// A store that always holds the same single book.
struct OneBook;

#[async_trait]
impl BookStore for OneBook {
    async fn get_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(vec![Book {
            id: 0,
            title: "The Fellowship of the Ring".into(),
            author: "JRR Tolkien".into(),
            genre: "fantasy".into(),
            number_of_pages: 432,
            price: 20,
            release_year: 1954,
        }])
    }
    async fn get_book_by_id(&self, id: i32) -> Result<Book, StoreError> {
        Err(StoreError::not_found(id))
    }
    async fn add_book(&self, _book: NewBook) -> Result<i32, StoreError> {
        Err(StoreError::internal("read-only"))
    }
    async fn remove_book(&self, id: i32) -> Result<(), StoreError> {
        Err(StoreError::not_found(id))
    }
    async fn update_book(&self, id: i32, _patch: BookPatch) -> Result<(), StoreError> {
        Err(StoreError::not_found(id))
    }
}

struct Postgres {
    up: bool,
}

#[async_trait]
impl Dependency for Postgres {
    fn name(&self) -> &str { "booksdb" }
    fn address(&self) -> &str { "localhost:5432/booksdb" }
    async fn ping(&self) -> Result<(), String> {
        if self.up { Ok(()) } else { Err("connection refused".to_owned()) }
    }
}

#[tokio::test]
async fn lists_the_fellowship() {
    let router = app(AppState::new(Arc::new(OneBook)));
    let reply = send(&router, Method::GET, "/api/books", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        r#"[{"id":0,"title":"The Fellowship of the Ring","author":"JRR Tolkien","genre":"fantasy","numberOfPages":432,"price":20,"releaseYear":1954}]"#
    );
}

#[tokio::test]
async fn missing_book_is_404_envelope() {
    let router = memory_app();
    let reply = send(&router, Method::GET, "/api/books/123", "").await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, r#"{"status":404,"message":"resource not found err, at id -> 123"}"#);
}

#[tokio::test]
async fn empty_store_lists_empty_array() {
    let reply = send(&memory_app(), Method::GET, "/api/books", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "[]");
}

#[tokio::test]
async fn crud_round_trip() {
    let router = memory_app();

    let created = send(&router, Method::POST, "/api/books", r#"{"title":"Dune","author":"Frank Herbert","price":15}"#).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body, r#"{"resourceId":1}"#);

    let patched = send(&router, Method::PATCH, "/api/books/1", r#"{"releaseYear":1965}"#).await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body, "");

    let fetched = send(&router, Method::GET, "/api/books/1", "").await;
    assert_eq!(fetched.status, StatusCode::OK);
    let book: serde_json::Value = serde_json::from_str(&fetched.body).unwrap();
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["price"], 15);
    assert_eq!(book["releaseYear"], 1965);

    let deleted = send(&router, Method::DELETE, "/api/books/1", "").await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(deleted.body, "");

    let gone = send(&router, Method::DELETE, "/api/books/1", "").await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_input_is_400() {
    let router = memory_app();

    let reply = send(&router, Method::GET, "/api/books/abc", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, r#"{"status":400,"message":"only accept integer values as {id} path parameter"}"#);

    let reply = send(&router, Method::POST, "/api/books", r#"{"title":"Dune","author":"FH","isbn":"1"}"#).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, r#"{"status":400,"message":"invalid request model"}"#);

    let reply = send(&router, Method::POST, "/api/books", r#"{"author":"FH"}"#).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, r#"{"status":400,"message":"required fields are not set, won't save the data"}"#);

    let reply = send(&router, Method::DELETE, "/api/books/x1", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn integer_ids_beyond_storage_range_are_404() {
    let router = memory_app();
    let not_found = r#"{"status":404,"message":"resource not found err, at id -> 9999999999"}"#;

    for (method, body) in [(Method::GET, ""), (Method::DELETE, ""), (Method::PATCH, r#"{"price":3}"#)] {
        let reply = send(&router, method.clone(), "/api/books/9999999999", body).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(reply.body, not_found, "{method}");
    }

    let reply = send(&router, Method::GET, "/api/books/99999999999999999999", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_response_is_json() {
    let router = memory_app();
    for uri in ["/api/books", "/api/system/about", "/api/books/zzz"] {
        let reply = send(&router, Method::GET, uri, "").await;
        assert_eq!(reply.headers[CONTENT_TYPE], "application/json;charset=utf8", "{uri}");
    }
}

#[tokio::test]
async fn request_id_only_on_books_group() {
    let router = memory_app();

    let first = send(&router, Method::GET, "/api/books", "").await;
    let second = send(&router, Method::GET, "/api/books", "").await;
    let first_id = first.headers[X_REQUEST_ID].to_str().unwrap();
    assert_eq!(first_id.len(), 36);
    assert_ne!(first.headers[X_REQUEST_ID], second.headers[X_REQUEST_ID]);

    let about = send(&router, Method::GET, "/api/system/about", "").await;
    assert!(about.headers.get(X_REQUEST_ID).is_none());
}

#[tokio::test]
async fn about_and_health() {
    let state = AppState::new(Arc::new(MemoryStore::new())).with_dependency(Arc::new(Postgres { up: false }));
    let router = app(state);

    let about = send(&router, Method::GET, "/api/system/about", "").await;
    assert_eq!(about.status, StatusCode::OK);
    let about: serde_json::Value = serde_json::from_str(&about.body).unwrap();
    assert_eq!(about["product"], "Books Api");
    assert_eq!(about["version"], env!("CARGO_PKG_VERSION"));

    let health = send(&router, Method::GET, "/api/system/health", "").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(
        health.body,
        r#"{"dependencies":[{"name":"booksdb","healthStatus":{"healthy":false,"err":"connection refused"},"address":"localhost:5432/booksdb"}]}"#
    );
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let router = memory_app();

    let reply = send(&router, Method::GET, "/books", "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "");
    // root miss: no middleware ran
    assert!(reply.headers.get(CONTENT_TYPE).is_none());

    let reply = send(&router, Method::PUT, "/api/books/1", "{}").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = send(&router, Method::GET, "/api/system/metrics", "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
